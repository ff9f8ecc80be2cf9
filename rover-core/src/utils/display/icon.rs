//! Maneuver icons.
//!
//! Each [`Maneuver`] maps to a fixed list of filled shapes placed relative to
//! the centre of the canvas. Rendering always clears the whole canvas to the
//! background first, so an icon never inherits pixels from the previous one.
//!
//! # Example
//! ```rust
//! use rover_core::utils::controllers::drive::Maneuver;
//! use rover_core::utils::display::icon;
//!
//! assert!(icon(Maneuver::Stopped).is_empty());
//! assert_eq!(icon(Maneuver::PivotCw).len(), 5);
//! ```

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{Circle, Primitive, PrimitiveStyle, Rectangle, Triangle},
};

use crate::utils::controllers::drive::Maneuver;

/// Canvas color behind every icon.
pub const BACKGROUND: Rgb565 = Rgb565::YELLOW;
/// Color of the icon strokes.
pub const INK: Rgb565 = Rgb565::BLACK;

/// Which color a shape is painted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Ink,
    /// Cut-out painted in the background color.
    Background,
}

impl Fill {
    fn color(self) -> Rgb565 {
        match self {
            Fill::Ink => INK,
            Fill::Background => BACKGROUND,
        }
    }
}

/// A filled shape, centred on the canvas and shifted by `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Rect {
        size: Size,
        offset: Point,
        fill: Fill,
    },
    Circle {
        radius: u32,
        offset: Point,
        fill: Fill,
    },
    /// Convex polygon, points in drawing order.
    Polygon {
        points: &'static [Point],
        offset: Point,
        fill: Fill,
    },
}

const fn rect(
    width: u32,
    height: u32,
    dx: i32,
    dy: i32,
    fill: Fill,
) -> Shape {
    Shape::Rect {
        size: Size::new(width, height),
        offset: Point::new(dx, dy),
        fill,
    }
}

const fn circle(
    radius: u32,
    fill: Fill,
) -> Shape {
    Shape::Circle {
        radius,
        offset: Point::new(0, 0),
        fill,
    }
}

const fn poly(
    points: &'static [Point],
    dx: i32,
    dy: i32,
) -> Shape {
    Shape::Polygon {
        points,
        offset: Point::new(dx, dy),
        fill: Fill::Ink,
    }
}

const FORWARD_SHAFT: &[Point] = &[
    Point::new(20, 0),
    Point::new(60, 0),
    Point::new(80, 100),
    Point::new(0, 100),
];
const FORWARD_HEAD: &[Point] = &[Point::new(0, 0), Point::new(150, 0), Point::new(75, 50)];
const REVERSE_SHAFT: &[Point] = &[
    Point::new(40, 0),
    Point::new(60, 0),
    Point::new(100, 100),
    Point::new(0, 100),
];
const REVERSE_HEAD: &[Point] = &[Point::new(0, 40), Point::new(100, 40), Point::new(50, 0)];
const LEFT_HEAD: &[Point] = &[Point::new(50, 0), Point::new(50, 100), Point::new(0, 50)];
const RIGHT_HEAD: &[Point] = &[Point::new(0, 0), Point::new(0, 100), Point::new(50, 50)];
const ARC_HEAD_UP: &[Point] = &[Point::new(40, 0), Point::new(80, 40), Point::new(0, 40)];
const ARC_HEAD_DOWN: &[Point] = &[Point::new(40, 40), Point::new(80, 0), Point::new(0, 0)];

const FORWARD: &[Shape] = &[poly(FORWARD_SHAFT, 0, 0), poly(FORWARD_HEAD, 0, 50)];
const REVERSE: &[Shape] = &[poly(REVERSE_SHAFT, 0, 0), poly(REVERSE_HEAD, 0, -40)];
const CURVE_LEFT: &[Shape] = &[rect(100, 40, 0, 0, Fill::Ink), poly(LEFT_HEAD, -50, 0)];
const CURVE_RIGHT: &[Shape] = &[rect(100, 40, 0, 0, Fill::Ink), poly(RIGHT_HEAD, 50, 0)];
const PIVOT_CCW: &[Shape] = &[
    circle(80, Fill::Ink),
    circle(50, Fill::Background),
    rect(160, 60, 0, 0, Fill::Background),
    poly(ARC_HEAD_UP, 60, 10),
    poly(ARC_HEAD_DOWN, -60, -10),
];
const PIVOT_CW: &[Shape] = &[
    circle(80, Fill::Ink),
    circle(50, Fill::Background),
    rect(160, 60, 0, 0, Fill::Background),
    poly(ARC_HEAD_UP, -60, 10),
    poly(ARC_HEAD_DOWN, 60, -10),
];

/// Shapes making up the icon for `maneuver`. Stopped has no icon.
pub fn icon(maneuver: Maneuver) -> &'static [Shape] {
    match maneuver {
        Maneuver::Stopped => &[],
        Maneuver::Forward => FORWARD,
        Maneuver::Reverse => REVERSE,
        Maneuver::CurveLeft => CURVE_LEFT,
        Maneuver::CurveRight => CURVE_RIGHT,
        Maneuver::PivotCcw => PIVOT_CCW,
        Maneuver::PivotCw => PIVOT_CW,
    }
}

/// Replace whatever is on `target` with the icon for `maneuver`.
pub fn render<D>(
    target: &mut D,
    maneuver: Maneuver,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    target.clear(BACKGROUND)?;
    // `Rectangle::center` rounds down to (size - 1) / 2; icons sit on size / 2.
    let bounds = target.bounding_box();
    let center = bounds.top_left + bounds.size / 2;
    for shape in icon(maneuver) {
        shape.draw_at(center, target)?;
    }
    Ok(())
}

impl Shape {
    /// Draw the shape around `center`.
    pub fn draw_at<D>(
        &self,
        center: Point,
        target: &mut D,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        match *self {
            Shape::Rect { size, offset, fill } => {
                let top_left = corner(center, size, offset);
                Rectangle::new(top_left, size)
                    .into_styled(PrimitiveStyle::with_fill(fill.color()))
                    .draw(target)
            }
            Shape::Circle {
                radius,
                offset,
                fill,
            } => Circle::with_center(center + offset - Point::new(1, 1), radius * 2)
                .into_styled(PrimitiveStyle::with_fill(fill.color()))
                .draw(target),
            Shape::Polygon {
                points,
                offset,
                fill,
            } => {
                let origin = corner(center, extent(points), offset);
                let style = PrimitiveStyle::with_fill(fill.color());
                let Some((&first, rest)) = points.split_first() else {
                    return Ok(());
                };
                for pair in rest.windows(2) {
                    Triangle::new(first + origin, pair[0] + origin, pair[1] + origin)
                        .into_styled(style)
                        .draw(target)?;
                }
                Ok(())
            }
        }
    }
}

/// Top-left corner for a box of `size` centred on `center`, shifted by
/// `offset`, one pixel up and left of true centre.
fn corner(
    center: Point,
    size: Size,
    offset: Point,
) -> Point {
    center - Point::new(size.width as i32 / 2, size.height as i32 / 2) + offset
        - Point::new(1, 1)
}

/// Width and height spanned by `points`.
fn extent(points: &[Point]) -> Size {
    let xs = points.iter().map(|p| p.x);
    let ys = points.iter().map(|p| p.y);
    let width = xs.clone().max().unwrap_or(0) - xs.min().unwrap_or(0);
    let height = ys.clone().max().unwrap_or(0) - ys.min().unwrap_or(0);
    Size::new(width as u32, height as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::{geometry::OriginDimensions, primitives::ContainsPoint};

    /// Canvas that counts pixels per color and records clears.
    struct Tally {
        clears: usize,
        ink: usize,
        background: usize,
        outside: usize,
        first_ink: Option<Point>,
    }

    impl Tally {
        fn new() -> Self {
            Self {
                clears: 0,
                ink: 0,
                background: 0,
                outside: 0,
                first_ink: None,
            }
        }
    }

    impl OriginDimensions for Tally {
        fn size(&self) -> Size {
            Size::new(240, 240)
        }
    }

    impl DrawTarget for Tally {
        type Color = Rgb565;
        type Error = core::convert::Infallible;

        fn draw_iter<I>(
            &mut self,
            pixels: I,
        ) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            let bounds = self.bounding_box();
            for Pixel(point, color) in pixels {
                if !bounds.contains(point) {
                    self.outside += 1;
                } else if color == INK {
                    self.ink += 1;
                    self.first_ink.get_or_insert(point);
                } else {
                    self.background += 1;
                }
            }
            Ok(())
        }

        fn clear(
            &mut self,
            _color: Self::Color,
        ) -> Result<(), Self::Error> {
            self.clears += 1;
            self.ink = 0;
            self.background = 0;
            Ok(())
        }
    }

    #[test]
    fn stopped_clears_without_drawing() {
        let mut canvas = Tally::new();
        render(&mut canvas, Maneuver::Stopped).unwrap();
        assert_eq!(canvas.clears, 1);
        assert_eq!(canvas.ink, 0);
    }

    #[test]
    fn every_icon_clears_first_and_stays_on_screen() {
        for maneuver in [
            Maneuver::Forward,
            Maneuver::Reverse,
            Maneuver::PivotCw,
            Maneuver::PivotCcw,
            Maneuver::CurveRight,
            Maneuver::CurveLeft,
        ] {
            let mut canvas = Tally::new();
            render(&mut canvas, maneuver).unwrap();
            assert_eq!(canvas.clears, 1, "{:?}", maneuver);
            assert!(canvas.ink > 0, "{:?} drew nothing", maneuver);
            assert_eq!(canvas.outside, 0, "{:?} left the canvas", maneuver);
        }
    }

    #[test]
    fn pivots_cut_out_the_ring() {
        let mut canvas = Tally::new();
        render(&mut canvas, Maneuver::PivotCw).unwrap();
        assert!(canvas.background > 0);
        assert_eq!(icon(Maneuver::PivotCw)[0], icon(Maneuver::PivotCcw)[0]);
        assert_ne!(icon(Maneuver::PivotCw)[3], icon(Maneuver::PivotCcw)[3]);
    }

    #[test]
    fn polygon_extent() {
        assert_eq!(extent(FORWARD_HEAD), Size::new(150, 50));
        assert_eq!(extent(REVERSE_SHAFT), Size::new(100, 100));
    }

    #[test]
    fn curve_bar_lands_on_half_canvas() {
        let mut canvas = Tally::new();
        render(&mut canvas, Maneuver::CurveRight).unwrap();
        // 100x40 bar: (240/2 - 50 - 1, 240/2 - 20 - 1)
        assert_eq!(canvas.first_ink, Some(Point::new(69, 99)));
    }

    #[test]
    fn rect_is_centred() {
        let c = corner(Point::new(120, 120), Size::new(100, 40), Point::new(0, 0));
        assert_eq!(c, Point::new(69, 99));
    }
}
