//! Indicator control for the rover.
//!
//! Drives the addressable underglow strip and status pixel via
//! `SmartLedsWrite`, and the maneuver icon via an `embedded-graphics` canvas.
//! Every change to [`RobotState::underglow`] is written to the strip in the
//! same call, so the state always mirrors the lights.

use embedded_graphics::{draw_target::DrawTarget, pixelcolor::Rgb565};
use smart_leds_trait::{SmartLedsWrite, RGB8};

use crate::utils::{
    config::Palette,
    connection::LinkState,
    controllers::{drive::Maneuver, Button, RobotState},
    display::icon,
};

/// Errors raised by the indicator outputs.
#[derive(Debug)]
pub enum IndicatorError<LE, DE> {
    Lights(LE),
    Display(DE),
}

/// Scheduled resume for the emergency-stop alert.
///
/// Holds the underglow color that was showing when the alert started; pass it
/// back to [`IndicatorController::resume`] once `duration_ms` has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct AlertHold {
    pub duration_ms: u32,
    restore: RGB8,
}

/// Ambient light, status pixel and icon controller.
pub struct IndicatorController<U, S, D> {
    underglow: U,
    status: S,
    display: D,
    palette: Palette,
    underglow_len: usize,
    alert_ms: u32,
}

impl<U, S, D, LE> IndicatorController<U, S, D>
where
    U: SmartLedsWrite<Color = RGB8, Error = LE>,
    S: SmartLedsWrite<Color = RGB8, Error = LE>,
    D: DrawTarget<Color = Rgb565>,
{
    /// Create a controller over the given outputs. Nothing is written until
    /// [`sync`](Self::sync) or the first command.
    pub fn new(
        underglow: U,
        status: S,
        display: D,
        palette: Palette,
        underglow_len: usize,
        alert_ms: u32,
    ) -> Self {
        Self {
            underglow,
            status,
            display,
            palette,
            underglow_len,
            alert_ms,
        }
    }

    /// Push the current state to the strip and reset the icon.
    pub fn sync(
        &mut self,
        state: &RobotState,
        maneuver: Maneuver,
    ) -> Result<(), IndicatorError<LE, D::Error>> {
        self.write_underglow(state.underglow)?;
        self.on_maneuver_change(maneuver)
    }

    /// `SetColor`: replace the underglow. The override slot is left alone.
    pub fn on_color_command(
        &mut self,
        color: RGB8,
        state: &mut RobotState,
    ) -> Result<(), IndicatorError<LE, D::Error>> {
        self.set_underglow(color, state)
    }

    /// Apply the lighting side of a button event.
    ///
    /// - Left/Right press: save the color into the override slot (unless a
    ///   save is already pending) and show the turn highlight.
    /// - Left/Right release: restore and clear the override slot.
    /// - Aux1 press: show the alert color and return the hold to resume.
    /// - Aux2..4 press: switch to a fixed color.
    pub fn on_button(
        &mut self,
        button: Button,
        pressed: bool,
        state: &mut RobotState,
    ) -> Result<Option<AlertHold>, IndicatorError<LE, D::Error>> {
        match (button, pressed) {
            (Button::Left | Button::Right, true) => {
                if state.pending_release.is_none() {
                    state.pending_release = Some(state.underglow);
                }
                self.set_underglow(self.palette.turn_highlight, state)?;
            }
            (Button::Left | Button::Right, false) => {
                if let Some(saved) = state.pending_release.take() {
                    self.set_underglow(saved, state)?;
                }
            }
            (Button::Aux1, true) => {
                let hold = AlertHold {
                    duration_ms: self.alert_ms,
                    restore: state.underglow,
                };
                self.set_underglow(self.palette.alert, state)?;
                return Ok(Some(hold));
            }
            (Button::Aux2, true) => self.set_underglow(self.palette.aux2, state)?,
            (Button::Aux3, true) => self.set_underglow(self.palette.aux3, state)?,
            (Button::Aux4, true) => self.set_underglow(self.palette.aux4, state)?,
            (Button::Up | Button::Down, _)
            | (Button::Aux1 | Button::Aux2 | Button::Aux3 | Button::Aux4, false) => {}
        }
        Ok(None)
    }

    /// End an alert started by [`on_button`](Self::on_button).
    pub fn resume(
        &mut self,
        hold: AlertHold,
        state: &mut RobotState,
    ) -> Result<(), IndicatorError<LE, D::Error>> {
        self.set_underglow(hold.restore, state)
    }

    /// Redraw the status icon for `maneuver`.
    pub fn on_maneuver_change(
        &mut self,
        maneuver: Maneuver,
    ) -> Result<(), IndicatorError<LE, D::Error>> {
        tracing::debug!(?maneuver, "status icon");
        icon::render(&mut self.display, maneuver).map_err(IndicatorError::Display)
    }

    /// Reflect the link session on the status pixel.
    pub fn show_link_state(
        &mut self,
        link: LinkState,
    ) -> Result<(), IndicatorError<LE, D::Error>> {
        let color = match link {
            LinkState::Advertising => self.palette.advertising,
            LinkState::Connected => self.palette.connected,
            LinkState::Disconnected => RGB8 { r: 0, g: 0, b: 0 },
        };
        self.status
            .write(core::iter::once(color))
            .map_err(IndicatorError::Lights)
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    fn set_underglow(
        &mut self,
        color: RGB8,
        state: &mut RobotState,
    ) -> Result<(), IndicatorError<LE, D::Error>> {
        self.write_underglow(color)?;
        state.underglow = color;
        Ok(())
    }

    /// Set every pixel of the strip to `color`.
    fn write_underglow(
        &mut self,
        color: RGB8,
    ) -> Result<(), IndicatorError<LE, D::Error>> {
        let data = core::iter::repeat(color).take(self.underglow_len);
        self.underglow.write(data).map_err(IndicatorError::Lights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::{PURPLE, RED, YELLOW};
    use core::convert::Infallible;
    use embedded_graphics::{prelude::*, Pixel};

    /// Strip that remembers the last frame written to it.
    #[derive(Default)]
    struct Strip {
        frame: Vec<RGB8>,
        writes: usize,
    }

    impl SmartLedsWrite for Strip {
        type Error = Infallible;
        type Color = RGB8;

        fn write<T, I>(
            &mut self,
            iterator: T,
        ) -> Result<(), Self::Error>
        where
            T: IntoIterator<Item = I>,
            I: Into<Self::Color>,
        {
            self.frame = iterator.into_iter().map(Into::into).collect();
            self.writes += 1;
            Ok(())
        }
    }

    struct NullCanvas;

    impl OriginDimensions for NullCanvas {
        fn size(&self) -> Size {
            Size::new(240, 240)
        }
    }

    impl DrawTarget for NullCanvas {
        type Color = Rgb565;
        type Error = Infallible;

        fn draw_iter<I>(
            &mut self,
            _pixels: I,
        ) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            Ok(())
        }
    }

    fn controller() -> IndicatorController<Strip, Strip, NullCanvas> {
        IndicatorController::new(
            Strip::default(),
            Strip::default(),
            NullCanvas,
            Palette::default(),
            2,
            500,
        )
    }

    const CYAN: RGB8 = RGB8 { r: 0, g: 100, b: 100 };

    #[test]
    fn color_command_fills_strip_and_keeps_slot() {
        let mut ind = controller();
        let mut state = RobotState::new(PURPLE);
        state.pending_release = Some(RED);
        ind.on_color_command(CYAN, &mut state).unwrap();
        assert_eq!(state.underglow, CYAN);
        assert_eq!(state.pending_release, Some(RED));
        assert_eq!(ind.underglow.frame, vec![CYAN, CYAN]);
    }

    #[test]
    fn turn_highlight_saves_once() {
        let mut ind = controller();
        let mut state = RobotState::new(CYAN);
        ind.on_button(Button::Left, true, &mut state).unwrap();
        ind.on_button(Button::Right, true, &mut state).unwrap();
        assert_eq!(state.underglow, YELLOW);
        assert_eq!(state.pending_release, Some(CYAN));

        ind.on_button(Button::Right, false, &mut state).unwrap();
        assert_eq!(state.underglow, CYAN);
        assert_eq!(state.pending_release, None);

        let writes = ind.underglow.writes;
        ind.on_button(Button::Left, false, &mut state).unwrap();
        assert_eq!(ind.underglow.writes, writes);
        assert_eq!(state.underglow, CYAN);
    }

    #[test]
    fn alert_hold_is_separate_from_override_slot() {
        let mut ind = controller();
        let mut state = RobotState::new(CYAN);
        ind.on_button(Button::Right, true, &mut state).unwrap();

        let hold = ind.on_button(Button::Aux1, true, &mut state).unwrap().unwrap();
        assert_eq!(hold.duration_ms, 500);
        assert_eq!(state.underglow, RED);
        assert_eq!(state.pending_release, Some(CYAN));

        ind.resume(hold, &mut state).unwrap();
        assert_eq!(state.underglow, YELLOW);
        assert_eq!(state.pending_release, Some(CYAN));
    }

    #[test]
    fn aux_colors_are_permanent() {
        let mut ind = controller();
        let mut state = RobotState::new(CYAN);
        ind.on_button(Button::Aux2, true, &mut state).unwrap();
        assert_eq!(state.underglow, Palette::default().aux2);
        ind.on_button(Button::Aux2, false, &mut state).unwrap();
        assert_eq!(state.underglow, Palette::default().aux2);
        ind.on_button(Button::Aux3, true, &mut state).unwrap();
        assert_eq!(state.underglow, Palette::default().aux3);
        ind.on_button(Button::Aux4, true, &mut state).unwrap();
        assert_eq!(state.underglow, PURPLE);
        assert_eq!(state.pending_release, None);
    }

    #[test]
    fn status_pixel_follows_link() {
        let mut ind = controller();
        ind.show_link_state(LinkState::Advertising).unwrap();
        assert_eq!(ind.status.frame, vec![Palette::default().advertising]);
        ind.show_link_state(LinkState::Connected).unwrap();
        assert_eq!(ind.status.frame, vec![Palette::default().connected]);
    }
}
