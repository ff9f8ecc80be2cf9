//! Drive policy for the two-wheeled rover.
//!
//! Maps each [`Command`] to normalized wheel speeds and the resulting
//! [`Maneuver`], and owns the only transitions of [`RobotState::direction`].
//! Speeds are logical: both wheels positive drives the robot forward. Any
//! mirroring of physically flipped motors belongs to the [`WheelDrive`]
//! implementation.

use crate::utils::controllers::{Button, Command, Direction, RobotState};

/// Normalized per-wheel speed in `[-1.0, 1.0]`, positive = forward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelSpeeds {
    pub left: f32,
    pub right: f32,
}

impl WheelSpeeds {
    pub const STOP: Self = Self {
        left: 0.0,
        right: 0.0,
    };

    /// Build a speed pair, clamping each wheel into `[-1.0, 1.0]`.
    pub fn new(
        left: f32,
        right: f32,
    ) -> Self {
        Self {
            left: left.clamp(-1.0, 1.0),
            right: right.clamp(-1.0, 1.0),
        }
    }

    /// Both wheels at the same speed.
    pub fn straight(speed: f32) -> Self {
        Self::new(speed, speed)
    }
}

/// Semantic motion state shown on the status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Maneuver {
    Stopped,
    Forward,
    Reverse,
    PivotCw,
    PivotCcw,
    CurveRight,
    CurveLeft,
}

impl Maneuver {
    /// Straight-line maneuver for a travel direction.
    pub fn cruising(direction: Direction) -> Self {
        match direction {
            Direction::Stopped => Maneuver::Stopped,
            Direction::Forward => Maneuver::Forward,
            Direction::Reverse => Maneuver::Reverse,
        }
    }
}

/// Wheel outputs produced by a command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub speeds: WheelSpeeds,
    pub maneuver: Maneuver,
}

/// Actuator seam: anything that can turn a speed pair into wheel motion.
pub trait WheelDrive {
    type Error: core::fmt::Debug;

    fn set_speeds(
        &mut self,
        speeds: WheelSpeeds,
    ) -> Result<(), Self::Error>;
}

/// Applies the drive policy and forwards the result to the wheels.
pub struct DriveController<W> {
    wheels: W,
    speeds: WheelSpeeds,
}

impl<W: WheelDrive> DriveController<W> {
    pub fn new(wheels: W) -> Self {
        Self {
            wheels,
            speeds: WheelSpeeds::STOP,
        }
    }

    /// Compute the wheel outputs for `command`, updating `state.direction`
    /// where the command changes travel intent.
    ///
    /// Returns `None` when the wheels should keep their current output.
    /// The result depends only on `command` and `state`.
    pub fn apply(
        command: &Command,
        state: &mut RobotState,
    ) -> Option<Motion> {
        let (button, pressed) = match *command {
            Command::ButtonEvent { button, pressed } => (button, pressed),
            Command::SetColor { .. } => return None,
        };
        let cruise = state.direction.speed();

        let motion = match (button, pressed) {
            (Button::Up, true) => {
                state.direction = Direction::Forward;
                Motion {
                    speeds: WheelSpeeds::straight(1.0),
                    maneuver: Maneuver::Forward,
                }
            }
            (Button::Down, true) => {
                state.direction = Direction::Reverse;
                Motion {
                    speeds: WheelSpeeds::straight(-1.0),
                    maneuver: Maneuver::Reverse,
                }
            }
            (Button::Right, true) if state.direction == Direction::Stopped => Motion {
                speeds: WheelSpeeds::new(1.0, -1.0),
                maneuver: Maneuver::PivotCw,
            },
            (Button::Right, true) => Motion {
                speeds: WheelSpeeds::new(cruise, 0.0),
                maneuver: Maneuver::CurveRight,
            },
            (Button::Left, true) if state.direction == Direction::Stopped => Motion {
                speeds: WheelSpeeds::new(-1.0, 1.0),
                maneuver: Maneuver::PivotCcw,
            },
            (Button::Left, true) => Motion {
                speeds: WheelSpeeds::new(0.0, cruise),
                maneuver: Maneuver::CurveLeft,
            },
            (Button::Left | Button::Right, false) => Motion {
                speeds: WheelSpeeds::straight(cruise),
                maneuver: Maneuver::cruising(state.direction),
            },
            (Button::Aux1, true) => {
                state.direction = Direction::Stopped;
                Motion {
                    speeds: WheelSpeeds::STOP,
                    maneuver: Maneuver::Stopped,
                }
            }
            (Button::Up | Button::Down | Button::Aux1, false)
            | (Button::Aux2 | Button::Aux3 | Button::Aux4, _) => return None,
        };
        Some(motion)
    }

    /// Apply `command` and drive the wheels. Returns the new maneuver if the
    /// wheel outputs changed.
    pub fn dispatch(
        &mut self,
        command: &Command,
        state: &mut RobotState,
    ) -> Result<Option<Maneuver>, W::Error> {
        let Some(motion) = Self::apply(command, state) else {
            return Ok(None);
        };
        tracing::debug!(
            left = motion.speeds.left,
            right = motion.speeds.right,
            maneuver = ?motion.maneuver,
            "wheel speeds"
        );
        self.wheels.set_speeds(motion.speeds)?;
        self.speeds = motion.speeds;
        Ok(Some(motion.maneuver))
    }

    /// Last speeds written to the wheels.
    pub fn speeds(&self) -> WheelSpeeds {
        self.speeds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smart_leds_trait::RGB8;

    type Policy = DriveController<()>;

    impl WheelDrive for () {
        type Error = ();

        fn set_speeds(
            &mut self,
            _speeds: WheelSpeeds,
        ) -> Result<(), ()> {
            Ok(())
        }
    }

    fn press(button: Button) -> Command {
        Command::ButtonEvent {
            button,
            pressed: true,
        }
    }

    fn release(button: Button) -> Command {
        Command::ButtonEvent {
            button,
            pressed: false,
        }
    }

    fn state(direction: Direction) -> RobotState {
        RobotState {
            direction,
            ..RobotState::new(RGB8 { r: 1, g: 2, b: 3 })
        }
    }

    #[test]
    fn up_then_down_reverses_from_any_direction() {
        for start in [Direction::Stopped, Direction::Forward, Direction::Reverse] {
            let mut s = state(start);
            Policy::apply(&press(Button::Up), &mut s);
            let motion = Policy::apply(&press(Button::Down), &mut s).unwrap();
            assert_eq!(s.direction, Direction::Reverse);
            assert_eq!(motion.speeds, WheelSpeeds::new(-1.0, -1.0));
            assert_eq!(motion.maneuver, Maneuver::Reverse);
        }
    }

    #[test]
    fn pivot_when_stopped() {
        let mut s = state(Direction::Stopped);
        let cw = Policy::apply(&press(Button::Right), &mut s).unwrap();
        assert_eq!(cw.speeds, WheelSpeeds::new(1.0, -1.0));
        assert_eq!(cw.maneuver, Maneuver::PivotCw);

        let back = Policy::apply(&release(Button::Right), &mut s).unwrap();
        assert_eq!(back.speeds, WheelSpeeds::STOP);
        assert_eq!(back.maneuver, Maneuver::Stopped);

        let ccw = Policy::apply(&press(Button::Left), &mut s).unwrap();
        assert_eq!(ccw.speeds, WheelSpeeds::new(-1.0, 1.0));
        assert_eq!(ccw.maneuver, Maneuver::PivotCcw);
        assert_eq!(s.direction, Direction::Stopped);
    }

    #[test]
    fn curve_while_moving() {
        let mut s = state(Direction::Forward);
        let right = Policy::apply(&press(Button::Right), &mut s).unwrap();
        assert_eq!(right.speeds, WheelSpeeds::new(1.0, 0.0));
        assert_eq!(right.maneuver, Maneuver::CurveRight);
        let resumed = Policy::apply(&release(Button::Right), &mut s).unwrap();
        assert_eq!(resumed.speeds, WheelSpeeds::new(1.0, 1.0));
        assert_eq!(resumed.maneuver, Maneuver::Forward);

        let mut s = state(Direction::Reverse);
        let left = Policy::apply(&press(Button::Left), &mut s).unwrap();
        assert_eq!(left.speeds, WheelSpeeds::new(0.0, -1.0));
        assert_eq!(left.maneuver, Maneuver::CurveLeft);
        assert_eq!(s.direction, Direction::Reverse);
    }

    #[test]
    fn emergency_stop_zeroes_direction() {
        let mut s = state(Direction::Forward);
        let motion = Policy::apply(&press(Button::Aux1), &mut s).unwrap();
        assert_eq!(motion.speeds, WheelSpeeds::STOP);
        assert_eq!(s.direction, Direction::Stopped);
    }

    #[test]
    fn non_drive_commands_leave_wheels_alone() {
        let mut s = state(Direction::Forward);
        let ignored = [
            Command::SetColor {
                color: RGB8 { r: 0, g: 200, b: 0 },
            },
            release(Button::Up),
            release(Button::Down),
            release(Button::Aux1),
            press(Button::Aux2),
            press(Button::Aux3),
            release(Button::Aux4),
        ];
        for cmd in ignored {
            assert_eq!(Policy::apply(&cmd, &mut s), None, "{:?}", cmd);
            assert_eq!(s.direction, Direction::Forward);
        }
    }

    #[test]
    fn apply_is_deterministic() {
        let commands = [
            press(Button::Up),
            press(Button::Left),
            release(Button::Left),
            press(Button::Aux1),
            press(Button::Right),
        ];
        for start in [Direction::Stopped, Direction::Forward, Direction::Reverse] {
            for cmd in &commands {
                let mut a = state(start);
                let mut b = a.clone();
                assert_eq!(Policy::apply(cmd, &mut a), Policy::apply(cmd, &mut b));
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn dispatch_records_written_speeds() {
        let mut drive = DriveController::new(());
        let mut s = state(Direction::Stopped);
        assert_eq!(
            drive.dispatch(&press(Button::Up), &mut s),
            Ok(Some(Maneuver::Forward))
        );
        assert_eq!(drive.speeds(), WheelSpeeds::straight(1.0));
        assert_eq!(drive.dispatch(&press(Button::Aux3), &mut s), Ok(None));
        assert_eq!(drive.speeds(), WheelSpeeds::straight(1.0));
    }
}
