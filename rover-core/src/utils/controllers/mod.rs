//! Controllers for the rover.
//!
//! - `drive`: command-to-wheel-speed policy and the `WheelDrive` seam.
//! - `indicator`: underglow, status pixel and maneuver icon.
//! - `servo`: PCA9685 continuous-servo implementation of `WheelDrive`.
//!
//! [`RobotController`] ties them together around the single [`RobotState`].

pub mod drive;
pub mod indicator;
pub mod servo;

use core::convert::Infallible;

use embedded_graphics::{draw_target::DrawTarget, pixelcolor::Rgb565};
use embedded_hal::delay::DelayNs;
use serde::{Deserialize, Serialize};
use smart_leds_trait::{SmartLedsWrite, RGB8};

use crate::utils::{
    config::{rgb_triplet, RobotConfig},
    connection::{
        packet::{self, MAX_PACKET_LEN},
        Link, LinkState,
    },
};
use drive::{DriveController, Maneuver, WheelDrive, WheelSpeeds};
use indicator::{IndicatorController, IndicatorError};

/// Pause before re-advertising when a session ends without a connection.
pub const ADVERTISE_RETRY_MS: u32 = 100;

/// Remote-control buttons of the controller app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    Aux1,
    Aux2,
    Aux3,
    Aux4,
}

/// A decoded operator command.
///
/// Serialized as JSON keyed by the snake_case variant name, e.g.
/// `{"button_event":{"button":"left","pressed":true}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Set the underglow color.
    SetColor {
        #[serde(with = "rgb_triplet")]
        color: RGB8,
    },
    /// A button was pressed or released.
    ButtonEvent { button: Button, pressed: bool },
}

/// Last commanded straight-line travel intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Stopped,
    Forward,
    Reverse,
}

impl Direction {
    /// Wheel speed for straight travel in this direction.
    pub fn speed(self) -> f32 {
        match self {
            Direction::Stopped => 0.0,
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }
}

/// Everything the controllers remember between commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotState {
    pub direction: Direction,
    /// Color currently on the underglow strip.
    pub underglow: RGB8,
    /// Color to restore when the held Left/Right button is released.
    pub pending_release: Option<RGB8>,
}

impl RobotState {
    pub fn new(underglow: RGB8) -> Self {
        Self {
            direction: Direction::Stopped,
            underglow,
            pending_release: None,
        }
    }
}

/// Fatal collaborator failures. The controller does not retry.
#[derive(Debug)]
pub enum RobotError<WE, LE, DE> {
    Drive(WE),
    Lights(LE),
    Display(DE),
}

impl<WE, LE, DE> From<IndicatorError<LE, DE>> for RobotError<WE, LE, DE> {
    fn from(error: IndicatorError<LE, DE>) -> Self {
        match error {
            IndicatorError::Lights(e) => RobotError::Lights(e),
            IndicatorError::Display(e) => RobotError::Display(e),
        }
    }
}

/// Top-level control loop: owns the state and dispatches commands, one at a
/// time and in arrival order, to the drive and indicator controllers.
pub struct RobotController<W, U, S, D, T> {
    state: RobotState,
    maneuver: Maneuver,
    link_state: LinkState,
    drive: DriveController<W>,
    indicator: IndicatorController<U, S, D>,
    delay: T,
    /// Set once an emergency-stop hold completes; cleared when the link
    /// backlog has been dropped.
    held: bool,
}

impl<W, U, S, D, T, LE> RobotController<W, U, S, D, T>
where
    W: WheelDrive,
    U: SmartLedsWrite<Color = RGB8, Error = LE>,
    S: SmartLedsWrite<Color = RGB8, Error = LE>,
    D: DrawTarget<Color = Rgb565>,
    T: DelayNs,
{
    pub fn new(
        wheels: W,
        underglow: U,
        status: S,
        display: D,
        delay: T,
        config: &RobotConfig,
    ) -> Self {
        RobotController {
            state: RobotState::new(config.palette.default_underglow),
            maneuver: Maneuver::Stopped,
            link_state: LinkState::Disconnected,
            drive: DriveController::new(wheels),
            indicator: IndicatorController::new(
                underglow,
                status,
                display,
                config.palette.clone(),
                config.underglow_len,
                config.estop_pulse_ms,
            ),
            delay,
            held: false,
        }
    }

    pub fn state(&self) -> &RobotState {
        &self.state
    }

    pub fn maneuver(&self) -> Maneuver {
        self.maneuver
    }

    pub fn link_state(&self) -> LinkState {
        self.link_state
    }

    /// Last speeds sent to the wheels.
    pub fn wheel_speeds(&self) -> WheelSpeeds {
        self.drive.speeds()
    }

    pub fn indicator(&self) -> &IndicatorController<U, S, D> {
        &self.indicator
    }

    /// Show the power-on state: default underglow and an empty icon.
    pub fn start(&mut self) -> Result<(), RobotError<W::Error, LE, D::Error>> {
        tracing::info!(underglow = ?self.state.underglow, "robot starting");
        self.indicator.sync(&self.state, self.maneuver)?;
        Ok(())
    }

    /// Decode one framed message and dispatch it. Messages that are not a
    /// valid command are dropped without touching the state.
    pub fn handle_message(
        &mut self,
        bytes: &[u8],
    ) -> Result<(), RobotError<W::Error, LE, D::Error>> {
        match packet::decode(bytes) {
            Some(command) => self.dispatch(&command),
            None => Ok(()),
        }
    }

    /// Apply every effect of `command` before returning.
    ///
    /// The Aux1 emergency stop blocks for the configured pulse with the
    /// wheels stopped and the alert color showing, then restores the color.
    /// Within [`run_session`](Self::run_session), anything the link received
    /// during the pulse is then dropped.
    pub fn dispatch(
        &mut self,
        command: &Command,
    ) -> Result<(), RobotError<W::Error, LE, D::Error>> {
        tracing::debug!(?command, "dispatch");
        match *command {
            Command::SetColor { color } => {
                self.indicator.on_color_command(color, &mut self.state)?;
            }
            Command::ButtonEvent { button, pressed } => {
                let maneuver = self
                    .drive
                    .dispatch(command, &mut self.state)
                    .map_err(RobotError::Drive)?;
                let hold = self.indicator.on_button(button, pressed, &mut self.state)?;
                if let Some(maneuver) = maneuver {
                    self.indicator.on_maneuver_change(maneuver)?;
                    self.maneuver = maneuver;
                }
                if let Some(hold) = hold {
                    tracing::warn!(duration_ms = hold.duration_ms, "emergency stop");
                    self.delay.delay_ms(hold.duration_ms);
                    self.indicator.resume(hold, &mut self.state)?;
                    self.held = true;
                }
            }
        }
        Ok(())
    }

    /// Advertise, wait for a central, then process messages until the link
    /// drops. The state carries over to the next session.
    pub fn run_session<L: Link>(
        &mut self,
        link: &mut L,
    ) -> Result<(), RobotError<W::Error, LE, D::Error>> {
        self.set_link_state(LinkState::Advertising)?;
        link.start_advertising();
        link.wait_for_connection();
        link.stop_advertising();
        if !link.is_connected() {
            self.set_link_state(LinkState::Disconnected)?;
            self.delay.delay_ms(ADVERTISE_RETRY_MS);
            return Ok(());
        }
        self.set_link_state(LinkState::Connected)?;
        self.held = false;

        let mut buf = [0u8; MAX_PACKET_LEN];
        while link.is_connected() {
            let Some(len) = link.next_message(&mut buf) else {
                break;
            };
            self.handle_message(&buf[..len.min(MAX_PACKET_LEN)])?;
            if core::mem::take(&mut self.held) {
                let dropped = link.discard_pending();
                tracing::debug!(dropped, "input during emergency stop dropped");
            }
        }
        self.set_link_state(LinkState::Disconnected)?;
        Ok(())
    }

    /// Run forever, re-advertising after every disconnect. Only a
    /// collaborator failure returns.
    pub fn run<L: Link>(
        &mut self,
        link: &mut L,
    ) -> Result<Infallible, RobotError<W::Error, LE, D::Error>> {
        self.start()?;
        loop {
            self.run_session(link)?;
        }
    }

    fn set_link_state(
        &mut self,
        link_state: LinkState,
    ) -> Result<(), RobotError<W::Error, LE, D::Error>> {
        tracing::info!(from = ?self.link_state, to = ?link_state, "link state");
        self.link_state = link_state;
        self.indicator.show_link_state(link_state)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_json_shape() {
        let cmd = Command::ButtonEvent {
            button: Button::Aux1,
            pressed: true,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(json, r#"{"button_event":{"button":"aux1","pressed":true}}"#);

        let color: Command =
            serde_json::from_str(r#"{"set_color":{"color":[0,200,0]}}"#).unwrap();
        assert_eq!(
            color,
            Command::SetColor {
                color: RGB8 { r: 0, g: 200, b: 0 }
            }
        );
    }

    #[test]
    fn fresh_state() {
        let state = RobotState::new(RGB8 { r: 120, g: 0, b: 160 });
        assert_eq!(state.direction, Direction::Stopped);
        assert_eq!(state.pending_release, None);
    }
}
