//! Utility re-exports for the rover.
//!
//! - `config`: palette, emergency-stop timing and servo calibration
//! - `connection`: the `Link` transport seam and the Bluefruit packet codec
//! - `controllers`: drive, indicator and top-level robot controllers
//! - `display`: maneuver icons rendered through `embedded-graphics`

pub mod config;
pub mod connection;
pub mod controllers;
pub mod display;

pub use config::RobotConfig;
pub use connection::{packet, Link, LinkState};
pub use controllers::{Button, Command, Direction, RobotController, RobotError, RobotState};
