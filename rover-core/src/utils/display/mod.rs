//! Status display for the rover.
//!
//! - `icon`: static maneuver icons and their clear-then-draw renderer.

pub mod icon;

pub use icon::{icon, render, Shape};
