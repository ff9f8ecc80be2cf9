//! Command-to-motion core for a Bluetooth-remote two-wheeled rover on no-std
//! embedded platforms.
//!
//! For a host-side run of the full controller, see `rover-app/mock-mcu`.
#![cfg_attr(not(test), no_std)]

pub mod utils;
