//! Transport seam for the rover.
//!
//! The radio stack itself lives outside this crate; the controller only needs
//! the session lifecycle and one framed message at a time.
//!
//! # Modules
//! - `packet`: decodes and encodes Bluefruit Connect UART packets.

/// Module for the Bluefruit Connect packet codec.
pub mod packet;

/// Connection session state, tracked by the robot controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Advertising,
    Connected,
}

/// A session-based, message-framed command link (e.g. BLE UART).
pub trait Link {
    /// Begin advertising the command service.
    fn start_advertising(&mut self);

    /// Stop advertising once a central is connected.
    fn stop_advertising(&mut self);

    /// Block until a central connects.
    ///
    /// Implementations may return early; the controller re-checks
    /// [`Link::is_connected`] and backs off for
    /// [`ADVERTISE_RETRY_MS`](crate::utils::controllers::ADVERTISE_RETRY_MS)
    /// before advertising again.
    fn wait_for_connection(&mut self);

    fn is_connected(&self) -> bool;

    /// Block until the next framed message is available and copy it into
    /// `buf`, returning its length. Returns `None` once the link is lost.
    fn next_message(
        &mut self,
        buf: &mut [u8],
    ) -> Option<usize>;

    /// Drop every message that has already arrived, without blocking.
    /// Returns how many were dropped.
    ///
    /// Called after an emergency stop so that input sent during the hold
    /// never reaches the controller.
    fn discard_pending(&mut self) -> usize;
}
