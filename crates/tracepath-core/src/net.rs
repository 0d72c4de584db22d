use crate::error::Result;
use crate::notification::Notification;
use crate::types::{Port, TimeToLive};
use std::time::Duration;

/// Platform specific network code.
mod platform;

/// A network socket.
mod socket;

/// A channel for sending probes and reading notifications.
pub mod channel;

/// The platform specific socket type.
pub use platform::SocketImpl;

/// An abstraction over a network interface for tracing.
#[cfg_attr(test, mockall::automock)]
pub trait Network {
    /// Set the ttl (or hop limit) used for subsequent probes.
    fn set_ttl(&mut self, ttl: TimeToLive) -> Result<()>;

    /// Send a probe with the given payload to the destination `port`.
    ///
    /// Returns `Error::ProbeFailed` if the probe could not be sent.
    fn send_probe(&mut self, payload: &[u8], port: Port) -> Result<()>;

    /// Wait up to `timeout` for the socket to become readable.
    fn wait_readable(&mut self, timeout: Duration) -> Result<bool>;

    /// Read a datagram sent to us by the destination without blocking.
    ///
    /// Returns `None` if no datagram is available.
    fn recv_reply(&mut self) -> Result<Option<usize>>;

    /// Read the next notification from the error queue without blocking.
    ///
    /// Returns `None` once the error queue is empty.
    fn recv_notification(&mut self) -> Result<Option<Notification>>;
}
