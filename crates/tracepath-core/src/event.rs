use crate::types::{Mtu, ReturnHops, TimeToLive};
use std::net::IpAddr;
use std::time::Duration;

/// An observation made while tracing, published to the caller as it happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A notification was decoded for a hop.
    Hop(Hop),
    /// A notification carried no extended error.
    NoInfo,
    /// A datagram was received from the destination.
    ReplyReceived { ttl: TimeToLive },
    /// A probe could not be sent.
    SendFailed { ttl: TimeToLive },
    /// No response was received for a ttl.
    NoReply { ttl: TimeToLive },
}

/// A decoded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    /// The ttl being traced when the notification was read.
    pub ttl: TimeToLive,
    /// The ttl the matched probe was sent with, if the notification could be matched.
    pub confirmed_hop: Option<TimeToLive>,
    pub responder: Responder,
    /// The round trip time, if the notification could be matched to a probe.
    pub rtt: Option<Duration>,
    /// The responder echoed a corrupted copy of the probe header.
    pub broken_router: bool,
    pub status: HopStatus,
}

impl Hop {
    /// The hop number to report, the confirmed hop if known, otherwise the traced ttl.
    #[must_use]
    pub fn hop_number(&self) -> TimeToLive {
        self.confirmed_hop.unwrap_or(self.ttl)
    }
}

/// The node which generated a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Responder {
    /// The local network stack.
    Local,
    /// A remote node.
    Remote {
        addr: Option<IpAddr>,
        /// The resolved name of `addr`, if requested.
        ///
        /// This is `None` if the name was not requested and the placeholder for unresolvable
        /// hosts if the lookup failed.
        hostname: Option<String>,
    },
    /// A notification of unknown origin.
    Unknown,
}

/// The classification of a decoded notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopStatus {
    /// An intermediate hop, with the return path length if it differs from the forward path.
    Hop { asymmetry: Option<ReturnHops> },
    /// The path MTU was lowered to the given value.
    PathMtu(Mtu),
    /// The destination was reached.
    Reached,
    /// `!P`
    ProtocolError,
    /// `!H`
    HostUnreachable,
    /// `!N`
    NetUnreachable,
    /// `!A`
    AccessDenied,
    /// An unexpected error, given as the raw OS error code.
    NetError(i32),
}

impl HopStatus {
    /// Whether the status ends the trace.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Hop { .. } | Self::PathMtu(_))
    }
}
