use crate::types::Port;
use std::net::IpAddr;
use std::time::SystemTime;

/// A message read from the socket error queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// When the notification was read.
    pub received: SystemTime,
    /// The destination port of the probe which provoked the notification.
    pub dest_port: Option<Port>,
    /// The start of the original probe payload, as echoed back to us.
    pub payload: Vec<u8>,
    /// The extended error, if one was attached.
    pub error: Option<ExtendedError>,
    /// The ttl (or hop limit) of the received ICMP packet, if known.
    pub recv_ttl: Option<u8>,
}

/// An extended socket error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedError {
    pub origin: Origin,
    pub code: ErrorCode,
    pub icmp_type: u8,
    pub icmp_code: u8,
    /// Additional information, the next hop MTU for [`ErrorCode::MessageTooBig`].
    pub info: u32,
    /// The address of the node which generated the error.
    pub offender: Option<IpAddr>,
}

impl ExtendedError {
    /// Whether this error is the regular response from an intermediate hop.
    ///
    /// This is an ICMP `TimeExceeded` (type 11, code 0) or an ICMPv6 `TimeExceeded` (type 3,
    /// code 0) both of which are surfaced as [`ErrorCode::HostUnreachable`].
    #[must_use]
    pub const fn is_time_exceeded(&self) -> bool {
        matches!(
            (self.origin, self.icmp_type, self.icmp_code),
            (Origin::Icmp, 11, 0) | (Origin::Icmp6, 3, 0)
        )
    }
}

/// Where an extended error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The local network stack.
    Local,
    /// A remote node, via ICMP.
    Icmp,
    /// A remote node, via ICMPv6.
    Icmp6,
    /// Any other origin.
    Other(u8),
}

/// The error code of an extended error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    TimedOut,
    MessageTooBig,
    ConnectionRefused,
    Protocol,
    HostUnreachable,
    NetUnreachable,
    AccessDenied,
    Other(i32),
}
