use derive_more::{Add, AddAssign, Display};

/// `TimeToLive` (ttl) newtype.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd, Hash, Add, AddAssign, Display,
)]
pub struct TimeToLive(pub u8);

/// Port newtype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd, Hash, Display)]
pub struct Port(pub u16);

/// Path MTU newtype.
///
/// This is the size of the whole IP datagram, including the IP and UDP headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd, Hash, Display)]
pub struct Mtu(pub u32);

/// Probe packet length newtype, including the IP and UDP headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd, Hash, Display)]
pub struct PacketLen(pub u32);

/// The number of hops a response travelled on its way back to us.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd, Hash, Display)]
pub struct ReturnHops(pub u8);

impl ReturnHops {
    /// Estimate the return path length from the hop limit of a received packet.
    ///
    /// Responders start from an initial hop limit of 64, 128 or 255 and so the distance is
    /// measured from the smallest of these that is not below the received value.
    #[must_use]
    pub const fn from_received_ttl(ttl: u8) -> Self {
        match ttl {
            0..=64 => Self(65 - ttl),
            65..=128 => Self(129 - ttl),
            _ => Self(u8::MAX - ttl + 1),
        }
    }
}
