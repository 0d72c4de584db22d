use crate::constants::{OVERHEAD_IPV4, OVERHEAD_IPV6};
use crate::types::{Mtu, Port, TimeToLive};
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, Ipv4Addr};

/// Default values for configuration.
pub mod defaults {
    use crate::config::AddressMode;

    /// The default value for `port`.
    pub const DEFAULT_BASE_PORT: u16 = 44444;

    /// The default value for `max-hops`.
    pub const DEFAULT_MAX_TTL: u8 = 30;

    /// The default initial path MTU for IPv4 targets.
    pub const DEFAULT_MTU_IPV4: u32 = 65535;

    /// The default initial path MTU for IPv6 targets.
    pub const DEFAULT_MTU_IPV6: u32 = 128_000;

    /// The default value for `address-mode`.
    pub const DEFAULT_ADDRESS_MODE: AddressMode = AddressMode::Host;
}

/// The address family of the traced path.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Family {
    /// Internet Protocol V4.
    V4,
    /// Internet Protocol V6.
    ///
    /// A `mapped` target is an IPv4 address carried in an IPv6 socket, the path is IPv4.
    V6 { mapped: bool },
}

impl Family {
    /// The family required to trace the path to `target`.
    #[must_use]
    pub const fn for_target(target: IpAddr) -> Self {
        match target {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(addr) => Self::V6 {
                mapped: addr.to_ipv4_mapped().is_some(),
            },
        }
    }

    /// Whether the packets on the wire are IPv4.
    #[must_use]
    pub const fn is_ipv4_path(self) -> bool {
        matches!(self, Self::V4 | Self::V6 { mapped: true })
    }

    /// The combined IP and UDP header size.
    #[must_use]
    pub const fn overhead(self) -> u32 {
        if self.is_ipv4_path() {
            OVERHEAD_IPV4
        } else {
            OVERHEAD_IPV6
        }
    }

    /// The initial MTU estimate when no packet length is configured.
    ///
    /// An IPv4-mapped target keeps the IPv6 default even though its packets are IPv4.
    #[must_use]
    pub const fn default_mtu(self) -> Mtu {
        match self {
            Self::V4 => Mtu(defaults::DEFAULT_MTU_IPV4),
            Self::V6 { .. } => Mtu(defaults::DEFAULT_MTU_IPV6),
        }
    }
}

impl Display for Family {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V4 => write!(f, "v4"),
            Self::V6 { mapped: false } => write!(f, "v6"),
            Self::V6 { mapped: true } => write!(f, "v6 (v4 mapped)"),
        }
    }
}

/// How to identify the responder of each hop.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AddressMode {
    /// Show the hostname only.
    Host,
    /// Show the IP address only.
    Ip,
    /// Show the hostname followed by the IP address.
    HostIp,
    /// Show the IP address followed by the hostname.
    IpHost,
}

impl AddressMode {
    /// The mode implied by the `numeric` and `both` display flags.
    #[must_use]
    pub const fn from_flags(numeric: bool, both: bool) -> Self {
        match (numeric, both) {
            (false, false) => Self::Host,
            (true, false) => Self::Ip,
            (false, true) => Self::HostIp,
            (true, true) => Self::IpHost,
        }
    }

    /// Whether responder addresses must be reverse resolved.
    #[must_use]
    pub const fn needs_hostname(self) -> bool {
        !matches!(self, Self::Ip)
    }
}

/// Channel configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ChannelConfig {
    pub target_addr: IpAddr,
    pub family: Family,
}

impl ChannelConfig {
    #[must_use]
    pub const fn new(target_addr: IpAddr) -> Self {
        Self {
            target_addr,
            family: Family::for_target(target_addr),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }
}

/// Session configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SessionConfig {
    pub family: Family,
    pub base_port: Port,
    pub mtu: Mtu,
    pub max_ttl: TimeToLive,
    pub address_mode: AddressMode,
}

impl SessionConfig {
    #[must_use]
    pub const fn new(
        family: Family,
        base_port: Port,
        mtu: Mtu,
        max_ttl: TimeToLive,
        address_mode: AddressMode,
    ) -> Self {
        Self {
            family,
            base_port,
            mtu,
            max_ttl,
            address_mode,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            family: Family::V4,
            base_port: Port(defaults::DEFAULT_BASE_PORT),
            mtu: Family::V4.default_mtu(),
            max_ttl: TimeToLive(defaults::DEFAULT_MAX_TTL),
            address_mode: defaults::DEFAULT_ADDRESS_MODE,
        }
    }
}
