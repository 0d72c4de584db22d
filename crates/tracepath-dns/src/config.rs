use crate::IpAddrFamily;

/// DNS resolver configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Config {
    /// The address family to use for forward lookups.
    pub addr_family: IpAddrFamily,
}

impl Config {
    #[must_use]
    pub const fn new(addr_family: IpAddrFamily) -> Self {
        Self { addr_family }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr_family: IpAddrFamily::System,
        }
    }
}
