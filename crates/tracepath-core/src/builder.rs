use crate::config::{defaults, AddressMode, ChannelConfig, Family, SessionConfig};
use crate::constants::MAX_PACKET_LENGTH;
use crate::error::{Error, Result};
use crate::types::{Mtu, PacketLen, Port, TimeToLive};
use crate::Tracer;
use std::net::IpAddr;

/// Build a tracer.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// use tracepath_core::{AddressMode, Builder, PacketLen, TimeToLive};
///
/// let addr = std::net::IpAddr::from([192, 0, 2, 1]);
/// let tracer = Builder::new(addr)
///     .packet_len(Some(PacketLen(1500)))
///     .max_ttl(TimeToLive(16))
///     .address_mode(AddressMode::Ip)
///     .build()?;
/// # Ok(())
/// # }
/// ```
///
/// # See Also
///
/// - [`Tracer`] - A tracepath implementation.
#[derive(Debug)]
pub struct Builder {
    target_addr: IpAddr,
    packet_len: Option<PacketLen>,
    base_port: Port,
    max_ttl: TimeToLive,
    address_mode: AddressMode,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            target_addr: ChannelConfig::default().target_addr,
            packet_len: None,
            base_port: SessionConfig::default().base_port,
            max_ttl: SessionConfig::default().max_ttl,
            address_mode: SessionConfig::default().address_mode,
        }
    }
}

impl Builder {
    /// Build a tracer builder for a given target.
    #[must_use]
    pub fn new(target_addr: IpAddr) -> Self {
        Self {
            target_addr,
            ..Default::default()
        }
    }

    /// Set the probe packet length, including the IP and UDP headers.
    ///
    /// This is the initial path MTU estimate. If not set, a large default for the address family
    /// is used and the estimate is lowered as the path is discovered.
    #[must_use]
    pub fn packet_len(self, packet_len: Option<PacketLen>) -> Self {
        Self { packet_len, ..self }
    }

    /// Set the destination port of the first probe.
    ///
    /// A value of zero selects the default port.
    #[must_use]
    pub fn base_port(self, base_port: Port) -> Self {
        let base_port = if base_port.0 == 0 {
            Port(defaults::DEFAULT_BASE_PORT)
        } else {
            base_port
        };
        Self { base_port, ..self }
    }

    /// Set the maximum ttl.
    #[must_use]
    pub fn max_ttl(self, max_ttl: TimeToLive) -> Self {
        Self { max_ttl, ..self }
    }

    /// Set how responders are identified.
    #[must_use]
    pub fn address_mode(self, address_mode: AddressMode) -> Self {
        Self {
            address_mode,
            ..self
        }
    }

    /// Build the `Tracer`.
    ///
    /// Returns an error if the packet length cannot hold the IP and UDP headers.
    pub fn build(self) -> Result<Tracer> {
        let family = Family::for_target(self.target_addr);
        let mtu = match self.packet_len {
            Some(PacketLen(len)) => {
                let overhead = family.overhead();
                if len <= overhead || len > MAX_PACKET_LENGTH {
                    return Err(Error::InvalidPacketLength {
                        len,
                        overhead,
                        max: MAX_PACKET_LENGTH,
                    });
                }
                Mtu(len)
            }
            None => family.default_mtu(),
        };
        Ok(Tracer::new(
            ChannelConfig::new(self.target_addr),
            SessionConfig::new(
                family,
                self.base_port,
                mtu,
                self.max_ttl,
                self.address_mode,
            ),
        ))
    }
}
