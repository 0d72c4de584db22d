use crate::config::{AddressMode, Family, SessionConfig};
use crate::error::{Error, Result};
use crate::history::History;
use crate::payload::ProbeHeader;
use crate::types::{Mtu, Port, ReturnHops, TimeToLive};
use std::time::SystemTime;

/// The mutable state of a single trace.
///
/// The session owns the probe history and the probe buffer, which is sized for the initial MTU
/// and reused for every probe.
#[derive(Debug)]
pub struct Session {
    family: Family,
    base_port: Port,
    mtu: Mtu,
    max_ttl: TimeToLive,
    address_mode: AddressMode,
    history: History,
    hops_to: Option<TimeToLive>,
    hops_from: Option<ReturnHops>,
    buffer: Vec<u8>,
}

impl Session {
    /// Create a `Session`, allocating a probe buffer large enough for the initial MTU.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let capacity = payload_len(config.mtu, config.family.overhead());
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(capacity)
            .map_err(|_| Error::Allocation(capacity))?;
        buffer.resize(capacity, 0);
        Ok(Self {
            family: config.family,
            base_port: config.base_port,
            mtu: config.mtu,
            max_ttl: config.max_ttl,
            address_mode: config.address_mode,
            history: History::new(),
            hops_to: None,
            hops_from: None,
            buffer,
        })
    }

    #[must_use]
    pub const fn base_port(&self) -> Port {
        self.base_port
    }

    /// The current path MTU estimate.
    #[must_use]
    pub const fn mtu(&self) -> Mtu {
        self.mtu
    }

    #[must_use]
    pub const fn max_ttl(&self) -> TimeToLive {
        self.max_ttl
    }

    #[must_use]
    pub const fn address_mode(&self) -> AddressMode {
        self.address_mode
    }

    /// The number of hops to the destination, known once it has been reached.
    #[must_use]
    pub const fn hops_to(&self) -> Option<TimeToLive> {
        self.hops_to
    }

    /// The number of hops back from the destination, known once it has been reached.
    #[must_use]
    pub const fn hops_from(&self) -> Option<ReturnHops> {
        self.hops_from
    }

    pub fn history(&mut self) -> &mut History {
        &mut self.history
    }

    /// Lower the path MTU estimate to `mtu`.
    ///
    /// Returns true if the estimate changed, the estimate is never raised.
    pub fn clamp_mtu(&mut self, mtu: Mtu) -> bool {
        if mtu < self.mtu {
            tracing::debug!(from = %self.mtu, to = %mtu, "path mtu lowered");
            self.mtu = mtu;
            true
        } else {
            false
        }
    }

    /// Record the number of hops to and from the destination.
    pub fn set_hops(&mut self, hops_to: TimeToLive, hops_from: Option<ReturnHops>) {
        if self.hops_to.is_none() {
            self.hops_to = Some(hops_to);
            self.hops_from = hops_from;
        }
    }

    /// Build the payload for a probe sent with `ttl` at time `sent`.
    ///
    /// The payload fills the current path MTU once the IP and UDP headers are added.
    pub fn payload(&mut self, ttl: TimeToLive, sent: SystemTime) -> &[u8] {
        let len = payload_len(self.mtu, self.family.overhead()).min(self.buffer.len());
        let payload = &mut self.buffer[..len];
        payload.fill(0);
        ProbeHeader::new(ttl, sent).write(payload);
        payload
    }
}

fn payload_len(mtu: Mtu, overhead: u32) -> usize {
    mtu.0.saturating_sub(overhead) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::HEADER_LEN;
    use std::time::{Duration, UNIX_EPOCH};
    use test_case::test_case;

    fn config(family: Family, mtu: u32) -> SessionConfig {
        SessionConfig {
            family,
            mtu: Mtu(mtu),
            ..SessionConfig::default()
        }
    }

    #[test_case(Family::V4, 1500, 1472; "ipv4")]
    #[test_case(Family::V6 { mapped: false }, 1500, 1452; "ipv6")]
    #[test_case(Family::V6 { mapped: true }, 1500, 1472; "ipv4 mapped")]
    #[test_case(Family::V4, 29, 1; "smallest ipv4")]
    fn test_payload_len(family: Family, mtu: u32, expected: usize) -> anyhow::Result<()> {
        let mut session = Session::new(&config(family, mtu))?;
        let payload = session.payload(TimeToLive(1), SystemTime::now());
        assert_eq!(expected, payload.len());
        Ok(())
    }

    #[test]
    fn test_payload_shrinks_with_mtu() -> anyhow::Result<()> {
        let mut session = Session::new(&config(Family::V4, 1500))?;
        assert!(session.clamp_mtu(Mtu(1400)));
        let sent = UNIX_EPOCH + Duration::from_secs(10);
        let payload = session.payload(TimeToLive(3), sent);
        assert_eq!(1372, payload.len());
        let header = ProbeHeader::read(payload).unwrap();
        assert_eq!(Some(TimeToLive(3)), header.trusted_ttl());
        assert_eq!(sent, header.sent());
        assert!(payload[HEADER_LEN..].iter().all(|&b| b == 0));
        Ok(())
    }

    #[test]
    fn test_mtu_never_increases() -> anyhow::Result<()> {
        let mut session = Session::new(&config(Family::V4, 1500))?;
        assert!(session.clamp_mtu(Mtu(1400)));
        assert!(!session.clamp_mtu(Mtu(1450)));
        assert!(!session.clamp_mtu(Mtu(1400)));
        assert_eq!(Mtu(1400), session.mtu());
        Ok(())
    }

    #[test]
    fn test_hops_set_once() -> anyhow::Result<()> {
        let mut session = Session::new(&SessionConfig::default())?;
        session.set_hops(TimeToLive(5), Some(ReturnHops(6)));
        session.set_hops(TimeToLive(9), None);
        assert_eq!(Some(TimeToLive(5)), session.hops_to());
        assert_eq!(Some(ReturnHops(6)), session.hops_from());
        Ok(())
    }
}
