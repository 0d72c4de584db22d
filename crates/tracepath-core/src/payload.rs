use crate::types::TimeToLive;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The size of the probe header carried at the start of every probe payload.
pub const HEADER_LEN: usize = 16;

const TTL_OFFSET: usize = 0;
const SECONDS_OFFSET: usize = 4;
const MICROS_OFFSET: usize = 12;

/// The header written to the payload of each probe.
///
/// Routers echo (part of) the original datagram in their ICMP errors and so the header allows a
/// notification to be matched to the probe that provoked it without relying on the local
/// history.
///
/// The layout, in network byte order, is:
///
/// ```text
/// 0        4                 12       16
/// +--------+-----------------+--------+
/// |  ttl   |     seconds     | micros |
/// +--------+-----------------+--------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeHeader {
    pub ttl: u32,
    pub seconds: u64,
    pub micros: u32,
}

impl ProbeHeader {
    #[must_use]
    pub fn new(ttl: TimeToLive, sent: SystemTime) -> Self {
        let since_epoch = sent.duration_since(UNIX_EPOCH).unwrap_or_default();
        Self {
            ttl: u32::from(ttl.0),
            seconds: since_epoch.as_secs(),
            micros: since_epoch.subsec_micros(),
        }
    }

    /// Parse a header from an echoed payload.
    ///
    /// Returns `None` if the payload is too short to hold a complete header.
    #[must_use]
    pub fn read(buf: &[u8]) -> Option<Self> {
        let header: &[u8; HEADER_LEN] = buf.get(..HEADER_LEN)?.try_into().ok()?;
        let mut ttl = [0_u8; 4];
        let mut seconds = [0_u8; 8];
        let mut micros = [0_u8; 4];
        ttl.copy_from_slice(&header[TTL_OFFSET..SECONDS_OFFSET]);
        seconds.copy_from_slice(&header[SECONDS_OFFSET..MICROS_OFFSET]);
        micros.copy_from_slice(&header[MICROS_OFFSET..HEADER_LEN]);
        Some(Self {
            ttl: u32::from_be_bytes(ttl),
            seconds: u64::from_be_bytes(seconds),
            micros: u32::from_be_bytes(micros),
        })
    }

    /// Write the header to the start of `buf`.
    ///
    /// A buffer shorter than [`HEADER_LEN`] receives a truncated header.
    pub fn write(&self, buf: &mut [u8]) {
        let mut header = [0_u8; HEADER_LEN];
        header[TTL_OFFSET..SECONDS_OFFSET].copy_from_slice(&self.ttl.to_be_bytes());
        header[SECONDS_OFFSET..MICROS_OFFSET].copy_from_slice(&self.seconds.to_be_bytes());
        header[MICROS_OFFSET..HEADER_LEN].copy_from_slice(&self.micros.to_be_bytes());
        let len = buf.len().min(HEADER_LEN);
        buf[..len].copy_from_slice(&header[..len]);
    }

    /// The ttl the probe was sent with, if the echoed header can be trusted.
    ///
    /// Some routers return a corrupted copy of the original datagram, which shows up as a zero
    /// ttl or timestamp, or a ttl that could never have been sent.
    #[must_use]
    pub fn trusted_ttl(&self) -> Option<TimeToLive> {
        if self.seconds == 0 {
            return None;
        }
        u8::try_from(self.ttl)
            .ok()
            .filter(|&ttl| ttl != 0)
            .map(TimeToLive)
    }

    /// The time the probe was sent.
    #[must_use]
    pub fn sent(&self) -> SystemTime {
        UNIX_EPOCH
            + Duration::from_secs(self.seconds)
            + Duration::from_micros(u64::from(self.micros))
    }
}
