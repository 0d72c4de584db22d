use crate::constants::HISTORY_SIZE;
use crate::types::{Port, TimeToLive};
use std::time::SystemTime;

/// The index of a probe record in the history ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd)]
pub struct Slot(usize);

impl Slot {
    /// The slot of a probe sent to `port` for a session using `base_port`.
    ///
    /// Ports wrap around `u16::MAX` and so the offset is taken with wrapping arithmetic. Returns
    /// `None` if the port lies outside the window of ports used by the session.
    #[must_use]
    pub fn for_port(port: Port, base_port: Port) -> Option<Self> {
        let offset = usize::from(port.0.wrapping_sub(base_port.0));
        (offset < HISTORY_SIZE).then_some(Self(offset))
    }

    /// The destination port used for probes in this slot.
    #[must_use]
    pub fn port(self, base_port: Port) -> Port {
        Port(base_port.0.wrapping_add(self.0 as u16))
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A probe which is awaiting a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeRecord {
    pub ttl: TimeToLive,
    pub sent: SystemTime,
}

/// A fixed size ring of outstanding probes, keyed by destination port.
///
/// Each slot holds at most one record and recording into an occupied slot silently replaces
/// the older probe, which is then treated as lost.
#[derive(Debug, Clone)]
pub struct History {
    records: [Option<ProbeRecord>; HISTORY_SIZE],
    cursor: Slot,
}

impl History {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: [None; HISTORY_SIZE],
            cursor: Slot(0),
        }
    }

    /// The slot to be used by the next probe.
    #[must_use]
    pub const fn cursor(&self) -> Slot {
        self.cursor
    }

    /// Move the cursor to the next slot.
    pub fn advance(&mut self) {
        self.cursor = Slot((self.cursor.0 + 1) % HISTORY_SIZE);
    }

    /// Record a probe, overwriting any existing record in the slot.
    pub fn record(&mut self, slot: Slot, ttl: TimeToLive, sent: SystemTime) {
        self.records[slot.0] = Some(ProbeRecord { ttl, sent });
    }

    /// Remove and return the record in the slot, if any.
    pub fn take(&mut self, slot: Slot) -> Option<ProbeRecord> {
        self.records[slot.0].take()
    }

    /// Forget the record in the slot.
    pub fn clear(&mut self, slot: Slot) {
        self.records[slot.0] = None;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use test_case::test_case;

    #[test_case(44444, 44444, Some(0); "first slot")]
    #[test_case(44507, 44444, Some(63); "last slot")]
    #[test_case(44508, 44444, None; "beyond last slot")]
    #[test_case(44443, 44444, None; "below base port")]
    #[test_case(5, 65500, Some(41); "wrapped around port space")]
    #[test_case(65535, 65535, Some(0); "base port at top of range")]
    fn test_slot_for_port(port: u16, base_port: u16, expected: Option<usize>) {
        assert_eq!(
            expected,
            Slot::for_port(Port(port), Port(base_port)).map(Slot::index)
        );
    }

    #[test]
    fn test_slot_port_round_trip_wraps() {
        let base_port = Port(65530);
        let slot = Slot::for_port(Port(3), base_port).unwrap();
        assert_eq!(Port(3), slot.port(base_port));
    }

    #[test]
    fn test_take_clears_slot() {
        let mut history = History::new();
        let sent = SystemTime::UNIX_EPOCH + Duration::from_secs(1);
        let slot = history.cursor();
        history.record(slot, TimeToLive(7), sent);
        assert_eq!(
            Some(ProbeRecord {
                ttl: TimeToLive(7),
                sent
            }),
            history.take(slot)
        );
        assert_eq!(None, history.take(slot));
    }

    #[test]
    fn test_cursor_wraps() {
        let mut history = History::new();
        for _ in 0..HISTORY_SIZE {
            history.advance();
        }
        assert_eq!(0, history.cursor().index());
    }

    #[test]
    fn test_collision_after_full_cycle_evicts_oldest() {
        let mut history = History::new();
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let first_slot = history.cursor();
        for i in 0..=HISTORY_SIZE {
            let slot = history.cursor();
            history.record(slot, TimeToLive(1), start + Duration::from_secs(i as u64));
            history.advance();
        }
        let record = history.take(first_slot).unwrap();
        assert_eq!(
            start + Duration::from_secs(HISTORY_SIZE as u64),
            record.sent
        );
        assert_eq!(None, history.take(first_slot));
    }
}
