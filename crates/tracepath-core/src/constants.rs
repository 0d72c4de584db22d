use std::time::Duration;

/// The number of outstanding probes tracked at once.
pub const HISTORY_SIZE: usize = 64;

/// The maximum number of send attempts for a single probe.
pub const MAX_SEND_ATTEMPTS: usize = 10;

/// The maximum number of probes sent for a single ttl before giving up on it.
pub const MAX_TTL_ATTEMPTS: usize = 3;

/// How long to wait for a reply or notification after each probe is sent.
pub const REPLY_WAIT: Duration = Duration::from_secs(1);

/// The IPv4 and UDP header overhead.
pub const OVERHEAD_IPV4: u32 = 28;

/// The IPv6 and UDP header overhead.
pub const OVERHEAD_IPV6: u32 = 48;

/// The largest packet length that may be requested.
pub const MAX_PACKET_LENGTH: u32 = 2_147_483_647;

/// The placeholder used when a responder cannot be resolved.
pub const UNRESOLVED_HOST: &str = "???";
