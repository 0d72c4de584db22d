use crate::constants::UNRESOLVED_HOST;
use crate::error::Result;
use crate::event::{Event, Hop, HopStatus, Responder};
use crate::history::Slot;
use crate::net::Network;
use crate::notification::{ErrorCode, ExtendedError, Notification, Origin};
use crate::payload::ProbeHeader;
use crate::resolve::HostResolver;
use crate::session::Session;
use crate::types::{Mtu, ReturnHops, TimeToLive};
use std::time::SystemTime;
use tracing::instrument;

/// The result of draining the notification queue.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DecodeOutcome {
    /// The destination was reached.
    Reached,
    /// A notification was received which ends the trace.
    HardError,
    /// The path MTU estimate was lowered.
    MtuChanged,
    /// At least one notification was decoded.
    Progress,
    /// Nothing useful was read.
    Exhausted,
}

impl DecodeOutcome {
    /// Whether the outcome ends the trace.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Reached | Self::HardError)
    }
}

/// Read and decode all pending notifications.
///
/// Every decoded notification is published as an [`Event`]. Draining stops early at the first
/// notification which ends the trace, or which carries no extended error.
#[instrument(skip(session, network, resolver, publish), level = "trace")]
pub fn drain<N: Network, R: HostResolver, F: FnMut(&Event)>(
    session: &mut Session,
    network: &mut N,
    resolver: &R,
    ttl: TimeToLive,
    publish: &mut F,
) -> Result<DecodeOutcome> {
    let initial_mtu = session.mtu();
    let mut progress = false;
    while let Some(notification) = network.recv_notification()? {
        progress = true;
        let Some(hop) = decode(session, resolver, ttl, &notification) else {
            tracing::debug!("notification without extended error");
            publish(&Event::NoInfo);
            return Ok(DecodeOutcome::Exhausted);
        };
        let status = hop.status;
        tracing::debug!(?hop);
        publish(&Event::Hop(hop));
        match status {
            HopStatus::Reached => return Ok(DecodeOutcome::Reached),
            status if status.is_terminal() => return Ok(DecodeOutcome::HardError),
            _ => {}
        }
    }
    Ok(if session.mtu() < initial_mtu {
        DecodeOutcome::MtuChanged
    } else if progress {
        DecodeOutcome::Progress
    } else {
        DecodeOutcome::Exhausted
    })
}

/// Decode a single notification, updating the session as required.
///
/// Returns `None` if the notification carries no extended error.
fn decode<R: HostResolver>(
    session: &mut Session,
    resolver: &R,
    ttl: TimeToLive,
    notification: &Notification,
) -> Option<Hop> {
    let matched = match_probe(session, notification);
    let return_hops = notification.recv_ttl.map(ReturnHops::from_received_ttl);
    let error = notification.error?;
    let status = classify(&error, matched.ttl, return_hops, ttl);
    match status {
        HopStatus::PathMtu(mtu) => {
            session.clamp_mtu(mtu);
        }
        HopStatus::Reached => session.set_hops(matched.ttl.unwrap_or(ttl), return_hops),
        _ => {}
    }
    let rtt = matched
        .sent
        .map(|sent| notification.received.duration_since(sent).unwrap_or_default());
    Some(Hop {
        ttl,
        confirmed_hop: matched.ttl.filter(|hop| hop.0 > 0),
        responder: responder(session, resolver, &error),
        rtt,
        broken_router: matched.broken_router,
        status,
    })
}

/// The probe a notification was provoked by, as far as it can be determined.
#[derive(Debug, Default)]
struct MatchedProbe {
    ttl: Option<TimeToLive>,
    sent: Option<SystemTime>,
    broken_router: bool,
}

/// Match a notification to a probe.
///
/// The history record for the destination port is always consumed. A complete echoed header is
/// preferred over the history, unless it is corrupt.
fn match_probe(session: &mut Session, notification: &Notification) -> MatchedProbe {
    let base_port = session.base_port();
    let mut matched = notification
        .dest_port
        .and_then(|port| Slot::for_port(port, base_port))
        .and_then(|slot| session.history().take(slot))
        .map(|record| MatchedProbe {
            ttl: Some(record.ttl),
            sent: Some(record.sent),
            broken_router: false,
        })
        .unwrap_or_default();
    if let Some(header) = ProbeHeader::read(&notification.payload) {
        match header.trusted_ttl() {
            Some(ttl) => {
                matched.ttl = Some(ttl);
                matched.sent = Some(header.sent());
            }
            None => matched.broken_router = true,
        }
    }
    matched
}

fn classify(
    error: &ExtendedError,
    sent_hops: Option<TimeToLive>,
    return_hops: Option<ReturnHops>,
    ttl: TimeToLive,
) -> HopStatus {
    match error.code {
        ErrorCode::TimedOut => HopStatus::Hop { asymmetry: None },
        ErrorCode::MessageTooBig => HopStatus::PathMtu(Mtu(error.info)),
        ErrorCode::ConnectionRefused => HopStatus::Reached,
        ErrorCode::Protocol => HopStatus::ProtocolError,
        ErrorCode::HostUnreachable if error.is_time_exceeded() => {
            let forward = sent_hops.unwrap_or(ttl);
            HopStatus::Hop {
                asymmetry: return_hops.filter(|hops| hops.0 != forward.0),
            }
        }
        ErrorCode::HostUnreachable => HopStatus::HostUnreachable,
        ErrorCode::NetUnreachable => HopStatus::NetUnreachable,
        ErrorCode::AccessDenied => HopStatus::AccessDenied,
        ErrorCode::Other(errno) => HopStatus::NetError(errno),
    }
}

fn responder<R: HostResolver>(
    session: &Session,
    resolver: &R,
    error: &ExtendedError,
) -> Responder {
    match error.origin {
        Origin::Local => Responder::Local,
        Origin::Icmp | Origin::Icmp6 => {
            let addr = error.offender;
            let hostname = session.address_mode().needs_hostname().then(|| {
                addr.and_then(|addr| resolver.resolve(addr))
                    .unwrap_or_else(|| String::from(UNRESOLVED_HOST))
            });
            Responder::Remote { addr, hostname }
        }
        Origin::Other(_) => Responder::Unknown,
    }
}
