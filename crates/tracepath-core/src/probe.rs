use crate::constants::{MAX_SEND_ATTEMPTS, REPLY_WAIT};
use crate::decoder::{drain, DecodeOutcome};
use crate::error::{Error, Result};
use crate::event::Event;
use crate::net::Network;
use crate::payload::HEADER_LEN;
use crate::resolve::HostResolver;
use crate::session::Session;
use crate::types::TimeToLive;
use itertools::Itertools;
use std::time::SystemTime;
use tracing::instrument;

/// The result of sending a single probe.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ProbeOutcome {
    /// The probe was sent and the notification queue drained.
    Decoded(DecodeOutcome),
    /// A datagram was received from the destination.
    ReplyReceived,
    /// The probe could not be sent.
    SendFailed,
}

impl ProbeOutcome {
    /// Whether the outcome ends the trace.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        match self {
            Self::Decoded(outcome) => outcome.is_terminal(),
            Self::ReplyReceived | Self::SendFailed => true,
        }
    }
}

/// Send a probe with `ttl` and decode whatever it provokes.
///
/// A failed send is usually reported on the error queue, which is drained before the send is
/// retried with a payload sized for the (possibly lowered) path MTU.
#[instrument(skip(session, network, resolver, publish), level = "trace")]
pub fn send_probe<N: Network, R: HostResolver, F: FnMut(&Event)>(
    session: &mut Session,
    network: &mut N,
    resolver: &R,
    ttl: TimeToLive,
    publish: &mut F,
) -> Result<ProbeOutcome> {
    let slot = session.history().cursor();
    let port = slot.port(session.base_port());
    let mut sent = false;
    for attempt in 1..=MAX_SEND_ATTEMPTS {
        let now = SystemTime::now();
        session.history().record(slot, ttl, now);
        let payload = session.payload(ttl, now);
        tracing::trace!(
            attempt,
            %port,
            len = payload.len(),
            header = hex(&payload[..payload.len().min(HEADER_LEN)])
        );
        match network.send_probe(payload, port) {
            Ok(()) => {
                sent = true;
                break;
            }
            Err(Error::ProbeFailed(err)) => {
                tracing::debug!(attempt, %err, "probe send failed");
                let outcome = drain(session, network, resolver, ttl, publish)?;
                session.history().clear(slot);
                if outcome.is_terminal() {
                    session.history().advance();
                    return Ok(ProbeOutcome::Decoded(outcome));
                }
            }
            Err(err) => return Err(err),
        }
    }
    session.history().advance();
    if !sent {
        publish(&Event::SendFailed { ttl });
        return Ok(ProbeOutcome::SendFailed);
    }
    network.wait_readable(REPLY_WAIT)?;
    if network.recv_reply()?.is_some() {
        publish(&Event::ReplyReceived { ttl });
        return Ok(ProbeOutcome::ReplyReceived);
    }
    Ok(ProbeOutcome::Decoded(drain(
        session, network, resolver, ttl, publish,
    )?))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::error::{IoError, IoOperation};
    use crate::event::{Hop, HopStatus};
    use crate::history::Slot;
    use crate::net::MockNetwork;
    use crate::notification::{ErrorCode, ExtendedError, Notification, Origin};
    use crate::resolve::NoResolver;
    use crate::types::{Mtu, Port};
    use mockall::{predicate, Sequence};
    use std::net::SocketAddr;
    use std::str::FromStr;
    use std::sync::{Arc, Mutex};

    fn session() -> Session {
        Session::new(&SessionConfig {
            mtu: Mtu(1500),
            ..SessionConfig::default()
        })
        .unwrap()
    }

    fn send_error() -> Error {
        Error::ProbeFailed(IoError::SendTo(
            std::io::Error::from_raw_os_error(90),
            SocketAddr::from_str("192.0.2.1:44444").unwrap(),
        ))
    }

    fn local_message_too_big(mtu: u32) -> Notification {
        Notification {
            received: SystemTime::now(),
            dest_port: Some(Port(44444)),
            payload: vec![],
            error: Some(ExtendedError {
                origin: Origin::Local,
                code: ErrorCode::MessageTooBig,
                icmp_type: 0,
                icmp_code: 0,
                info: mtu,
                offender: None,
            }),
            recv_ttl: None,
        }
    }

    fn run(
        session: &mut Session,
        network: &mut MockNetwork,
        ttl: u8,
    ) -> (ProbeOutcome, Vec<Event>) {
        let mut events = vec![];
        let mut publish = |event: &Event| events.push(event.clone());
        let outcome =
            send_probe(session, network, &NoResolver, TimeToLive(ttl), &mut publish).unwrap();
        (outcome, events)
    }

    #[test]
    fn test_send_and_drain() {
        let mut session = session();
        let mut network = MockNetwork::new();
        let mut seq = Sequence::new();
        network
            .expect_send_probe()
            .withf(|payload, port| payload.len() == 1472 && *port == Port(44444))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        network
            .expect_wait_readable()
            .with(predicate::eq(REPLY_WAIT))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));
        network
            .expect_recv_reply()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(None));
        network
            .expect_recv_notification()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(None));
        let (outcome, events) = run(&mut session, &mut network, 1);
        assert_eq!(ProbeOutcome::Decoded(DecodeOutcome::Exhausted), outcome);
        assert!(events.is_empty());
        assert_eq!(1, session.history().cursor().index());
        let first = Slot::for_port(Port(44444), Port(44444)).unwrap();
        assert!(session.history().take(first).is_some());
    }

    #[test]
    fn test_reply_received() {
        let mut session = session();
        let mut network = MockNetwork::new();
        network.expect_send_probe().times(1).returning(|_, _| Ok(()));
        network.expect_wait_readable().times(1).returning(|_| Ok(true));
        network.expect_recv_reply().times(1).returning(|| Ok(Some(8)));
        network.expect_recv_notification().never();
        let (outcome, events) = run(&mut session, &mut network, 6);
        assert_eq!(ProbeOutcome::ReplyReceived, outcome);
        assert_eq!(vec![Event::ReplyReceived { ttl: TimeToLive(6) }], events);
    }

    #[test]
    fn test_send_failed_after_max_attempts() {
        let mut session = session();
        let mut network = MockNetwork::new();
        network
            .expect_send_probe()
            .times(MAX_SEND_ATTEMPTS)
            .returning(|_, _| Err(send_error()));
        network
            .expect_recv_notification()
            .times(MAX_SEND_ATTEMPTS)
            .returning(|| Ok(None));
        network.expect_wait_readable().never();
        let (outcome, events) = run(&mut session, &mut network, 3);
        assert_eq!(ProbeOutcome::SendFailed, outcome);
        assert_eq!(vec![Event::SendFailed { ttl: TimeToLive(3) }], events);
        assert_eq!(1, session.history().cursor().index());
        let first = Slot::for_port(Port(44444), Port(44444)).unwrap();
        assert!(session.history().take(first).is_none());
    }

    #[test]
    fn test_send_retried_with_lowered_mtu() {
        let mut session = session();
        let mut network = MockNetwork::new();
        let lengths = Arc::new(Mutex::new(vec![]));
        let sent = Arc::clone(&lengths);
        network
            .expect_send_probe()
            .times(2)
            .returning(move |payload, _| {
                let mut sent = sent.lock().unwrap();
                sent.push(payload.len());
                if sent.len() == 1 {
                    Err(send_error())
                } else {
                    Ok(())
                }
            });
        let mut queue = vec![Some(local_message_too_big(1400)), None, None].into_iter();
        network
            .expect_recv_notification()
            .times(3)
            .returning(move || Ok(queue.next().flatten()));
        network.expect_wait_readable().times(1).returning(|_| Ok(false));
        network.expect_recv_reply().times(1).returning(|| Ok(None));
        let (outcome, events) = run(&mut session, &mut network, 1);
        assert_eq!(ProbeOutcome::Decoded(DecodeOutcome::Exhausted), outcome);
        assert_eq!(Mtu(1400), session.mtu());
        assert_eq!(vec![1472, 1372], *lengths.lock().unwrap());
        let [Event::Hop(Hop { status, .. })] = events.as_slice() else {
            panic!("expected a single hop event, got {events:?}");
        };
        assert_eq!(HopStatus::PathMtu(Mtu(1400)), *status);
    }

    #[test]
    fn test_terminal_outcome_while_sending() {
        let mut session = session();
        let mut network = MockNetwork::new();
        network
            .expect_send_probe()
            .times(1)
            .returning(|_, _| Err(send_error()));
        network.expect_recv_notification().times(1).returning(|| {
            let mut notification = local_message_too_big(0);
            if let Some(error) = notification.error.as_mut() {
                error.code = ErrorCode::NetUnreachable;
            }
            Ok(Some(notification))
        });
        let (outcome, _) = run(&mut session, &mut network, 1);
        assert_eq!(ProbeOutcome::Decoded(DecodeOutcome::HardError), outcome);
    }

    #[test]
    fn test_other_errors_propagate() {
        let mut session = session();
        let mut network = MockNetwork::new();
        network
            .expect_send_probe()
            .times(1)
            .returning(|_, _| {
                Err(Error::IoError(IoError::Other(
                    std::io::Error::from_raw_os_error(9),
                    IoOperation::Select,
                )))
            });
        let err = send_probe(
            &mut session,
            &mut network,
            &NoResolver,
            TimeToLive(1),
            &mut |_: &Event| {},
        )
        .unwrap_err();
        assert!(matches!(err, Error::IoError(IoError::Other(_, IoOperation::Select))));
    }
}
