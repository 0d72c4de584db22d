use crate::constants::MAX_TTL_ATTEMPTS;
use crate::decoder::DecodeOutcome;
use crate::error::Result;
use crate::event::Event;
use crate::net::Network;
use crate::probe::{send_probe, ProbeOutcome};
use crate::resolve::HostResolver;
use crate::session::Session;
use crate::types::{Mtu, ReturnHops, TimeToLive};
use tracing::instrument;

/// The result of a completed trace.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Summary {
    /// The final path MTU estimate.
    pub pmtu: Mtu,
    /// The number of hops to the destination, if it was reached.
    pub hops_to: Option<TimeToLive>,
    /// The number of hops back from the destination, if known.
    pub hops_from: Option<ReturnHops>,
    pub completion: Completion,
}

/// Indicates what ended the trace.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Completion {
    /// The destination rejected a probe.
    Reached,
    /// The destination replied to a probe.
    ReplyReceived,
    /// A probe could not be sent.
    SendFailed,
    /// A notification was received which prevents further tracing.
    HardError,
    /// The maximum ttl was reached before the destination.
    TooManyHops,
}

impl Completion {
    const fn from_outcome(outcome: ProbeOutcome) -> Option<Self> {
        match outcome {
            ProbeOutcome::Decoded(DecodeOutcome::Reached) => Some(Self::Reached),
            ProbeOutcome::Decoded(DecodeOutcome::HardError) => Some(Self::HardError),
            ProbeOutcome::ReplyReceived => Some(Self::ReplyReceived),
            ProbeOutcome::SendFailed => Some(Self::SendFailed),
            ProbeOutcome::Decoded(_) => None,
        }
    }
}

/// What to do once a ttl has been probed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Step {
    Advance,
    Done(Completion),
}

/// Trace the path to a target, one ttl at a time.
pub struct Strategy<'a, R, F> {
    resolver: &'a R,
    publish: F,
}

impl<'a, R: HostResolver, F: FnMut(&Event)> Strategy<'a, R, F> {
    pub const fn new(resolver: &'a R, publish: F) -> Self {
        Self { resolver, publish }
    }

    /// Run the trace to completion, publishing events as they occur.
    #[instrument(skip_all, level = "trace")]
    pub fn run<N: Network>(mut self, network: &mut N, session: &mut Session) -> Result<Summary> {
        let mut completion = Completion::TooManyHops;
        for ttl in (1..=session.max_ttl().0).map(TimeToLive) {
            network.set_ttl(ttl)?;
            if let Step::Done(done) = self.probe_ttl(network, session, ttl)? {
                completion = done;
                break;
            }
        }
        let summary = Summary {
            pmtu: session.mtu(),
            hops_to: session.hops_to(),
            hops_from: session.hops_from(),
            completion,
        };
        tracing::debug!(?summary);
        Ok(summary)
    }

    /// Probe a single ttl.
    ///
    /// A lowered path MTU restarts the ttl with a full set of attempts, even if the same drain
    /// also read a terminal notification.
    #[instrument(skip(self, network, session), level = "trace")]
    fn probe_ttl<N: Network>(
        &mut self,
        network: &mut N,
        session: &mut Session,
        ttl: TimeToLive,
    ) -> Result<Step> {
        let mut attempt = 0;
        while attempt < MAX_TTL_ATTEMPTS {
            let mtu = session.mtu();
            let outcome = send_probe(session, network, self.resolver, ttl, &mut self.publish)?;
            if session.mtu() != mtu {
                tracing::debug!(%ttl, mtu = %session.mtu(), "restarting ttl");
                attempt = 0;
                continue;
            }
            if let Some(completion) = Completion::from_outcome(outcome) {
                return Ok(Step::Done(completion));
            }
            if outcome == ProbeOutcome::Decoded(DecodeOutcome::Progress) {
                return Ok(Step::Advance);
            }
            attempt += 1;
        }
        (self.publish)(&Event::NoReply { ttl });
        Ok(Step::Advance)
    }
}
