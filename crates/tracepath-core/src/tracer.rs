use crate::config::{AddressMode, ChannelConfig, Family, SessionConfig};
use crate::error::Result;
use crate::event::Event;
use crate::net::channel::Channel;
use crate::net::SocketImpl;
use crate::resolve::{HostResolver, NoResolver};
use crate::session::Session;
use crate::strategy::{Strategy, Summary};
use crate::types::{Mtu, Port, TimeToLive};
use std::net::IpAddr;
use tracing::instrument;

/// A tracepath implementation.
///
/// See the [`crate`] documentation for more information.
#[derive(Debug, Clone)]
pub struct Tracer {
    channel_config: ChannelConfig,
    session_config: SessionConfig,
}

impl Tracer {
    /// Create a `Tracer`.
    ///
    /// Use the [`crate::Builder`] type to create a [`Tracer`].
    #[must_use]
    pub(crate) const fn new(channel_config: ChannelConfig, session_config: SessionConfig) -> Self {
        Self {
            channel_config,
            session_config,
        }
    }

    /// Run the [`Tracer`] without resolving responder names.
    ///
    /// This method blocks until the trace completes.
    ///
    /// # See Also
    ///
    /// - [`Tracer::run_with`] - Run the tracer with a resolver and an event handler.
    pub fn run(&self) -> Result<Summary> {
        self.run_with(&NoResolver, |_| {})
    }

    /// Run the [`Tracer`] with a custom event handler.
    ///
    /// This method blocks until the trace completes, calling `func` for every [`Event`] as it
    /// happens, and returns a [`Summary`] of the path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> anyhow::Result<()> {
    /// # use std::net::IpAddr;
    /// # use std::str::FromStr;
    /// use tracepath_core::{Builder, NoResolver};
    ///
    /// let addr = IpAddr::from_str("192.0.2.1")?;
    /// let tracer = Builder::new(addr).build()?;
    /// let summary = tracer.run_with(&NoResolver, |event| println!("{event:?}"))?;
    /// println!("pmtu {}", summary.pmtu);
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all, level = "trace")]
    pub fn run_with<R: HostResolver, F: FnMut(&Event)>(
        &self,
        resolver: &R,
        func: F,
    ) -> Result<Summary> {
        let mut network = Channel::<SocketImpl>::connect(&self.channel_config)?;
        let mut session = Session::new(&self.session_config)?;
        Strategy::new(resolver, func).run(&mut network, &mut session)
    }

    /// The target address of the tracer.
    #[must_use]
    pub const fn target_addr(&self) -> IpAddr {
        self.channel_config.target_addr
    }

    /// The address family of the traced path.
    #[must_use]
    pub const fn family(&self) -> Family {
        self.session_config.family
    }

    /// The initial path MTU estimate.
    #[must_use]
    pub const fn mtu(&self) -> Mtu {
        self.session_config.mtu
    }

    /// The destination port of the first probe.
    #[must_use]
    pub const fn base_port(&self) -> Port {
        self.session_config.base_port
    }

    /// The maximum time-to-live value of the tracer.
    #[must_use]
    pub const fn max_ttl(&self) -> TimeToLive {
        self.session_config.max_ttl
    }

    /// How responders are identified.
    #[must_use]
    pub const fn address_mode(&self) -> AddressMode {
        self.session_config.address_mode
    }
}
