//! Tracepath - path MTU discovery and hop latency tracing.
//!
//! This crate sends UDP probes with an increasing time-to-live (ttl) towards a destination and
//! decodes the ICMP errors they provoke, as queued on the socket error queue, to identify each
//! hop, measure the round trip time to it and discover the path MTU.
//!
//! Only Linux is supported.
//!
//! # Example
//!
//! The following example traces the path to a destination and prints every event:
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! # use std::net::IpAddr;
//! # use std::str::FromStr;
//! use tracepath_core::{Builder, NoResolver};
//!
//! let addr = IpAddr::from_str("192.0.2.1")?;
//! let summary = Builder::new(addr)
//!     .build()?
//!     .run_with(&NoResolver, |event| println!("{event:?}"))?;
//! println!("pmtu {} hops {:?}", summary.pmtu, summary.hops_to);
//! # Ok(())
//! # }
//! ```
//!
//! # See Also
//!
//! - [`Builder`] - Build a [`Tracer`].
//! - [`Tracer::run_with`] - Run the tracer with an event handler.
#![warn(clippy::all, clippy::pedantic, clippy::nursery, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::use_self,
    clippy::option_if_let_else,
    clippy::missing_const_for_fn,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss
)]
#![deny(unsafe_code)]

mod builder;
mod config;
mod constants;
mod decoder;
mod error;
mod event;
mod history;
mod net;
mod notification;
mod payload;
mod probe;
mod resolve;
mod session;
mod strategy;
mod tracer;
mod types;

pub use builder::Builder;
pub use config::{defaults, AddressMode, Family};
pub use constants::{OVERHEAD_IPV4, OVERHEAD_IPV6, UNRESOLVED_HOST};
pub use error::{Error, IoError, IoOperation, IoResult, Result};
pub use event::{Event, Hop, HopStatus, Responder};
pub use resolve::{HostResolver, NoResolver};
pub use strategy::{Completion, Summary};
pub use tracer::Tracer;
pub use types::{Mtu, PacketLen, Port, ReturnHops, TimeToLive};
