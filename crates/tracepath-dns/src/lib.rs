//! This crate provides a caching forward and reverse DNS resolver backed by
//! the system resolver.
//!
//! # Example
//!
//! The following example resolves a hostname to an IPv4 address and then
//! performs a reverse lookup of it.
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use tracepath_dns::{Config, DnsEntry, DnsResolver, IpAddrFamily, Resolver};
//!
//! let resolver = DnsResolver::new(Config::new(IpAddrFamily::Ipv4Only));
//! let addrs = resolver.lookup("example.com")?;
//! for addr in addrs {
//!     match resolver.reverse_lookup(addr) {
//!         DnsEntry::Resolved(ip, hosts) => println!("{ip} resolved to {hosts:?}"),
//!         DnsEntry::NotFound(ip) => println!("{ip} did not match any records"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
#![warn(clippy::all, clippy::pedantic, clippy::nursery, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::option_if_let_else,
    clippy::missing_const_for_fn,
    clippy::missing_errors_doc
)]
#![forbid(unsafe_code)]

mod config;
mod dns_resolver;
mod resolver;

pub use config::Config;
pub use dns_resolver::{DnsResolver, IpAddrFamily};
pub use resolver::{DnsEntry, Error, ResolvedIpAddrs, Resolver, Result};
