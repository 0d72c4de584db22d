use crate::config::Config;
use crate::resolver::{DnsEntry, Error, ResolvedIpAddrs, Resolver, Result};
use itertools::{Either, Itertools};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use tracing::instrument;

/// How to resolve IP addresses.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IpAddrFamily {
    /// Lookup IPv4 only.
    Ipv4Only,
    /// Lookup IPv6 only.
    Ipv6Only,
    /// Use the addresses returned by the OS resolver, in the order returned.
    System,
}

impl Display for IpAddrFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ipv4Only => write!(f, "Ipv4Only"),
            Self::Ipv6Only => write!(f, "Ipv6Only"),
            Self::System => write!(f, "System"),
        }
    }
}

/// A caching forward and reverse DNS resolver which uses the OS resolver.
///
/// Reverse lookups are performed at most once per address.
#[derive(Debug)]
pub struct DnsResolver {
    config: Config,
    cache: RwLock<HashMap<IpAddr, DnsEntry>>,
}

impl DnsResolver {
    /// Create a new `DnsResolver`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

impl Resolver for DnsResolver {
    #[instrument(skip_all, level = "trace")]
    fn lookup(&self, hostname: impl AsRef<str>) -> Result<ResolvedIpAddrs> {
        let hostname = hostname.as_ref();
        let all = dns_lookup::lookup_host(hostname)
            .map_err(|err| Error::LookupFailed(Box::new(err)))?;
        let addrs = filter_family(all, self.config.addr_family);
        tracing::debug!(hostname, ?addrs, family = %self.config.addr_family);
        Ok(ResolvedIpAddrs(addrs))
    }

    #[instrument(skip_all, level = "trace")]
    fn reverse_lookup(&self, addr: impl Into<IpAddr>) -> DnsEntry {
        let addr = addr.into();
        if let Some(entry) = self.cache.read().get(&addr) {
            return entry.clone();
        }
        // a failed lookup cannot be told apart from a genuine error, both are `NotFound`.
        let entry = match dns_lookup::lookup_addr(&addr) {
            Ok(host) => DnsEntry::Resolved(addr, vec![host]),
            Err(err) => {
                tracing::debug!(%addr, %err, "reverse lookup failed");
                DnsEntry::NotFound(addr)
            }
        };
        self.cache.write().insert(addr, entry.clone());
        entry
    }
}

/// Keep only the addresses of the requested family.
fn filter_family(all: Vec<IpAddr>, addr_family: IpAddrFamily) -> Vec<IpAddr> {
    fn partition(all: Vec<IpAddr>) -> (Vec<IpAddr>, Vec<IpAddr>) {
        all.into_iter().partition_map(|ip| match ip {
            IpAddr::V4(_) => Either::Left(ip),
            IpAddr::V6(_) => Either::Right(ip),
        })
    }
    match addr_family {
        IpAddrFamily::Ipv4Only => partition(all).0,
        IpAddrFamily::Ipv6Only => partition(all).1,
        IpAddrFamily::System => all,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use test_case::test_case;

    fn addrs(addrs: &[&str]) -> Vec<IpAddr> {
        addrs.iter().map(|a| IpAddr::from_str(a).unwrap()).collect()
    }

    #[test_case(IpAddrFamily::Ipv4Only, &["192.0.2.1", "198.51.100.1"]; "ipv4 only")]
    #[test_case(IpAddrFamily::Ipv6Only, &["2001:db8::1"]; "ipv6 only")]
    #[test_case(IpAddrFamily::System, &["2001:db8::1", "192.0.2.1", "198.51.100.1"]; "system")]
    fn test_filter_family(family: IpAddrFamily, expected: &[&str]) {
        let all = addrs(&["2001:db8::1", "192.0.2.1", "198.51.100.1"]);
        assert_eq!(addrs(expected), filter_family(all, family));
    }

    #[test]
    fn test_filter_family_none_matching() {
        let all = addrs(&["192.0.2.1"]);
        assert!(filter_family(all, IpAddrFamily::Ipv6Only).is_empty());
    }

    #[test]
    fn test_reverse_lookup_is_cached() -> anyhow::Result<()> {
        let resolver = DnsResolver::new(Config::default());
        let addr = IpAddr::from_str("192.0.2.1")?;
        let cached = DnsEntry::Resolved(addr, vec![String::from("cached.example")]);
        resolver.cache.write().insert(addr, cached.clone());
        assert_eq!(cached, resolver.reverse_lookup(addr));
        assert_eq!(Some("cached.example"), resolver.reverse_lookup(addr).hostname());
        assert_eq!(1, resolver.cache.read().len());
        Ok(())
    }
}
