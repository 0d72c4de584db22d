use std::net::IpAddr;
use thiserror::Error;

/// A DNS resolver.
pub trait Resolver {
    /// Perform a blocking DNS hostname lookup and return the resolved IPv4 or IPv6 addresses.
    fn lookup(&self, hostname: impl AsRef<str>) -> Result<ResolvedIpAddrs>;

    /// Perform a blocking reverse DNS lookup of `IpAddr` and return a `DnsEntry`.
    #[must_use]
    fn reverse_lookup(&self, addr: impl Into<IpAddr>) -> DnsEntry;
}

/// A DNS resolver error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A DNS resolver error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("DNS lookup failed: {0}")]
    LookupFailed(Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// The output of a successful DNS lookup.
#[derive(Debug, Clone)]
pub struct ResolvedIpAddrs(pub(super) Vec<IpAddr>);

impl IntoIterator for ResolvedIpAddrs {
    type Item = IpAddr;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// The state of reverse DNS resolution.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DnsEntry {
    /// The reverse DNS resolution of `IpAddr` has resolved.
    Resolved(IpAddr, Vec<String>),
    /// The `IpAddr` could not be resolved.
    NotFound(IpAddr),
}

impl DnsEntry {
    /// The resolved hostnames.
    pub fn hostnames(&self) -> impl Iterator<Item = &'_ str> {
        let hosts = match self {
            Self::Resolved(_, hosts) => hosts.as_slice(),
            Self::NotFound(_) => &[],
        };
        hosts.iter().map(String::as_str)
    }

    /// The first resolved hostname, if any.
    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.hostnames().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_iterator_returns_each_hostname_once() {
        let entry = DnsEntry::Resolved(
            IpAddr::from_str("192.0.2.1").unwrap(),
            vec!["one".to_string(), "two".to_string(), "three".to_string()],
        );
        let mut iter = entry.hostnames();
        assert_eq!(iter.next(), Some("one"));
        assert_eq!(iter.next(), Some("two"));
        assert_eq!(iter.next(), Some("three"));
        assert_eq!(iter.next(), None);
        assert_eq!(Some("one"), entry.hostname());
    }

    #[test]
    fn test_not_found() {
        let entry = DnsEntry::NotFound(IpAddr::from_str("192.0.2.1").unwrap());
        assert_eq!(None, entry.hostname());
        assert_eq!(None, entry.hostnames().next());
    }
}
