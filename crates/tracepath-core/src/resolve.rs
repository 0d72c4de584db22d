use std::net::IpAddr;

/// Resolve the names of responding hosts.
#[cfg_attr(test, mockall::automock)]
pub trait HostResolver {
    /// The hostname of `addr`, or `None` if it could not be resolved.
    fn resolve(&self, addr: IpAddr) -> Option<String>;
}

/// A resolver which never resolves anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl HostResolver for NoResolver {
    fn resolve(&self, _addr: IpAddr) -> Option<String> {
        None
    }
}
