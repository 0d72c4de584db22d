use crate::error::IoResult as Result;
use crate::notification::ExtendedError;
use std::net::SocketAddr;
use std::time::Duration;

#[cfg_attr(test, mockall::automock)]
pub trait Socket
where
    Self: Sized,
{
    /// Create an IPv4 socket for sending UDP probes.
    fn new_udp_socket_ipv4() -> Result<Self>;
    /// Create an IPv6 socket for sending UDP probes.
    fn new_udp_socket_ipv6() -> Result<Self>;
    /// Always set the don't fragment bit and never fragment locally.
    fn set_mtu_discover_v4(&mut self) -> Result<()>;
    /// Never fragment locally.
    fn set_mtu_discover_v6(&mut self) -> Result<()>;
    fn set_recv_err_v4(&mut self) -> Result<()>;
    fn set_recv_err_v6(&mut self) -> Result<()>;
    fn set_recv_ttl_v4(&mut self) -> Result<()>;
    fn set_recv_hop_limit_v6(&mut self) -> Result<()>;
    fn set_ttl(&mut self, ttl: u32) -> Result<()>;
    fn set_unicast_hops_v6(&mut self, hops: u8) -> Result<()>;
    fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> Result<()>;
    /// Returns true if the socket becomes readable before the timeout, false otherwise.
    fn is_readable(&mut self, timeout: Duration) -> Result<bool>;
    /// Read a datagram without blocking, returns `None` if none is available.
    fn recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>>;
    /// Read a message from the error queue without blocking, returns `None` if it is empty.
    fn recv_err(&mut self, buf: &mut [u8]) -> Result<Option<ErrorQueueMessage>>;
}

/// A message read from the error queue by `Socket::recv_err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorQueueMessage {
    /// The number of payload bytes read into the buffer.
    pub bytes_read: usize,
    /// The original destination port of the datagram.
    pub dest_port: Option<u16>,
    pub error: Option<ExtendedError>,
    pub recv_ttl: Option<u8>,
}
