use crate::error::{IoError, IoOperation, IoResult};
use crate::net::socket::{ErrorQueueMessage, Socket};
use crate::notification::{ErrorCode, ExtendedError, Origin};
use itertools::Itertools;
use nix::errno::Errno;
use nix::libc;
use nix::sys::select::FdSet;
use nix::sys::socket::{ControlMessageOwned, MsgFlags, SockaddrStorage};
use nix::sys::time::{TimeVal, TimeValLike};
use socket2::{Domain, Protocol, SockAddr, Type};
use std::io;
use std::io::IoSliceMut;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::os::fd::{AsFd, AsRawFd};
use std::time::Duration;
use tracing::instrument;

/// A UDP socket with the error queue enabled.
pub struct SocketImpl {
    inner: socket2::Socket,
}

impl SocketImpl {
    fn new(domain: Domain) -> IoResult<Self> {
        Ok(Self {
            inner: socket2::Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))
                .map_err(|err| IoError::Other(err, IoOperation::NewSocket))?,
        })
    }

    /// Set an integer socket option which `socket2` does not expose.
    #[allow(unsafe_code)]
    fn set_int_option(
        &self,
        level: libc::c_int,
        name: libc::c_int,
        value: libc::c_int,
        operation: IoOperation,
    ) -> IoResult<()> {
        // Safety: `value` outlives the call and the length passed is the size of a `c_int`.
        let ret = unsafe {
            libc::setsockopt(
                self.inner.as_raw_fd(),
                level,
                name,
                std::ptr::from_ref(&value).cast(),
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if ret == 0 {
            Ok(())
        } else {
            Err(IoError::Other(io::Error::last_os_error(), operation))
        }
    }
}

impl Socket for SocketImpl {
    #[instrument(level = "trace")]
    fn new_udp_socket_ipv4() -> IoResult<Self> {
        Self::new(Domain::IPV4)
    }
    #[instrument(level = "trace")]
    fn new_udp_socket_ipv6() -> IoResult<Self> {
        Self::new(Domain::IPV6)
    }
    #[instrument(skip(self), level = "trace")]
    fn set_mtu_discover_v4(&mut self) -> IoResult<()> {
        self.set_int_option(
            libc::IPPROTO_IP,
            libc::IP_MTU_DISCOVER,
            libc::IP_PMTUDISC_DO,
            IoOperation::SetMtuDiscover,
        )
    }
    #[instrument(skip(self), level = "trace")]
    fn set_mtu_discover_v6(&mut self) -> IoResult<()> {
        self.set_int_option(
            libc::IPPROTO_IPV6,
            libc::IPV6_MTU_DISCOVER,
            libc::IPV6_PMTUDISC_DO,
            IoOperation::SetMtuDiscoverV6,
        )
    }
    #[instrument(skip(self), level = "trace")]
    fn set_recv_err_v4(&mut self) -> IoResult<()> {
        self.set_int_option(
            libc::IPPROTO_IP,
            libc::IP_RECVERR,
            1,
            IoOperation::SetRecvErr,
        )
    }
    #[instrument(skip(self), level = "trace")]
    fn set_recv_err_v6(&mut self) -> IoResult<()> {
        self.set_int_option(
            libc::IPPROTO_IPV6,
            libc::IPV6_RECVERR,
            1,
            IoOperation::SetRecvErrV6,
        )
    }
    #[instrument(skip(self), level = "trace")]
    fn set_recv_ttl_v4(&mut self) -> IoResult<()> {
        self.set_int_option(
            libc::IPPROTO_IP,
            libc::IP_RECVTTL,
            1,
            IoOperation::SetRecvTtl,
        )
    }
    #[instrument(skip(self), level = "trace")]
    fn set_recv_hop_limit_v6(&mut self) -> IoResult<()> {
        self.set_int_option(
            libc::IPPROTO_IPV6,
            libc::IPV6_RECVHOPLIMIT,
            1,
            IoOperation::SetRecvHopLimitV6,
        )
    }
    #[instrument(skip(self), level = "trace")]
    fn set_ttl(&mut self, ttl: u32) -> IoResult<()> {
        self.inner
            .set_ttl_v4(ttl)
            .map_err(|err| IoError::Other(err, IoOperation::SetTtl))
    }
    #[instrument(skip(self), level = "trace")]
    fn set_unicast_hops_v6(&mut self, hops: u8) -> IoResult<()> {
        self.inner
            .set_unicast_hops_v6(u32::from(hops))
            .map_err(|err| IoError::Other(err, IoOperation::SetUnicastHopsV6))
    }
    #[instrument(skip(self, buf), level = "trace")]
    fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> IoResult<()> {
        tracing::trace!(
            buf = format!("{:02x?}", buf.iter().take(32).format(" ")),
            len = buf.len(),
            ?addr
        );
        self.inner
            .send_to(buf, &SockAddr::from(addr))
            .map_err(|err| IoError::SendTo(err, addr))?;
        Ok(())
    }
    #[instrument(skip(self), level = "trace")]
    fn is_readable(&mut self, timeout: Duration) -> IoResult<bool> {
        let mut read = FdSet::new();
        read.insert(self.inner.as_fd());
        let readable = nix::sys::select::select(
            None,
            Some(&mut read),
            None,
            None,
            Some(&mut TimeVal::milliseconds(timeout.as_millis() as i64)),
        );
        match readable {
            Ok(readable) => Ok(readable == 1),
            Err(Errno::EINTR) => Ok(false),
            Err(err) => Err(IoError::Other(io::Error::from(err), IoOperation::Select)),
        }
    }
    #[instrument(skip(self, buf), level = "trace")]
    fn recv(&mut self, buf: &mut [u8]) -> IoResult<Option<usize>> {
        loop {
            match nix::sys::socket::recv(self.inner.as_raw_fd(), buf, MsgFlags::MSG_DONTWAIT) {
                Ok(bytes_read) => {
                    tracing::trace!(bytes_read);
                    return Ok(Some(bytes_read));
                }
                Err(Errno::EAGAIN) => return Ok(None),
                Err(Errno::EINTR) => {}
                Err(err) => return Err(IoError::Other(io::Error::from(err), IoOperation::Recv)),
            }
        }
    }
    #[instrument(skip(self, buf), level = "trace")]
    fn recv_err(&mut self, buf: &mut [u8]) -> IoResult<Option<ErrorQueueMessage>> {
        let mut cmsg_buffer = nix::cmsg_space!(
            libc::sock_extended_err,
            libc::sockaddr_in6,
            libc::c_int
        );
        loop {
            let mut iov = [IoSliceMut::new(buf)];
            let msg = match nix::sys::socket::recvmsg::<SockaddrStorage>(
                self.inner.as_raw_fd(),
                &mut iov,
                Some(&mut cmsg_buffer),
                MsgFlags::MSG_ERRQUEUE | MsgFlags::MSG_DONTWAIT,
            ) {
                Ok(msg) => msg,
                Err(Errno::EAGAIN) => return Ok(None),
                Err(Errno::EINTR) => continue,
                Err(err) => {
                    return Err(IoError::Other(io::Error::from(err), IoOperation::RecvErr))
                }
            };
            let dest_port = msg.address.as_ref().and_then(port_of);
            let cmsgs = msg
                .cmsgs()
                .map_err(|err| IoError::Other(io::Error::from(err), IoOperation::RecvErr))?;
            let (error, recv_ttl) = decode_cmsgs(cmsgs);
            let message = ErrorQueueMessage {
                bytes_read: msg.bytes,
                dest_port,
                error,
                recv_ttl,
            };
            tracing::trace!(?message);
            return Ok(Some(message));
        }
    }
}

/// Extract the extended error and the received ttl or hop limit from the ancillary data.
fn decode_cmsgs(
    cmsgs: impl IntoIterator<Item = ControlMessageOwned>,
) -> (Option<ExtendedError>, Option<u8>) {
    let mut error = None;
    let mut recv_ttl = None;
    for cmsg in cmsgs {
        match cmsg {
            ControlMessageOwned::Ipv4RecvErr(err, offender) => {
                let offender = offender
                    .map(|addr| IpAddr::V4(Ipv4Addr::from(u32::from_be(addr.sin_addr.s_addr))));
                error = Some(extended_error(&err, offender));
            }
            ControlMessageOwned::Ipv6RecvErr(err, offender) => {
                let offender = offender.map(|addr| {
                    let addr = Ipv6Addr::from(addr.sin6_addr.s6_addr);
                    addr.to_ipv4_mapped()
                        .map_or(IpAddr::V6(addr), IpAddr::V4)
                });
                error = Some(extended_error(&err, offender));
            }
            ControlMessageOwned::Ipv4Ttl(ttl) | ControlMessageOwned::Ipv6HopLimit(ttl) => {
                recv_ttl = u8::try_from(ttl).ok();
            }
            other => tracing::debug!(?other, "ignoring unexpected control message"),
        }
    }
    (error, recv_ttl)
}

fn port_of(addr: &SockaddrStorage) -> Option<u16> {
    addr.as_sockaddr_in()
        .map(nix::sys::socket::SockaddrIn::port)
        .or_else(|| addr.as_sockaddr_in6().map(nix::sys::socket::SockaddrIn6::port))
}

fn extended_error(err: &libc::sock_extended_err, offender: Option<IpAddr>) -> ExtendedError {
    let origin = match err.ee_origin {
        libc::SO_EE_ORIGIN_LOCAL => Origin::Local,
        libc::SO_EE_ORIGIN_ICMP => Origin::Icmp,
        libc::SO_EE_ORIGIN_ICMP6 => Origin::Icmp6,
        other => Origin::Other(other),
    };
    ExtendedError {
        origin,
        code: error_code(err.ee_errno as i32),
        icmp_type: err.ee_type,
        icmp_code: err.ee_code,
        info: err.ee_info,
        offender,
    }
}

fn error_code(errno: i32) -> ErrorCode {
    match Errno::from_raw(errno) {
        Errno::ETIMEDOUT => ErrorCode::TimedOut,
        Errno::EMSGSIZE => ErrorCode::MessageTooBig,
        Errno::ECONNREFUSED => ErrorCode::ConnectionRefused,
        Errno::EPROTO => ErrorCode::Protocol,
        Errno::EHOSTUNREACH => ErrorCode::HostUnreachable,
        Errno::ENETUNREACH => ErrorCode::NetUnreachable,
        Errno::EACCES => ErrorCode::AccessDenied,
        _ => ErrorCode::Other(errno),
    }
}
