use crate::config::{ChannelConfig, Family};
use crate::error::{Error, Result};
use crate::net::socket::Socket;
use crate::net::Network;
use crate::notification::Notification;
use crate::payload::HEADER_LEN;
use crate::types::{Port, TimeToLive};
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, SystemTime};
use tracing::instrument;

/// The size of the buffer used to read replies from the destination.
const MAX_REPLY_SIZE: usize = 1024;

/// A channel for sending probes and reading the notifications they provoke.
pub struct Channel<S: Socket> {
    socket: S,
    target_addr: IpAddr,
    family: Family,
    reply_buf: [u8; MAX_REPLY_SIZE],
}

impl<S: Socket> Channel<S> {
    /// Create a `Channel`.
    ///
    /// The socket is configured to forbid fragmentation and to queue extended errors, along with
    /// the hop limit of the packet that carried them, for later reading.
    #[instrument(skip_all, level = "trace")]
    pub fn connect(config: &ChannelConfig) -> Result<Self> {
        tracing::debug!(?config);
        let socket = match config.family {
            Family::V4 => make_ipv4_socket::<S>()?,
            Family::V6 { mapped } => make_ipv6_socket::<S>(mapped)?,
        };
        Ok(Self {
            socket,
            target_addr: config.target_addr,
            family: config.family,
            reply_buf: [0; MAX_REPLY_SIZE],
        })
    }
}

impl<S: Socket> Network for Channel<S> {
    #[instrument(skip(self), level = "trace")]
    fn set_ttl(&mut self, ttl: TimeToLive) -> Result<()> {
        match self.family {
            Family::V4 => self.socket.set_ttl(u32::from(ttl.0))?,
            Family::V6 { mapped } => {
                self.socket.set_unicast_hops_v6(ttl.0)?;
                if mapped {
                    self.socket.set_ttl(u32::from(ttl.0))?;
                }
            }
        }
        Ok(())
    }

    #[instrument(skip(self, payload), level = "trace")]
    fn send_probe(&mut self, payload: &[u8], port: Port) -> Result<()> {
        let addr = SocketAddr::new(self.target_addr, port.0);
        self.socket
            .send_to(payload, addr)
            .map_err(Error::ProbeFailed)
    }

    #[instrument(skip(self), level = "trace")]
    fn wait_readable(&mut self, timeout: Duration) -> Result<bool> {
        Ok(self.socket.is_readable(timeout)?)
    }

    #[instrument(skip(self), level = "trace")]
    fn recv_reply(&mut self) -> Result<Option<usize>> {
        match self.socket.recv(&mut self.reply_buf) {
            Ok(Some(bytes_read)) if bytes_read > 0 => Ok(Some(bytes_read)),
            Ok(_) => Ok(None),
            Err(err) => {
                tracing::debug!(%err, "no reply available");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self), level = "trace")]
    fn recv_notification(&mut self) -> Result<Option<Notification>> {
        let mut buf = [0_u8; HEADER_LEN];
        let Some(message) = self.socket.recv_err(&mut buf)? else {
            return Ok(None);
        };
        let notification = Notification {
            received: SystemTime::now(),
            dest_port: message.dest_port.map(Port),
            payload: buf[..message.bytes_read.min(HEADER_LEN)].to_vec(),
            error: message.error,
            recv_ttl: message.recv_ttl,
        };
        tracing::debug!(?notification);
        Ok(Some(notification))
    }
}

fn make_ipv4_socket<S: Socket>() -> Result<S> {
    let mut socket = S::new_udp_socket_ipv4()?;
    configure_ipv4(&mut socket)?;
    Ok(socket)
}

fn make_ipv6_socket<S: Socket>(mapped: bool) -> Result<S> {
    let mut socket = S::new_udp_socket_ipv6()?;
    socket.set_mtu_discover_v6()?;
    socket.set_recv_err_v6()?;
    socket.set_recv_hop_limit_v6()?;
    if mapped {
        configure_ipv4(&mut socket)?;
    }
    Ok(socket)
}

fn configure_ipv4<S: Socket>(socket: &mut S) -> Result<()> {
    socket.set_mtu_discover_v4()?;
    socket.set_recv_err_v4()?;
    socket.set_recv_ttl_v4()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IoError, IoOperation};
    use crate::net::socket::{ErrorQueueMessage, MockSocket};
    use crate::notification::{ErrorCode, ExtendedError, Origin};
    use mockall::predicate;
    use std::str::FromStr;
    use std::sync::Mutex;

    static MTX: Mutex<()> = Mutex::new(());

    fn ipv4_mocket() -> MockSocket {
        let mut mocket = MockSocket::new();
        mocket
            .expect_set_mtu_discover_v4()
            .times(1)
            .returning(|| Ok(()));
        mocket.expect_set_recv_err_v4().times(1).returning(|| Ok(()));
        mocket.expect_set_recv_ttl_v4().times(1).returning(|| Ok(()));
        mocket
    }

    #[test]
    fn test_connect_ipv4() -> anyhow::Result<()> {
        let _m = MTX.lock();
        let ctx = MockSocket::new_udp_socket_ipv4_context();
        ctx.expect().times(1).returning(|| {
            let mut mocket = ipv4_mocket();
            mocket
                .expect_set_ttl()
                .with(predicate::eq(7))
                .times(1)
                .returning(|_| Ok(()));
            Ok(mocket)
        });
        let config = ChannelConfig::new(IpAddr::from_str("192.0.2.1")?);
        let mut channel = Channel::<MockSocket>::connect(&config)?;
        channel.set_ttl(TimeToLive(7))?;
        Ok(())
    }

    #[test]
    fn test_connect_ipv6() -> anyhow::Result<()> {
        let _m = MTX.lock();
        let ctx = MockSocket::new_udp_socket_ipv6_context();
        ctx.expect().times(1).returning(|| {
            let mut mocket = MockSocket::new();
            mocket
                .expect_set_mtu_discover_v6()
                .times(1)
                .returning(|| Ok(()));
            mocket.expect_set_recv_err_v6().times(1).returning(|| Ok(()));
            mocket
                .expect_set_recv_hop_limit_v6()
                .times(1)
                .returning(|| Ok(()));
            mocket.expect_set_mtu_discover_v4().never();
            mocket
                .expect_set_unicast_hops_v6()
                .with(predicate::eq(3))
                .times(1)
                .returning(|_| Ok(()));
            mocket.expect_set_ttl().never();
            Ok(mocket)
        });
        let config = ChannelConfig::new(IpAddr::from_str("2001:db8::1")?);
        let mut channel = Channel::<MockSocket>::connect(&config)?;
        channel.set_ttl(TimeToLive(3))?;
        Ok(())
    }

    #[test]
    fn test_connect_ipv4_mapped_sets_both_families() -> anyhow::Result<()> {
        let _m = MTX.lock();
        let ctx = MockSocket::new_udp_socket_ipv6_context();
        ctx.expect().times(1).returning(|| {
            let mut mocket = ipv4_mocket();
            mocket
                .expect_set_mtu_discover_v6()
                .times(1)
                .returning(|| Ok(()));
            mocket.expect_set_recv_err_v6().times(1).returning(|| Ok(()));
            mocket
                .expect_set_recv_hop_limit_v6()
                .times(1)
                .returning(|| Ok(()));
            mocket
                .expect_set_unicast_hops_v6()
                .with(predicate::eq(12))
                .times(1)
                .returning(|_| Ok(()));
            mocket
                .expect_set_ttl()
                .with(predicate::eq(12))
                .times(1)
                .returning(|_| Ok(()));
            Ok(mocket)
        });
        let config = ChannelConfig::new(IpAddr::from_str("::ffff:192.0.2.1")?);
        let mut channel = Channel::<MockSocket>::connect(&config)?;
        channel.set_ttl(TimeToLive(12))?;
        Ok(())
    }

    #[test]
    fn test_connect_fails_when_error_queue_unavailable() {
        let _m = MTX.lock();
        let ctx = MockSocket::new_udp_socket_ipv4_context();
        ctx.expect().times(1).returning(|| {
            let mut mocket = MockSocket::new();
            mocket
                .expect_set_mtu_discover_v4()
                .times(1)
                .returning(|| Ok(()));
            mocket.expect_set_recv_err_v4().times(1).returning(|| {
                Err(IoError::Other(
                    std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                    IoOperation::SetRecvErr,
                ))
            });
            Ok(mocket)
        });
        let config = ChannelConfig::new(IpAddr::from_str("192.0.2.1").unwrap());
        let err = Channel::<MockSocket>::connect(&config).err().unwrap();
        assert!(matches!(
            err,
            Error::IoError(IoError::Other(_, IoOperation::SetRecvErr))
        ));
    }

    #[test]
    fn test_send_probe_failure_is_probe_failed() -> anyhow::Result<()> {
        let _m = MTX.lock();
        let ctx = MockSocket::new_udp_socket_ipv4_context();
        ctx.expect().times(1).returning(|| {
            let mut mocket = ipv4_mocket();
            mocket
                .expect_send_to()
                .withf(|buf, addr| {
                    buf.len() == 100 && *addr == SocketAddr::from_str("192.0.2.1:44450").unwrap()
                })
                .times(1)
                .returning(|_, addr| {
                    Err(IoError::SendTo(std::io::Error::from_raw_os_error(90), addr))
                });
            Ok(mocket)
        });
        let config = ChannelConfig::new(IpAddr::from_str("192.0.2.1")?);
        let mut channel = Channel::<MockSocket>::connect(&config)?;
        let err = channel.send_probe(&[0; 100], Port(44450)).unwrap_err();
        assert!(matches!(err, Error::ProbeFailed(IoError::SendTo(_, _))));
        Ok(())
    }

    #[test]
    fn test_recv_notification() -> anyhow::Result<()> {
        let _m = MTX.lock();
        let error = ExtendedError {
            origin: Origin::Icmp,
            code: ErrorCode::HostUnreachable,
            icmp_type: 11,
            icmp_code: 0,
            info: 0,
            offender: Some(IpAddr::from_str("10.0.0.1")?),
        };
        let ctx = MockSocket::new_udp_socket_ipv4_context();
        ctx.expect().times(1).returning(move || {
            let mut mocket = ipv4_mocket();
            let mut seq = mockall::Sequence::new();
            mocket
                .expect_recv_err()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |buf| {
                    buf[..HEADER_LEN].copy_from_slice(&[0xaa; HEADER_LEN]);
                    Ok(Some(ErrorQueueMessage {
                        bytes_read: HEADER_LEN,
                        dest_port: Some(44445),
                        error: Some(error),
                        recv_ttl: Some(254),
                    }))
                });
            mocket
                .expect_recv_err()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(None));
            Ok(mocket)
        });
        let config = ChannelConfig::new(IpAddr::from_str("192.0.2.1")?);
        let mut channel = Channel::<MockSocket>::connect(&config)?;
        let notification = channel.recv_notification()?.unwrap();
        assert_eq!(Some(Port(44445)), notification.dest_port);
        assert_eq!(vec![0xaa; HEADER_LEN], notification.payload);
        assert_eq!(Some(error), notification.error);
        assert_eq!(Some(254), notification.recv_ttl);
        assert!(channel.recv_notification()?.is_none());
        Ok(())
    }

    #[test]
    fn test_recv_reply_ignores_pending_socket_error() -> anyhow::Result<()> {
        let _m = MTX.lock();
        let ctx = MockSocket::new_udp_socket_ipv4_context();
        ctx.expect().times(1).returning(|| {
            let mut mocket = ipv4_mocket();
            mocket.expect_recv().times(1).returning(|_| {
                Err(IoError::Other(
                    std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
                    IoOperation::Recv,
                ))
            });
            Ok(mocket)
        });
        let config = ChannelConfig::new(IpAddr::from_str("192.0.2.1")?);
        let mut channel = Channel::<MockSocket>::connect(&config)?;
        assert_eq!(None, channel.recv_reply()?);
        Ok(())
    }
}
