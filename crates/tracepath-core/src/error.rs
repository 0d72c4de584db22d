use std::fmt::{Display, Formatter};
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// A tracer error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A tracer error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("pktlen must be > {overhead} and <= {max}")]
    InvalidPacketLength { len: u32, overhead: u32, max: u32 },
    #[error("IO error: {0}")]
    IoError(#[from] IoError),
    #[error("Probe failed to send: {0}")]
    ProbeFailed(IoError),
    #[error("failed to allocate a probe buffer of {0} bytes")]
    Allocation(usize),
}

/// Custom IO error result.
pub type IoResult<T> = std::result::Result<T, IoError>;

/// Custom IO error.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Sendto error for {1}: {0}")]
    SendTo(io::Error, SocketAddr),
    #[error("Failed to {0}: {1}")]
    Other(io::Error, IoOperation),
}

/// Io operation.
#[derive(Debug)]
pub enum IoOperation {
    NewSocket,
    Select,
    Recv,
    RecvErr,
    SetTtl,
    SetUnicastHopsV6,
    SetMtuDiscover,
    SetMtuDiscoverV6,
    SetRecvErr,
    SetRecvErrV6,
    SetRecvTtl,
    SetRecvHopLimitV6,
}

impl Display for IoOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewSocket => write!(f, "create new socket"),
            Self::Select => write!(f, "select"),
            Self::Recv => write!(f, "recv"),
            Self::RecvErr => write!(f, "recv from error queue"),
            Self::SetTtl => write!(f, "set TTL"),
            Self::SetUnicastHopsV6 => write!(f, "set unicast hops v6"),
            Self::SetMtuDiscover => write!(f, "set IP_MTU_DISCOVER"),
            Self::SetMtuDiscoverV6 => write!(f, "set IPV6_MTU_DISCOVER"),
            Self::SetRecvErr => write!(f, "set IP_RECVERR"),
            Self::SetRecvErrV6 => write!(f, "set IPV6_RECVERR"),
            Self::SetRecvTtl => write!(f, "set IP_RECVTTL"),
            Self::SetRecvHopLimitV6 => write!(f, "set IPV6_RECVHOPLIMIT"),
        }
    }
}
