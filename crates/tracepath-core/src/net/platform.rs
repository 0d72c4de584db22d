#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
pub use linux::SocketImpl;

#[cfg(not(target_os = "linux"))]
compile_error!("tracepath requires the Linux socket error queue (IP_RECVERR / IPV6_RECVERR)");
