use std::fmt::Write;
use std::io;
use std::net::IpAddr;
use std::time::Duration;
use tracepath_core::{
    AddressMode, Completion, Event, Hop, HopStatus, Responder, Summary, UNRESOLVED_HOST,
};

/// The width of the responder column.
const HOST_COLUMN_SIZE: usize = 52;

/// The width of the responder column for notifications raised locally.
const LOCAL_COLUMN_SIZE: usize = 32;

/// Print a line for an event as it happens.
///
/// Unexpected network errors are also reported on stderr.
pub fn print_event(event: &Event, address_mode: AddressMode) {
    println!("{}", format_event(event, address_mode));
    if let Event::Hop(Hop {
        status: HopStatus::NetError(errno),
        ..
    }) = event
    {
        eprintln!("NET ERROR: {}", io::Error::from_raw_os_error(*errno));
    }
}

/// Print the final summary of the path.
pub fn print_summary(summary: &Summary) {
    print!("{}", format_summary(summary));
}

fn format_event(event: &Event, address_mode: AddressMode) -> String {
    match event {
        Event::Hop(hop) => format_hop(hop, address_mode),
        Event::NoInfo => String::from("no info"),
        Event::ReplyReceived { ttl } => format!("{:2}?: reply received 8)", ttl.0),
        Event::SendFailed { ttl } => format!("{:2}:  send failed", ttl.0),
        Event::NoReply { ttl } => format!("{:2}:  no reply", ttl.0),
    }
}

fn format_hop(hop: &Hop, address_mode: AddressMode) -> String {
    let mut line = String::new();
    match &hop.responder {
        Responder::Local => {
            let _ = write!(
                line,
                "{:2}?: {:<width$} ",
                hop.ttl.0,
                "[LOCALHOST]",
                width = LOCAL_COLUMN_SIZE
            );
        }
        Responder::Remote { addr, hostname } => {
            line.push_str(&format_hop_number(hop));
            line.push_str(&format_host(*addr, hostname.as_deref(), address_mode));
        }
        Responder::Unknown => {
            line.push_str(&format_hop_number(hop));
        }
    }
    if let Some(rtt) = hop.rtt {
        line.push_str(&format_rtt(rtt));
        if hop.broken_router {
            line.push_str("(This broken router returned corrupted payload) ");
        }
    }
    match hop.status {
        HopStatus::Hop {
            asymmetry: Some(hops),
        } => {
            let _ = write!(line, "asymm {:2} ", hops.0);
        }
        HopStatus::Hop { asymmetry: None } | HopStatus::NetError(_) => {}
        HopStatus::PathMtu(mtu) => {
            let _ = write!(line, "pmtu {mtu}");
        }
        HopStatus::Reached => line.push_str("reached"),
        HopStatus::ProtocolError => line.push_str("!P"),
        HopStatus::HostUnreachable => line.push_str("!H"),
        HopStatus::NetUnreachable => line.push_str("!N"),
        HopStatus::AccessDenied => line.push_str("!A"),
    }
    line
}

/// A confirmed hop number is followed by a space, an unconfirmed one by `?`.
fn format_hop_number(hop: &Hop) -> String {
    match hop.confirmed_hop {
        Some(confirmed) => format!("{:2}:  ", confirmed.0),
        None => format!("{:2}?: ", hop.ttl.0),
    }
}

/// Format the responder in a fixed width column.
fn format_host(
    addr: Option<IpAddr>,
    hostname: Option<&str>,
    address_mode: AddressMode,
) -> String {
    let ip = addr.map_or_else(|| String::from(UNRESOLVED_HOST), |addr| addr.to_string());
    let name = hostname.unwrap_or(UNRESOLVED_HOST);
    let host = match address_mode {
        AddressMode::Host => String::from(name),
        AddressMode::Ip => ip,
        AddressMode::HostIp => format!("{name} ({ip})"),
        AddressMode::IpHost => format!("{ip} ({name})"),
    };
    let len = host.chars().count().min(HOST_COLUMN_SIZE - 1);
    format!("{host}{:pad$}", "", pad = HOST_COLUMN_SIZE - len)
}

fn format_rtt(rtt: Duration) -> String {
    let micros = rtt.as_micros();
    format!("{:3}.{:03}ms ", micros / 1000, micros % 1000)
}

fn format_summary(summary: &Summary) -> String {
    let mut out = String::new();
    if summary.completion == Completion::TooManyHops {
        let _ = writeln!(out, "     Too many hops: pmtu {}", summary.pmtu);
    }
    let _ = write!(out, "     Resume: pmtu {} ", summary.pmtu);
    if let Some(hops_to) = summary.hops_to {
        let _ = write!(out, "hops {hops_to} ");
    }
    if let Some(hops_from) = summary.hops_from {
        let _ = write!(out, "back {hops_from} ");
    }
    out.push('\n');
    out
}
