use anyhow::{anyhow, Context};
use clap::ValueEnum;
use file::ConfigFile;
use serde::Deserialize;
use tracepath_core::{defaults, AddressMode};
use tracepath_dns::IpAddrFamily;

mod cmd;
mod constants;
mod file;

pub use cmd::Args;

/// The address family.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressFamilyConfig {
    /// Ipv4 only.
    Ipv4,
    /// Ipv6 only.
    Ipv6,
    /// Use the first address returned by the OS resolver.
    System,
}

/// How to show the responder of each hop.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressModeConfig {
    /// Show the hostname only.
    Host,
    /// Show the IP address only.
    Ip,
    /// Show the hostname followed by the IP address.
    HostIp,
    /// Show the IP address followed by the hostname.
    IpHost,
}

impl From<AddressModeConfig> for AddressMode {
    fn from(value: AddressModeConfig) -> Self {
        match value {
            AddressModeConfig::Host => Self::Host,
            AddressModeConfig::Ip => Self::Ip,
            AddressModeConfig::HostIp => Self::HostIp,
            AddressModeConfig::IpHost => Self::IpHost,
        }
    }
}

impl From<AddressMode> for AddressModeConfig {
    fn from(value: AddressMode) -> Self {
        match value {
            AddressMode::Host => Self::Host,
            AddressMode::Ip => Self::Ip,
            AddressMode::HostIp => Self::HostIp,
            AddressMode::IpHost => Self::IpHost,
        }
    }
}

/// How to format log data.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// Display log data in a compact format.
    Compact,
    /// Display log data in a pretty format.
    Pretty,
    /// Display log data in a json format.
    Json,
}

/// How to log event spans.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogSpanEvents {
    /// Do not display event spans.
    Off,
    /// Display enter and exit event spans.
    Active,
    /// Display all event spans.
    Full,
}

/// The action to perform.
#[derive(Debug, Eq, PartialEq)]
pub enum TracepathAction {
    /// Trace the path to the destination.
    Trace(TracepathConfig),
    /// Print the version and exit.
    PrintVersion,
}

impl TracepathAction {
    pub fn from(args: Args) -> anyhow::Result<Self> {
        Ok(if args.version {
            Self::PrintVersion
        } else {
            Self::Trace(TracepathConfig::from(args)?)
        })
    }
}

/// Fully parsed and validated configuration.
#[derive(Debug, Eq, PartialEq)]
pub struct TracepathConfig {
    pub target: String,
    pub port: u16,
    pub addr_family: IpAddrFamily,
    pub packet_len: Option<u32>,
    pub max_hops: u8,
    pub address_mode: AddressMode,
    pub verbose: bool,
    pub log_format: LogFormat,
    pub log_filter: String,
    pub log_span_events: LogSpanEvents,
}

impl TracepathConfig {
    pub fn from(args: Args) -> anyhow::Result<Self> {
        let cfg_file = if let Some(cfg) = &args.config_file {
            file::read_config_file(cfg)?
        } else {
            file::read_default_config_file()?.unwrap_or_default()
        };
        Self::build_config(args, cfg_file)
    }

    fn build_config(args: Args, cfg_file: ConfigFile) -> anyhow::Result<Self> {
        let cfg_file_trace = cfg_file.trace.unwrap_or_default();
        let cfg_file_dns = cfg_file.dns.unwrap_or_default();
        let cfg_file_log = cfg_file.log.unwrap_or_default();
        let destination = args.destination.context("missing destination")?;
        let (target, dest_port) = split_destination(&destination)?;
        let port = cfg_layer(
            args.port.or(dest_port),
            cfg_file_trace.port,
            defaults::DEFAULT_BASE_PORT,
        );
        let addr_family_cfg = if args.ipv4 {
            Some(AddressFamilyConfig::Ipv4)
        } else if args.ipv6 {
            Some(AddressFamilyConfig::Ipv6)
        } else {
            None
        };
        let addr_family = dns_resolve_family(cfg_layer(
            addr_family_cfg,
            cfg_file_trace.addr_family,
            constants::DEFAULT_ADDR_FAMILY,
        ));
        let packet_len = cfg_layer_opt(args.packet_length, cfg_file_trace.packet_length);
        let max_hops = cfg_layer(
            args.max_hops,
            cfg_file_trace.max_hops,
            defaults::DEFAULT_MAX_TTL,
        );
        let address_mode_flags = (args.numeric || args.both)
            .then(|| AddressMode::from_flags(args.numeric, args.both));
        let address_mode = cfg_layer(
            address_mode_flags,
            cfg_file_dns.address_mode.map(AddressMode::from),
            defaults::DEFAULT_ADDRESS_MODE,
        );
        let verbose = cfg_layer_bool_flag(
            args.verbose,
            cfg_file_log.verbose,
            constants::DEFAULT_VERBOSE,
        );
        let log_format = cfg_layer(
            args.log_format,
            cfg_file_log.format,
            constants::DEFAULT_LOG_FORMAT,
        );
        let log_filter = cfg_layer(
            args.log_filter,
            cfg_file_log.filter,
            String::from(constants::DEFAULT_LOG_FILTER),
        );
        let log_span_events = cfg_layer(
            args.log_span_events,
            cfg_file_log.span_events,
            constants::DEFAULT_LOG_SPAN_EVENTS,
        );
        Ok(Self {
            target: String::from(target),
            port,
            addr_family,
            packet_len,
            max_hops,
            address_mode,
            verbose,
            log_format,
            log_filter,
            log_span_events,
        })
    }
}

impl Default for TracepathConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            port: defaults::DEFAULT_BASE_PORT,
            addr_family: dns_resolve_family(constants::DEFAULT_ADDR_FAMILY),
            packet_len: None,
            max_hops: defaults::DEFAULT_MAX_TTL,
            address_mode: defaults::DEFAULT_ADDRESS_MODE,
            verbose: constants::DEFAULT_VERBOSE,
            log_format: constants::DEFAULT_LOG_FORMAT,
            log_filter: String::from(constants::DEFAULT_LOG_FILTER),
            log_span_events: constants::DEFAULT_LOG_SPAN_EVENTS,
        }
    }
}

/// Split a `host/port` destination into the host and the port, if present.
fn split_destination(destination: &str) -> anyhow::Result<(&str, Option<u16>)> {
    match destination.split_once('/') {
        Some((host, port)) => {
            let port = port
                .parse()
                .map_err(|_| anyhow!("invalid port in destination: {destination}"))?;
            Ok((host, Some(port)))
        }
        None => Ok((destination, None)),
    }
}

const fn dns_resolve_family(family: AddressFamilyConfig) -> IpAddrFamily {
    match family {
        AddressFamilyConfig::Ipv4 => IpAddrFamily::Ipv4Only,
        AddressFamilyConfig::Ipv6 => IpAddrFamily::Ipv6Only,
        AddressFamilyConfig::System => IpAddrFamily::System,
    }
}

fn cfg_layer<T>(fst: Option<T>, snd: Option<T>, def: T) -> T {
    match (fst, snd) {
        (Some(val), _) | (None, Some(val)) => val,
        (None, None) => def,
    }
}

fn cfg_layer_opt<T>(fst: Option<T>, snd: Option<T>) -> Option<T> {
    match (fst, snd) {
        (Some(val), _) | (None, Some(val)) => Some(val),
        (None, None) => None,
    }
}

const fn cfg_layer_bool_flag(fst: bool, snd: Option<bool>, default: bool) -> bool {
    match (fst, snd) {
        (true, _) => true,
        (false, Some(val)) => val,
        (false, None) => default,
    }
}
