use crate::config::{LogFormat, LogSpanEvents};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::ffi::OsStr;
use std::path::Path;

/// Discover the path MTU and the latency of each hop toward a destination
#[derive(Parser, Debug)]
#[command(name = "tracepath", author, about, long_about = None, disable_version_flag = true, arg_required_else_help(true))]
pub struct Args {
    /// The hostname or IP to trace, optionally followed by `/port`
    #[arg(required_unless_present = "version")]
    pub destination: Option<String>,

    /// Config file
    #[arg(short = 'c', long, value_hint = clap::ValueHint::FilePath)]
    pub config_file: Option<String>,

    /// Use IPv4 only
    #[arg(short = '4')]
    pub ipv4: bool,

    /// Use IPv6 only
    #[arg(short = '6')]
    pub ipv6: bool,

    /// Print addresses numerically
    #[arg(short = 'n', long)]
    pub numeric: bool,

    /// Print both hostnames and IP addresses
    #[arg(short = 'b', long)]
    pub both: bool,

    /// The probe packet length [default: 65535 (IPv4) or 128000 (IPv6)]
    #[arg(short = 'l', long)]
    pub packet_length: Option<u32>,

    /// The maximum number of hops [default: 30]
    #[arg(short = 'm', long)]
    pub max_hops: Option<u8>,

    /// The destination port of the first probe [default: 44444]
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Print version and exit
    #[arg(short = 'V', long)]
    pub version: bool,

    /// The debug log format [default: pretty]
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// The debug log filter [default: tracepath=debug]
    #[arg(long)]
    pub log_filter: Option<String>,

    /// The debug log span events [default: off]
    #[arg(long)]
    pub log_span_events: Option<LogSpanEvents>,

    /// Enable verbose debug logging
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Apply the address family implied by the name the program was invoked with.
    ///
    /// A program name ending in `4` or `6` (such as `tracepath6`) selects that family, as though
    /// `-4` or `-6` had been given.
    pub fn with_program_name(self, program: Option<&OsStr>) -> Result<Self, clap::Error> {
        let (ipv4, ipv6) = match program_family(program) {
            Some(ProgramFamily::V4) => (true, self.ipv6),
            Some(ProgramFamily::V6) => (self.ipv4, true),
            None => (self.ipv4, self.ipv6),
        };
        if ipv4 && ipv6 {
            return Err(Self::command().error(
                ErrorKind::ArgumentConflict,
                "Only one -4 or -6 option may be specified",
            ));
        }
        Ok(Self { ipv4, ipv6, ..self })
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum ProgramFamily {
    V4,
    V6,
}

fn program_family(program: Option<&OsStr>) -> Option<ProgramFamily> {
    let name = Path::new(program?).file_name()?.to_str()?;
    match name.chars().last()? {
        '4' => Some(ProgramFamily::V4),
        '6' => Some(ProgramFamily::V6),
        _ => None,
    }
}
