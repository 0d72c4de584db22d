use crate::config::{LogFormat, LogSpanEvents, TracepathConfig};
use crate::report;
use anyhow::anyhow;
use std::net::IpAddr;
use tracepath_core::{Builder, HostResolver, PacketLen, Port, TimeToLive};
use tracepath_dns::{DnsResolver, Resolver};
use tracing_subscriber::fmt::format::FmtSpan;

/// Run the tracepath application.
pub fn run_tracepath(cfg: &TracepathConfig) -> anyhow::Result<()> {
    configure_logging(cfg);
    let resolver = start_dns_resolver(cfg);
    let addr = resolve_target(cfg, &resolver)?;
    let tracer = Builder::new(addr)
        .packet_len(cfg.packet_len.map(PacketLen))
        .base_port(Port(cfg.port))
        .max_ttl(TimeToLive(cfg.max_hops))
        .address_mode(cfg.address_mode)
        .build()?;
    tracing::debug!(
        host = %cfg.target,
        addr = %tracer.target_addr(),
        family = %tracer.family(),
        mtu = %tracer.mtu(),
        port = %tracer.base_port(),
        "starting tracer"
    );
    let summary = tracer.run_with(&DnsHostResolver(&resolver), |event| {
        report::print_event(event, cfg.address_mode);
    })?;
    report::print_summary(&summary);
    Ok(())
}

/// Resolve responder hostnames with the cached system resolver.
struct DnsHostResolver<'a>(&'a DnsResolver);

impl HostResolver for DnsHostResolver<'_> {
    fn resolve(&self, addr: IpAddr) -> Option<String> {
        self.0.reverse_lookup(addr).hostname().map(String::from)
    }
}

/// Resolve the target to the first address of the configured family.
fn resolve_target(cfg: &TracepathConfig, resolver: &DnsResolver) -> anyhow::Result<IpAddr> {
    let addrs = resolver
        .lookup(&cfg.target)
        .map_err(|e| anyhow!("failed to resolve target: {} ({})", cfg.target, e))?;
    addrs.into_iter().next().ok_or_else(|| {
        anyhow!(
            "failed to find any valid IP addresses for {} for address family {}",
            cfg.target,
            cfg.addr_family,
        )
    })
}

/// Start the DNS resolver.
fn start_dns_resolver(cfg: &TracepathConfig) -> DnsResolver {
    DnsResolver::new(tracepath_dns::Config::new(cfg.addr_family))
}

/// Install the debug log subscriber, if enabled.
///
/// Logs are written to stderr.
fn configure_logging(cfg: &TracepathConfig) {
    if cfg.verbose {
        let fmt_span = match cfg.log_span_events {
            LogSpanEvents::Off => FmtSpan::NONE,
            LogSpanEvents::Active => FmtSpan::ACTIVE,
            LogSpanEvents::Full => FmtSpan::FULL,
        };
        match cfg.log_format {
            LogFormat::Compact => {
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .compact()
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .pretty()
                    .init();
            }
            LogFormat::Json => {
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .json()
                    .init();
            }
        }
    }
}
