use crate::config::{AddressFamilyConfig, AddressModeConfig, LogFormat, LogSpanEvents};
use anyhow::Context;
use etcetera::BaseStrategy;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracepath_core::defaults;

const DEFAULT_CONFIG_FILE: &str = "tracepath.toml";
const DEFAULT_HIDDEN_CONFIG_FILE: &str = ".tracepath.toml";

/// Read the config from the default location of user config for the platform.
///
/// Returns the parsed `Some(ConfigFile)` if the config file exists, `None` otherwise.
///
/// Tracepath will attempt to locate a `tracepath.toml` or `.tracepath.toml`
/// config file in one of the following locations:
///     - the current directory
///     - the user home directory
///     - the XDG config directory: `$XDG_CONFIG_HOME` or `~/.config`
///     - the XDG app config directory: `$XDG_CONFIG_HOME/tracepath` or `~/.config/tracepath`
///
/// Note that only the first config file found is used, no attempt is
/// made to merge the values from multiple files.
pub fn read_default_config_file() -> anyhow::Result<Option<ConfigFile>> {
    use etcetera::base_strategy as base;
    if let Some(file) = read_files("")? {
        Ok(Some(file))
    } else {
        let basedirs = base::choose_base_strategy()?;
        if let Some(file) = read_files(basedirs.home_dir())? {
            Ok(Some(file))
        } else if let Some(file) = read_files(basedirs.config_dir())? {
            Ok(Some(file))
        } else if let Some(file) = read_files(basedirs.config_dir().join("tracepath"))? {
            Ok(Some(file))
        } else {
            Ok(None)
        }
    }
}

/// Read the config from the given path.
pub fn read_config_file<P: AsRef<Path>>(path: P) -> anyhow::Result<ConfigFile> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("config file not found: {}", path.as_ref().display()))?;
    let mut dest = String::new();
    BufReader::new(file).read_to_string(&mut dest)?;
    Ok(toml::from_str(&dest)?)
}

fn read_files<P: AsRef<Path>>(dir: P) -> anyhow::Result<Option<ConfigFile>> {
    if let Some(file) = read_file(dir.as_ref(), DEFAULT_CONFIG_FILE)? {
        Ok(Some(file))
    } else if let Some(file) = read_file(dir.as_ref(), DEFAULT_HIDDEN_CONFIG_FILE)? {
        Ok(Some(file))
    } else {
        Ok(None)
    }
}

fn read_file<P: AsRef<Path>>(dir: P, file: &str) -> anyhow::Result<Option<ConfigFile>> {
    let path = dir.as_ref().join(file);
    if path.exists() {
        Ok(Some(read_config_file(path)?))
    } else {
        Ok(None)
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    pub trace: Option<ConfigTrace>,
    pub dns: Option<ConfigDns>,
    pub log: Option<ConfigLog>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            trace: Some(ConfigTrace::default()),
            dns: Some(ConfigDns::default()),
            log: Some(ConfigLog::default()),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigTrace {
    pub addr_family: Option<AddressFamilyConfig>,
    pub packet_length: Option<u32>,
    pub max_hops: Option<u8>,
    pub port: Option<u16>,
}

impl Default for ConfigTrace {
    fn default() -> Self {
        Self {
            addr_family: Some(super::constants::DEFAULT_ADDR_FAMILY),
            packet_length: None,
            max_hops: Some(defaults::DEFAULT_MAX_TTL),
            port: Some(defaults::DEFAULT_BASE_PORT),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigDns {
    pub address_mode: Option<AddressModeConfig>,
}

impl Default for ConfigDns {
    fn default() -> Self {
        Self {
            address_mode: Some(AddressModeConfig::from(defaults::DEFAULT_ADDRESS_MODE)),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigLog {
    pub verbose: Option<bool>,
    pub format: Option<LogFormat>,
    pub filter: Option<String>,
    pub span_events: Option<LogSpanEvents>,
}

impl Default for ConfigLog {
    fn default() -> Self {
        Self {
            verbose: Some(super::constants::DEFAULT_VERBOSE),
            format: Some(super::constants::DEFAULT_LOG_FORMAT),
            filter: Some(String::from(super::constants::DEFAULT_LOG_FILTER)),
            span_events: Some(super::constants::DEFAULT_LOG_SPAN_EVENTS),
        }
    }
}
