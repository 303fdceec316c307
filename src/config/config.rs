use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::common;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Serial side of the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    /// Read timeout, also bounds how long we wait for an acknowledgement.
    pub timeout_ms: u64,
    /// Written once right after the port opens. Empty disables it.
    pub greeting: String,
    pub read_ack: bool,
    pub clear_on_open: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: common::SERIAL_PORT.to_string(),
            baud_rate: common::BAUDRATE,
            timeout_ms: common::SERIAL_TIMEOUT_MS,
            greeting: common::GREETING.to_string(),
            read_ack: true,
            clear_on_open: false,
        }
    }
}

/// Which stream to look for and how long to wait on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub property: String,
    pub value: String,
    pub discovery_addr: String,
    /// `None` keeps looking until a stream shows up.
    pub resolve_timeout_ms: Option<u64>,
    pub pull_timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            property: common::STREAM_PROPERTY.to_string(),
            value: common::STREAM_VALUE.to_string(),
            discovery_addr: format!(
                "{}:{}",
                common::LSL_MULTICAST_ADDR,
                common::LSL_MULTICAST_PORT
            ),
            resolve_timeout_ms: None,
            pull_timeout_ms: common::PULL_TIMEOUT_MS,
            connect_timeout_ms: common::CONNECT_TIMEOUT_MS,
        }
    }
}

/// Layout of the text line sent for every sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub channels: Vec<usize>,
    pub labels: Vec<String>,
    pub separator: String,
    pub terminator: String,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            channels: common::CHANNELS.to_vec(),
            labels: common::CHANNEL_LABELS.iter().map(|l| l.to_string()).collect(),
            separator: common::SEPARATOR.to_string(),
            terminator: common::TERMINATOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub stream: StreamConfig,
    pub frame: FrameConfig,
    /// Stop after this many forwarded samples.
    pub max_samples: Option<u64>,
}

/// Values given on the command line. Each `Some` replaces the file value.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub greeting: Option<String>,
    pub read_ack: Option<bool>,
    pub property: Option<String>,
    pub value: Option<String>,
    pub channels: Option<Vec<usize>>,
    pub max_samples: Option<u64>,
    pub resolve_timeout_ms: Option<u64>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(port) = &overrides.port {
            self.serial.port = port.clone();
        }
        if let Some(baud_rate) = overrides.baud_rate {
            self.serial.baud_rate = baud_rate;
        }
        if let Some(greeting) = &overrides.greeting {
            self.serial.greeting = greeting.clone();
        }
        if let Some(read_ack) = overrides.read_ack {
            self.serial.read_ack = read_ack;
        }
        if let Some(property) = &overrides.property {
            self.stream.property = property.clone();
        }
        if let Some(value) = &overrides.value {
            self.stream.value = value.clone();
        }
        if let Some(channels) = &overrides.channels {
            // Labels written for the old selection no longer line up.
            if *channels != self.frame.channels {
                self.frame.labels.clear();
            }
            self.frame.channels = channels.clone();
        }
        if overrides.max_samples.is_some() {
            self.max_samples = overrides.max_samples;
        }
        if overrides.resolve_timeout_ms.is_some() {
            self.stream.resolve_timeout_ms = overrides.resolve_timeout_ms;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame.channels.is_empty() {
            return Err(ConfigError::Invalid("at least one channel must be selected".into()));
        }
        if !self.frame.labels.is_empty() && self.frame.labels.len() != self.frame.channels.len() {
            return Err(ConfigError::Invalid(format!(
                "{} labels given for {} channels",
                self.frame.labels.len(),
                self.frame.channels.len()
            )));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud rate must be positive".into()));
        }
        let timeouts = [
            ("serial.timeout_ms", Some(self.serial.timeout_ms)),
            ("stream.pull_timeout_ms", Some(self.stream.pull_timeout_ms)),
            ("stream.connect_timeout_ms", Some(self.stream.connect_timeout_ms)),
            ("stream.resolve_timeout_ms", self.stream.resolve_timeout_ms),
        ];
        for (name, value) in timeouts {
            match value {
                Some(0) => {
                    return Err(ConfigError::Invalid(format!("{} must be positive", name)));
                }
                Some(ms) if ms > common::MAX_TIMEOUT_MS => {
                    return Err(ConfigError::Invalid(format!(
                        "{} of {} ms exceeds the {} ms limit",
                        name,
                        ms,
                        common::MAX_TIMEOUT_MS
                    )));
                }
                _ => {}
            }
        }
        if !common::STREAM_PROPERTIES.contains(&self.stream.property.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unsupported stream property '{}' (expected one of {})",
                self.stream.property,
                common::STREAM_PROPERTIES.join(", ")
            )));
        }
        self.discovery_addr()?;
        Ok(())
    }

    pub fn discovery_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.stream.discovery_addr.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "discovery address '{}' is not host:port",
                self.stream.discovery_addr
            ))
        })
    }
}

/// An explicit path must exist; otherwise `config.json` is used when present.
pub fn load_or_default(path: Option<&str>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load(path),
        None if Path::new(common::DEFAULT_CONFIG).exists() => Config::load(common::DEFAULT_CONFIG),
        None => Ok(Config::default()),
    }
}

/// Parses `"0,1,2,3"` into channel indices.
pub fn parse_channel_list(text: &str) -> Result<Vec<usize>, ConfigError> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>()
                .map_err(|_| ConfigError::Invalid(format!("'{}' is not a channel index", part)))
        })
        .collect()
}

/// Expands `\r`, `\n`, `\t` and `\\` typed literally on a shell.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
