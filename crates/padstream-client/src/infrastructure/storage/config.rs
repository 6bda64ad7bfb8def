//! TOML-based configuration persistence for the client application.
//!
//! Reads and writes `ClientConfig` from `padstream/client.toml` in the
//! platform config directory, with serde defaults so the file can be
//! partial or absent entirely.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Update rates the pacing loop supports.
pub const SUPPORTED_RATES_HZ: [u32; 3] = [30, 60, 90];

/// Error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A field value failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub stream: StreamSection,
}

/// Client identity and logging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientSection {
    /// Fixed client id; when absent one is derived at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<u32>,
    /// `tracing` log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Where the stream goes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSection {
    /// Host machine address.
    #[serde(default = "default_target_ip")]
    pub target_ip: String,
    /// Host UDP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamSection {
    /// Packets per second: 30, 60, or 90.
    #[serde(default = "default_update_rate_hz")]
    pub update_rate_hz: u32,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_target_ip() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    7777
}
fn default_update_rate_hz() -> u32 {
    60
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            client_id: None,
            log_level: default_log_level(),
        }
    }
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            target_ip: default_target_ip(),
            port: default_port(),
        }
    }
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            update_rate_hz: default_update_rate_hz(),
        }
    }
}

impl ClientConfig {
    /// Checks every field once at startup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.port == 0 {
            return Err(ConfigError::Invalid("network.port must be non-zero".into()));
        }
        self.network
            .target_ip
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::Invalid(format!("network.target_ip: {e}")))?;
        if !SUPPORTED_RATES_HZ.contains(&self.stream.update_rate_hz) {
            return Err(ConfigError::Invalid(format!(
                "stream.update_rate_hz must be one of {SUPPORTED_RATES_HZ:?}"
            )));
        }
        Ok(())
    }

    /// The host socket address the stream targets.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the target address does not parse.
    pub fn target_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .network
            .target_ip
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("network.target_ip: {e}")))?;
        Ok(SocketAddr::new(ip, self.network.port))
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the client config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory
/// cannot be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .ok_or(ConfigError::NoPlatformConfigDir)
        .map(|dir| dir.join("client.toml"))
}

/// Loads `ClientConfig` from disk, returning the defaults if the file does
/// not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not
/// found", and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: ClientConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Padstream"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("padstream"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Padstream")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
