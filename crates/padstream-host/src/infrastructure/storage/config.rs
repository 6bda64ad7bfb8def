//! TOML-based configuration persistence for the host application.
//!
//! Reads and writes `HostConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\Padstream\host.toml`
//! - Linux:    `~/.config/padstream/host.toml`
//! - macOS:    `~/Library/Application Support/Padstream/host.toml`
//!
//! Fields annotated with `#[serde(default = "some_fn")]` fall back to the
//! function's return value when absent from the file, so the host works on
//! first run and when upgrading from an older config that is missing newer
//! fields.
//!
//! The loaded config is validated once via [`HostConfig::validate`] and then
//! treated as immutable; the rest of the system consumes it through the
//! derived [`SecurityPolicy`] and [`SessionPolicy`] views.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::replay::ReplayPolicy;
use crate::application::security::SecurityPolicy;
use crate::application::session::{SessionPolicy, MAX_SLOTS};

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

/// Top-level host configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HostConfig {
    #[serde(default)]
    pub host: GeneralConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// General host behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Socket settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// UDP port the input stream arrives on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// IP address to bind the socket to. `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Admission-control settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecurityConfig {
    /// Sustained packets/second allowed per client.
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: f64,
    /// Burst capacity of the rate-limit buckets.
    #[serde(default = "default_rate_limit_burst")]
    pub rate_limit_burst: u32,
    /// Sustained packets/second allowed per source address.
    #[serde(default = "default_ip_rate_limit_max")]
    pub ip_rate_limit_max: f64,
    /// Maximum simultaneous client ids per source address.
    #[serde(default = "default_max_clients_per_ip")]
    pub max_clients_per_ip: usize,
    /// Violations before a client is auto-blocked.
    #[serde(default = "default_auto_block_threshold")]
    pub auto_block_threshold: u32,
    /// Seconds an automatic or default manual block lasts.
    #[serde(default = "default_block_duration_secs")]
    pub block_duration_secs: f64,
    /// Maximum accepted packet age in seconds.
    #[serde(default = "default_max_timestamp_age_secs")]
    pub max_timestamp_age_secs: f64,
    /// Maximum tolerated future clock skew in seconds.
    #[serde(default = "default_max_timestamp_future_secs")]
    pub max_timestamp_future_secs: f64,
    /// When `true`, only addresses in `whitelist_ips` are admitted.
    #[serde(default)]
    pub enable_whitelist: bool,
    /// Addresses admitted when the whitelist is enabled.
    #[serde(default)]
    pub whitelist_ips: Vec<String>,
    /// Seconds of inactivity before the sweep evicts a record.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: f64,
    /// Seconds between registry sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: f64,
    /// Log packets dropped because of an existing block (noisy).
    #[serde(default)]
    pub log_blocked_packets: bool,
}

/// Slot-ownership settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Seconds of owner silence before a slot frees.
    #[serde(default = "default_ownership_timeout_secs")]
    pub ownership_timeout_secs: f64,
    /// When `true` the host exposes `max_slots` controllers; otherwise one.
    #[serde(default)]
    pub coop_enabled: bool,
    /// Slot count used in co-op mode, 1 to 4.
    #[serde(default = "default_max_slots")]
    pub max_slots: usize,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_port() -> u16 {
    7777
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_rate_limit_max() -> f64 {
    120.0
}
fn default_rate_limit_burst() -> u32 {
    20
}
fn default_ip_rate_limit_max() -> f64 {
    200.0
}
fn default_max_clients_per_ip() -> usize {
    3
}
fn default_auto_block_threshold() -> u32 {
    5
}
fn default_block_duration_secs() -> f64 {
    300.0
}
fn default_max_timestamp_age_secs() -> f64 {
    5.0
}
fn default_max_timestamp_future_secs() -> f64 {
    1.0
}
fn default_retention_secs() -> f64 {
    300.0
}
fn default_sweep_interval_secs() -> f64 {
    60.0
}
fn default_ownership_timeout_secs() -> f64 {
    0.5
}
fn default_max_slots() -> usize {
    4
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            rate_limit_max: default_rate_limit_max(),
            rate_limit_burst: default_rate_limit_burst(),
            ip_rate_limit_max: default_ip_rate_limit_max(),
            max_clients_per_ip: default_max_clients_per_ip(),
            auto_block_threshold: default_auto_block_threshold(),
            block_duration_secs: default_block_duration_secs(),
            max_timestamp_age_secs: default_max_timestamp_age_secs(),
            max_timestamp_future_secs: default_max_timestamp_future_secs(),
            enable_whitelist: false,
            whitelist_ips: Vec::new(),
            retention_secs: default_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            log_blocked_packets: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ownership_timeout_secs: default_ownership_timeout_secs(),
            coop_enabled: false,
            max_slots: default_max_slots(),
        }
    }
}

// ── Derived views ─────────────────────────────────────────────────────────────

impl HostConfig {
    /// Checks every field once at startup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.port == 0 {
            return Err(ConfigError::Invalid("network.port must be non-zero".into()));
        }
        self.network
            .bind_address
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::Invalid(format!("network.bind_address: {e}")))?;
        if self.security.rate_limit_burst == 0 {
            return Err(ConfigError::Invalid(
                "security.rate_limit_burst must be positive".into(),
            ));
        }
        if self.security.rate_limit_max <= 0.0 || self.security.ip_rate_limit_max <= 0.0 {
            return Err(ConfigError::Invalid(
                "security rate limits must be positive".into(),
            ));
        }
        if self.security.auto_block_threshold < 1 {
            return Err(ConfigError::Invalid(
                "security.auto_block_threshold must be at least 1".into(),
            ));
        }
        if self.security.max_clients_per_ip == 0 {
            return Err(ConfigError::Invalid(
                "security.max_clients_per_ip must be positive".into(),
            ));
        }
        for ip in &self.security.whitelist_ips {
            ip.parse::<IpAddr>()
                .map_err(|e| ConfigError::Invalid(format!("security.whitelist_ips '{ip}': {e}")))?;
        }
        if self.session.ownership_timeout_secs <= 0.0 {
            return Err(ConfigError::Invalid(
                "session.ownership_timeout_secs must be positive".into(),
            ));
        }
        if !(1..=MAX_SLOTS).contains(&self.session.max_slots) {
            return Err(ConfigError::Invalid(format!(
                "session.max_slots must be 1..={MAX_SLOTS}"
            )));
        }
        Ok(())
    }

    /// The socket address the server binds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the bind address does not parse.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .network
            .bind_address
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("network.bind_address: {e}")))?;
        Ok(SocketAddr::new(ip, self.network.port))
    }

    /// The admission-control view consumed by the security registry.
    /// Call after [`validate`]; unparseable whitelist entries are skipped.
    ///
    /// [`validate`]: HostConfig::validate
    pub fn security_policy(&self) -> SecurityPolicy {
        let whitelist: HashSet<IpAddr> = self
            .security
            .whitelist_ips
            .iter()
            .filter_map(|ip| ip.parse().ok())
            .collect();
        SecurityPolicy {
            rate_limit_max: self.security.rate_limit_max,
            rate_limit_burst: self.security.rate_limit_burst,
            ip_rate_limit_max: self.security.ip_rate_limit_max,
            max_clients_per_ip: self.security.max_clients_per_ip,
            auto_block_threshold: self.security.auto_block_threshold,
            block_duration: Duration::from_secs_f64(self.security.block_duration_secs),
            replay: ReplayPolicy {
                max_age: Duration::from_secs_f64(self.security.max_timestamp_age_secs),
                max_future: Duration::from_secs_f64(self.security.max_timestamp_future_secs),
            },
            enable_whitelist: self.security.enable_whitelist,
            whitelist,
            retention: Duration::from_secs_f64(self.security.retention_secs),
            log_blocked_packets: self.security.log_blocked_packets,
        }
    }

    /// The slot-ownership view consumed by the session manager.
    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            ownership_timeout: Duration::from_secs_f64(self.session.ownership_timeout_secs),
            max_slots: if self.session.coop_enabled {
                self.session.max_slots
            } else {
                1
            },
        }
    }

    /// Seconds between registry sweeps as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs_f64(self.security.sweep_interval_secs)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the base directory
/// cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the host config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory
/// cannot be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("host.toml"))
}

/// Loads `HostConfig` from disk, returning `HostConfig::default()` if the
/// file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not
/// found", and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<HostConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: HostConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HostConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Persists `config` to disk, creating the directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &HostConfig) -> Result<(), ConfigError> {
    let path = config_file_path()?;

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_default_config_has_expected_port_and_limits() {
        let cfg = HostConfig::default();
        assert_eq!(cfg.network.port, 7777);
        assert_eq!(cfg.security.rate_limit_max, 120.0);
        assert_eq!(cfg.security.rate_limit_burst, 20);
        assert_eq!(cfg.security.ip_rate_limit_max, 200.0);
        assert_eq!(cfg.security.max_clients_per_ip, 3);
        assert_eq!(cfg.security.auto_block_threshold, 5);
        assert_eq!(cfg.security.block_duration_secs, 300.0);
    }

    #[test]
    fn test_default_config_validates() {
        assert!(HostConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_session_is_single_owner() {
        let cfg = HostConfig::default();
        assert!(!cfg.session.coop_enabled);
        assert_eq!(cfg.session_policy().max_slots, 1);
    }

    #[test]
    fn test_coop_enables_configured_slot_count() {
        let mut cfg = HostConfig::default();
        cfg.session.coop_enabled = true;
        cfg.session.max_slots = 4;
        assert_eq!(cfg.session_policy().max_slots, 4);
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut cfg = HostConfig::default();
        cfg.network.port = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_burst() {
        let mut cfg = HostConfig::default();
        cfg.security.rate_limit_burst = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_block_threshold() {
        let mut cfg = HostConfig::default();
        cfg.security.auto_block_threshold = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_bad_bind_address() {
        let mut cfg = HostConfig::default();
        cfg.network.bind_address = "not-an-ip".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_bad_whitelist_entry() {
        let mut cfg = HostConfig::default();
        cfg.security.whitelist_ips = vec!["10.0.0.5".into(), "bogus".into()];
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_slots() {
        let mut cfg = HostConfig::default();
        cfg.session.max_slots = 5;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        cfg.session.max_slots = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    // ── Derived views ─────────────────────────────────────────────────────────

    #[test]
    fn test_security_policy_converts_durations() {
        let cfg = HostConfig::default();
        let policy = cfg.security_policy();
        assert_eq!(policy.block_duration, Duration::from_secs(300));
        assert_eq!(policy.replay.max_age, Duration::from_secs(5));
        assert_eq!(policy.replay.max_future, Duration::from_secs(1));
        assert_eq!(policy.retention, Duration::from_secs(300));
    }

    #[test]
    fn test_security_policy_parses_whitelist() {
        let mut cfg = HostConfig::default();
        cfg.security.enable_whitelist = true;
        cfg.security.whitelist_ips = vec!["10.0.0.5".into(), "192.168.1.7".into()];
        let policy = cfg.security_policy();
        assert!(policy.whitelist.contains(&"10.0.0.5".parse::<IpAddr>().unwrap()));
        assert_eq!(policy.whitelist.len(), 2);
    }

    #[test]
    fn test_socket_addr_combines_bind_and_port() {
        let mut cfg = HostConfig::default();
        cfg.network.port = 9000;
        assert_eq!(
            cfg.socket_addr().unwrap(),
            "0.0.0.0:9000".parse::<SocketAddr>().unwrap()
        );
    }

    // ── TOML round-trip ───────────────────────────────────────────────────────

    #[test]
    fn test_config_serializes_and_deserializes_round_trip() {
        let mut cfg = HostConfig::default();
        cfg.network.port = 9001;
        cfg.security.enable_whitelist = true;
        cfg.security.whitelist_ips = vec!["10.0.0.5".to_string()];
        cfg.session.coop_enabled = true;

        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: HostConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let cfg: HostConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, HostConfig::default());
    }

    #[test]
    fn test_deserialize_partial_section_overrides_defaults() {
        let toml_str = r#"
[network]
port = 9999

[security]
rate_limit_max = 60.0
"#;
        let cfg: HostConfig = toml::from_str(toml_str).expect("deserialize partial");
        assert_eq!(cfg.network.port, 9999);
        assert_eq!(cfg.security.rate_limit_max, 60.0);
        // Unspecified fields keep their defaults.
        assert_eq!(cfg.network.bind_address, "0.0.0.0");
        assert_eq!(cfg.security.rate_limit_burst, 20);
    }

    #[test]
    fn test_deserialize_invalid_toml_returns_parse_error() {
        let result: Result<HostConfig, toml::de::Error> = toml::from_str("[[[ not valid toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_file_path_ends_with_host_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("host.toml"));
        }
        // NoPlatformConfigDir in a stripped environment is also acceptable.
    }
}
