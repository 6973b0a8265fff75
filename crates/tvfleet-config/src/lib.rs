//! Configuration for tvfleet.
//!
//! TOML config loading (defaults → file → environment), translation to
//! `tvfleet_core::FleetConfig`, and the file-backed device inventory and
//! key map in [`inventory`].

pub mod inventory;

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tvfleet_core::{FleetConfig, ProbeMethod, TlsVerification};

pub use inventory::{FileDirectory, load_keys, save_keys};

/// Prefix for environment overrides, e.g. `TVFLEET_PROTOCOL__SEND_TIMEOUT=10`.
pub const ENV_PREFIX: &str = "TVFLEET_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub protocol: Protocol,

    #[serde(default)]
    pub power: Power,

    #[serde(default)]
    pub probe: Probe,

    #[serde(default)]
    pub inventory: Inventory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Bulk pool size. Unset sizes the pool to the number of targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Per-device deadline in a bulk call, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<u64>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            workers: None,
            deadline: None,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// Control channel settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Protocol {
    /// Name shown on the device when asking to approve pairing.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds to connect and read the greeting when sending a key.
    #[serde(default = "default_send_timeout")]
    pub send_timeout: u64,

    /// Seconds to wait for a human to approve pairing.
    #[serde(default = "default_pairing_timeout")]
    pub pairing_timeout: u64,

    /// Verify device certificates against WebPKI roots.
    #[serde(default)]
    pub verify_tls: bool,
}

impl Default for Protocol {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            port: default_port(),
            send_timeout: default_send_timeout(),
            pairing_timeout: default_pairing_timeout(),
            verify_tls: false,
        }
    }
}

fn default_app_name() -> String {
    "tvfleet".into()
}
fn default_port() -> u16 {
    8002
}
fn default_send_timeout() -> u64 {
    5
}
fn default_pairing_timeout() -> u64 {
    60
}

/// Wake-on-LAN and power-on verification.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Power {
    #[serde(default = "default_broadcast")]
    pub broadcast: Ipv4Addr,

    #[serde(default = "default_wake_attempts")]
    pub wake_attempts: u32,

    /// Seconds between verification probes.
    #[serde(default = "default_wake_interval")]
    pub wake_interval: u64,
}

impl Default for Power {
    fn default() -> Self {
        Self {
            broadcast: default_broadcast(),
            wake_attempts: default_wake_attempts(),
            wake_interval: default_wake_interval(),
        }
    }
}

fn default_broadcast() -> Ipv4Addr {
    Ipv4Addr::BROADCAST
}
fn default_wake_attempts() -> u32 {
    10
}
fn default_wake_interval() -> u64 {
    3
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Probe {
    #[serde(default)]
    pub method: ProbeMethod,

    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for Probe {
    fn default() -> Self {
        Self {
            method: ProbeMethod::default(),
            timeout_ms: default_probe_timeout_ms(),
        }
    }
}

fn default_probe_timeout_ms() -> u64 {
    1000
}

/// Where the device inventory and key map live. Unset means the config dir.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Inventory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<PathBuf>,
}

impl Config {
    pub fn devices_path(&self) -> PathBuf {
        self.inventory
            .devices
            .clone()
            .unwrap_or_else(|| config_dir().join("devices.toml"))
    }

    pub fn keys_path(&self) -> PathBuf {
        self.inventory
            .keys
            .clone()
            .unwrap_or_else(|| config_dir().join("keys.toml"))
    }

    /// Translate into the core's runtime configuration.
    pub fn to_fleet_config(&self) -> Result<FleetConfig, ConfigError> {
        if self.protocol.app_name.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "protocol.app_name".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.defaults.workers == Some(0) {
            return Err(ConfigError::Validation {
                field: "defaults.workers".into(),
                reason: "must be at least 1".into(),
            });
        }

        let tls = if self.protocol.verify_tls {
            TlsVerification::SystemDefaults
        } else {
            TlsVerification::DangerAcceptInvalid
        };

        Ok(FleetConfig {
            app_name: self.protocol.app_name.clone(),
            port: self.protocol.port,
            tls,
            send_timeout: Duration::from_secs(self.protocol.send_timeout),
            pairing_timeout: Duration::from_secs(self.protocol.pairing_timeout),
            probe: self.probe.method,
            probe_timeout: Duration::from_millis(self.probe.timeout_ms),
            default_broadcast: self.power.broadcast,
            wake_attempts: self.power.wake_attempts,
            wake_interval: Duration::from_secs(self.power.wake_interval),
            workers: self.defaults.workers,
            bulk_deadline: self.defaults.deadline.map(Duration::from_secs),
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Directory holding config.toml, devices.toml and keys.toml.
pub fn config_dir() -> PathBuf {
    ProjectDirs::from("dev", "tvfleet", "tvfleet").map_or_else(dirs_fallback, |dirs| {
        dirs.config_dir().to_path_buf()
    })
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("tvfleet");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment. A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
