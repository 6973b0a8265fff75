// ── Runtime fleet configuration ──
//
// Protocol tuning, power policy and pool sizing. Never touches disk:
// the CLI builds a `FleetConfig` from its config file and hands it in.

use std::net::Ipv4Addr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tvfleet_api::TlsMode;

/// How reachability is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProbeMethod {
    /// TCP connect to the control port.
    #[default]
    Tcp,
    /// One ICMP echo via the system `ping`.
    Icmp,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// Bundled WebPKI roots (strict).
    SystemDefaults,
    /// Skip verification (self-signed device certificates).
    #[default]
    DangerAcceptInvalid,
}

impl From<TlsVerification> for TlsMode {
    fn from(tls: TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Everything the core needs to talk to a fleet.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Application name announced to devices (shown in the pairing prompt).
    pub app_name: String,
    /// Control channel port.
    pub port: u16,
    pub tls: TlsVerification,
    /// Connect + greeting budget for command sends.
    pub send_timeout: Duration,
    /// Connect + greeting budget while a human approves pairing on the device.
    pub pairing_timeout: Duration,
    pub probe: ProbeMethod,
    pub probe_timeout: Duration,
    /// Broadcast address used when a device has no override.
    pub default_broadcast: Ipv4Addr,
    /// Reachability polls after a wake packet.
    pub wake_attempts: u32,
    /// Delay before each poll.
    pub wake_interval: Duration,
    /// Bulk pool size. `None` sizes the pool to the number of targets.
    pub workers: Option<usize>,
    /// Per-device deadline inside a bulk call.
    pub bulk_deadline: Option<Duration>,
}

/// Pool size for long-running service use.
pub const DEFAULT_WORKERS: usize = 20;

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            app_name: "tvfleet".into(),
            port: tvfleet_api::endpoint::DEFAULT_PORT,
            tls: TlsVerification::default(),
            send_timeout: Duration::from_secs(5),
            pairing_timeout: Duration::from_secs(60),
            probe: ProbeMethod::default(),
            probe_timeout: Duration::from_secs(1),
            default_broadcast: Ipv4Addr::BROADCAST,
            wake_attempts: 10,
            wake_interval: Duration::from_secs(3),
            workers: Some(DEFAULT_WORKERS),
            bulk_deadline: None,
        }
    }
}
