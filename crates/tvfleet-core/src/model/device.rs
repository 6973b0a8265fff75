// ── Device records ──
//
// A device is keyed by its network address. The hardware address is
// kept as written and only parsed when a wake packet is built, so one
// bad entry fails that device's power-on, not the whole inventory.

use std::fmt;
use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

/// Opaque per-device credential issued by the device during pairing.
#[derive(Clone)]
pub struct AuthToken(SecretString);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(****)")
    }
}

impl From<SecretString> for AuthToken {
    fn from(secret: SecretString) -> Self {
        Self(secret)
    }
}

impl From<String> for AuthToken {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

/// Everything known about one device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceRecord {
    pub address: String,
    pub name: Option<String>,
    pub mac: Option<String>,
    /// Per-device broadcast override for wake packets.
    pub broadcast: Option<Ipv4Addr>,
    #[serde(skip)]
    pub token: Option<AuthToken>,
    pub model: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl DeviceRecord {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
            mac: None,
            broadcast: None,
            token: None,
            model: None,
            last_updated: None,
        }
    }

    /// Configured name, or a placeholder built from the address.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| unknown_device_name(&self.address))
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Merge the fields set in `patch`. Bumps `last_updated`.
    pub fn apply(&mut self, patch: DevicePatch) {
        if let Some(name) = patch.name {
            self.name = Some(name);
        }
        if let Some(mac) = patch.mac {
            self.mac = Some(mac);
        }
        if let Some(broadcast) = patch.broadcast {
            self.broadcast = Some(broadcast);
        }
        if let Some(model) = patch.model {
            self.model = Some(model);
        }
        if let Some(token) = patch.token {
            self.token = Some(token);
        }
        self.last_updated = Some(Utc::now());
    }
}

/// Placeholder name for an address with no configured name.
pub fn unknown_device_name(address: &str) -> String {
    format!("Unknown device ({address})")
}

/// Partial update for a [`DeviceRecord`]. `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct DevicePatch {
    pub name: Option<String>,
    pub mac: Option<String>,
    pub broadcast: Option<Ipv4Addr>,
    pub model: Option<String>,
    pub token: Option<AuthToken>,
}

impl DevicePatch {
    pub fn token(token: AuthToken) -> Self {
        Self {
            token: Some(token),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_address() {
        let mut device = DeviceRecord::new("10.0.0.5");
        assert_eq!(device.display_name(), "Unknown device (10.0.0.5)");
        device.name = Some("Lobby".into());
        assert_eq!(device.display_name(), "Lobby");
    }

    #[test]
    fn apply_merges_and_stamps() {
        let mut device = DeviceRecord::new("10.0.0.5");
        device.name = Some("Lobby".into());
        device.apply(DevicePatch::token(AuthToken::new("abc")));

        assert_eq!(device.name.as_deref(), Some("Lobby"));
        assert_eq!(device.token.as_ref().map(AuthToken::expose), Some("abc"));
        assert!(device.last_updated.is_some());
    }

    #[test]
    fn token_never_debug_printed() {
        let mut device = DeviceRecord::new("10.0.0.5");
        device.token = Some(AuthToken::new("hunter2"));
        assert!(!format!("{device:?}").contains("hunter2"));
    }
}
