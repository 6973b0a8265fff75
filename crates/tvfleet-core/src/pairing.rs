// ── Pairing / token manager ──
//
// Token lifecycle per device:
//   absent → pairing (human approves on the device) → cached
//   → cleared when the device rejects it → absent
//
// This module only obtains and caches tokens. Clearing a rejected token
// is done by the dispatcher, which is where rejection is discovered.

use std::sync::Arc;

use tvfleet_api::{Endpoint, Greeting, SessionChannel};

use crate::config::FleetConfig;
use crate::directory::DeviceDirectory;
use crate::error::CoreError;
use crate::model::{AuthToken, DevicePatch};

/// Message used when the device gives no reason of its own.
pub(crate) const FALLBACK_SERVER_MESSAGE: &str = "Connection issue";

/// How a successful [`TokenManager::ensure_paired`] got its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    /// A token was already cached; no I/O happened.
    Cached,
    /// The device issued a new token, now stored in the directory.
    Issued,
}

/// Obtains and caches per-device auth tokens.
pub struct TokenManager {
    config: Arc<FleetConfig>,
    directory: Arc<dyn DeviceDirectory>,
    channel: Arc<dyn SessionChannel>,
}

impl TokenManager {
    pub fn new(
        config: Arc<FleetConfig>,
        directory: Arc<dyn DeviceDirectory>,
        channel: Arc<dyn SessionChannel>,
    ) -> Self {
        Self {
            config,
            directory,
            channel,
        }
    }

    /// Cached token, or a freshly paired one. `None` when the device is
    /// unknown or pairing failed for any reason.
    pub async fn get_token(&self, address: &str, force_pairing: bool) -> Option<AuthToken> {
        let device = self.directory.get(address)?;
        if !force_pairing {
            if let Some(token) = device.token {
                return Some(token);
            }
        }

        match self.pair(address).await {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!(address, error = %e, "pairing failed");
                None
            }
        }
    }

    /// Pair unless a token is cached (or `force` is set).
    pub async fn ensure_paired(&self, address: &str, force: bool) -> Result<Pairing, CoreError> {
        let device = self
            .directory
            .get(address)
            .ok_or_else(|| CoreError::DeviceNotFound {
                address: address.to_owned(),
            })?;
        if !force && device.has_token() {
            return Ok(Pairing::Cached);
        }
        self.pair(address).await.map(|_| Pairing::Issued)
    }

    /// Run the pairing handshake: open a token-less session and wait up to
    /// the pairing timeout for the device to issue a token.
    pub async fn pair(&self, address: &str) -> Result<AuthToken, CoreError> {
        let device = self
            .directory
            .get(address)
            .ok_or_else(|| CoreError::DeviceNotFound {
                address: address.to_owned(),
            })?;

        tracing::info!(
            device = %device.display_name(),
            address,
            "pairing required, approve the request on the device"
        );

        let endpoint =
            Endpoint::remote_control(address, self.config.port, &self.config.app_name, None)?;
        let mut session = self
            .channel
            .open(&endpoint, self.config.pairing_timeout)
            .await?;

        let result = match session.greeting() {
            Greeting::Paired { token } => Ok(AuthToken::from(token.clone())),
            Greeting::Unauthorized { message } => Err(CoreError::Unauthorized {
                message: message
                    .clone()
                    .unwrap_or_else(|| "Pairing was denied on the device".into()),
            }),
            Greeting::Ready => Err(CoreError::Rejected {
                message: "Device did not issue a token".into(),
            }),
            Greeting::Rejected { message, .. } => Err(CoreError::Rejected {
                message: message
                    .clone()
                    .unwrap_or_else(|| FALLBACK_SERVER_MESSAGE.into()),
            }),
        };
        session.close().await;

        let token = result?;
        self.directory
            .upsert(address, DevicePatch::token(token.clone()))?;
        tracing::info!(address, "pairing complete, token stored");
        Ok(token)
    }

    /// Forget the cached token so the next send pairs again.
    pub fn clear_token(&self, address: &str) -> Result<(), CoreError> {
        self.directory.clear_token(address)
    }
}
