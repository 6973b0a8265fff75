// ── Command dispatcher ──
//
// One key press to one device:
//   token (cached or paired) → open session with token → check greeting
//   → send click → close.
//
// The session is closed on every path once opened.

use std::sync::Arc;

use tvfleet_api::{Endpoint, Greeting, Prober, RemoteControl, Session, SessionChannel};

use crate::config::FleetConfig;
use crate::error::CoreError;
use crate::pairing::{FALLBACK_SERVER_MESSAGE, TokenManager};

/// Sends single remote keys.
pub struct Dispatcher {
    config: Arc<FleetConfig>,
    tokens: Arc<TokenManager>,
    channel: Arc<dyn SessionChannel>,
    prober: Arc<dyn Prober>,
}

impl Dispatcher {
    pub fn new(
        config: Arc<FleetConfig>,
        tokens: Arc<TokenManager>,
        channel: Arc<dyn SessionChannel>,
        prober: Arc<dyn Prober>,
    ) -> Self {
        Self {
            config,
            tokens,
            channel,
            prober,
        }
    }

    /// Send `key_code` without checking reachability first.
    pub async fn send_key(&self, address: &str, key_code: &str) -> Result<String, CoreError> {
        let token = self
            .tokens
            .get_token(address, false)
            .await
            .ok_or(CoreError::TokenUnavailable)?;

        let endpoint = Endpoint::remote_control(
            address,
            self.config.port,
            &self.config.app_name,
            Some(token.expose()),
        )?;
        let mut session = self.channel.open(&endpoint, self.config.send_timeout).await?;

        let result = self.exchange(session.as_mut(), address, key_code).await;
        session.close().await;
        result
    }

    /// Send `key_code` to a device that must already answer probes.
    /// An unreachable device fails with [`CoreError::DeviceOff`] and no
    /// session is opened.
    pub async fn press(&self, address: &str, key_code: &str) -> Result<String, CoreError> {
        if !self.prober.is_reachable(address).await {
            return Err(CoreError::DeviceOff);
        }
        self.send_key(address, key_code).await
    }

    async fn exchange(
        &self,
        session: &mut dyn Session,
        address: &str,
        key_code: &str,
    ) -> Result<String, CoreError> {
        match session.greeting() {
            Greeting::Ready => {}
            Greeting::Unauthorized { message } => {
                let message = message
                    .clone()
                    .unwrap_or_else(|| FALLBACK_SERVER_MESSAGE.into());
                tracing::warn!(address, "token rejected by device, clearing cached token");
                if let Err(e) = self.tokens.clear_token(address) {
                    tracing::warn!(address, error = %e, "failed to clear rejected token");
                }
                return Err(CoreError::Unauthorized { message });
            }
            other => {
                return Err(CoreError::Rejected {
                    message: other
                        .message()
                        .unwrap_or(FALLBACK_SERVER_MESSAGE)
                        .to_owned(),
                });
            }
        }

        session.send(&RemoteControl::click(key_code)).await?;
        tracing::debug!(address, key_code, "key sent");
        Ok(format!("Sent {key_code}"))
    }
}
