// ── Power controller ──
//
// Power-on:  already on? → done
//            no MAC?     → fail
//            wake → poll reachability (attempts × interval) → done
//            still silent after polling is reported as success
//
// Power-off: unreachable? → already off
//            otherwise the dispatcher's result for KEY_POWER, unchanged.

use std::sync::Arc;

use tvfleet_api::{Prober, WakeSignaler};

use crate::config::FleetConfig;
use crate::directory::DeviceDirectory;
use crate::dispatcher::Dispatcher;
use crate::error::CoreError;

/// Protocol key that toggles standby.
pub const POWER_KEY: &str = "KEY_POWER";

pub const ALREADY_ON: &str = "Device is already on.";
pub const POWERED_ON: &str = "Device successfully powered on.";
pub const WAKE_UNVERIFIED: &str =
    "Wake packet sent, but verification timed out. Device may be booting slowly.";
pub const ALREADY_OFF: &str = "Device is already off (unresponsive to probe).";

/// Drives power-state transitions.
pub struct PowerController {
    config: Arc<FleetConfig>,
    directory: Arc<dyn DeviceDirectory>,
    prober: Arc<dyn Prober>,
    wake: Arc<dyn WakeSignaler>,
    dispatcher: Arc<Dispatcher>,
}

impl PowerController {
    pub fn new(
        config: Arc<FleetConfig>,
        directory: Arc<dyn DeviceDirectory>,
        prober: Arc<dyn Prober>,
        wake: Arc<dyn WakeSignaler>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            config,
            directory,
            prober,
            wake,
            dispatcher,
        }
    }

    pub async fn power_on(&self, address: &str) -> Result<String, CoreError> {
        if self.prober.is_reachable(address).await {
            return Ok(ALREADY_ON.into());
        }

        let device = self
            .directory
            .get(address)
            .ok_or_else(|| CoreError::DeviceNotFound {
                address: address.to_owned(),
            })?;
        let mac = device
            .mac
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or(CoreError::NoMacAddress)?;
        let broadcast = device.broadcast.unwrap_or(self.config.default_broadcast);

        let sent = self.wake.wake(mac, broadcast).await?;
        tracing::info!(address, %broadcast, "{sent}");

        for attempt in 1..=self.config.wake_attempts {
            tokio::time::sleep(self.config.wake_interval).await;
            if self.prober.is_reachable(address).await {
                tracing::debug!(address, attempt, "device answered after wake");
                return Ok(POWERED_ON.into());
            }
            tracing::debug!(address, attempt, "device not answering yet");
        }

        tracing::info!(address, "wake not verified, assuming device is still booting");
        Ok(WAKE_UNVERIFIED.into())
    }

    pub async fn power_off(&self, address: &str) -> Result<String, CoreError> {
        if !self.prober.is_reachable(address).await {
            return Ok(ALREADY_OFF.into());
        }
        self.dispatcher.send_key(address, POWER_KEY).await
    }
}
