// ── Fleet facade ──
//
// Wires the collaborators together and exposes the operations the
// front ends use. Built once at startup; cheap to share behind an `Arc`.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tvfleet_api::{
    PingProber, Prober, SessionChannel, TcpProber, UdpWakeSignaler, WakeSignaler, WsChannel,
};

use crate::bulk::BulkOrchestrator;
use crate::command::{CommandExecutor, CommandPlan};
use crate::config::{FleetConfig, ProbeMethod};
use crate::directory::DeviceDirectory;
use crate::dispatcher::Dispatcher;
use crate::error::CoreError;
use crate::model::{BulkResult, CommandOutcome};
use crate::pairing::{Pairing, TokenManager};
use crate::power::PowerController;
use crate::registry::CommandRegistry;

/// External collaborators the fleet is built from.
pub struct Collaborators {
    pub directory: Arc<dyn DeviceDirectory>,
    pub registry: Arc<dyn CommandRegistry>,
    pub channel: Arc<dyn SessionChannel>,
    pub wake: Arc<dyn WakeSignaler>,
    pub prober: Arc<dyn Prober>,
}

/// Entry point for controlling a set of devices.
pub struct Fleet {
    config: Arc<FleetConfig>,
    directory: Arc<dyn DeviceDirectory>,
    registry: Arc<dyn CommandRegistry>,
    prober: Arc<dyn Prober>,
    tokens: Arc<TokenManager>,
    executor: Arc<CommandExecutor>,
    bulk: BulkOrchestrator,
}

impl Fleet {
    pub fn new(config: FleetConfig, parts: Collaborators) -> Self {
        let config = Arc::new(config);
        let Collaborators {
            directory,
            registry,
            channel,
            wake,
            prober,
        } = parts;

        let tokens = Arc::new(TokenManager::new(
            Arc::clone(&config),
            Arc::clone(&directory),
            Arc::clone(&channel),
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&config),
            Arc::clone(&tokens),
            channel,
            Arc::clone(&prober),
        ));
        let power = Arc::new(PowerController::new(
            Arc::clone(&config),
            Arc::clone(&directory),
            Arc::clone(&prober),
            wake,
            Arc::clone(&dispatcher),
        ));
        let executor = Arc::new(CommandExecutor::new(
            Arc::clone(&directory),
            power,
            dispatcher,
        ));
        let bulk = BulkOrchestrator::new(Arc::clone(&executor), config.workers, config.bulk_deadline);

        Self {
            config,
            directory,
            registry,
            prober,
            tokens,
            executor,
            bulk,
        }
    }

    /// Build with the real network stack: WebSocket sessions, UDP wake
    /// packets and the configured probe method.
    pub fn with_network(
        config: FleetConfig,
        directory: Arc<dyn DeviceDirectory>,
        registry: Arc<dyn CommandRegistry>,
    ) -> Self {
        let prober: Arc<dyn Prober> = match config.probe {
            ProbeMethod::Tcp => Arc::new(TcpProber::new(config.port, config.probe_timeout)),
            ProbeMethod::Icmp => Arc::new(PingProber::new(config.probe_timeout)),
        };
        let parts = Collaborators {
            directory,
            registry,
            channel: Arc::new(WsChannel::new(config.tls.into())),
            wake: Arc::new(UdpWakeSignaler::new()),
            prober,
        };
        Self::new(config, parts)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn directory(&self) -> &Arc<dyn DeviceDirectory> {
        &self.directory
    }

    pub fn registry(&self) -> &Arc<dyn CommandRegistry> {
        &self.registry
    }

    /// Resolve a command name. Unknown names are a configuration error.
    pub fn plan(&self, command_name: &str) -> Result<CommandPlan, CoreError> {
        CommandPlan::resolve(command_name, self.registry.as_ref())
    }

    // ── Single device ────────────────────────────────────────────────

    pub async fn send_command(
        &self,
        address: &str,
        command_name: &str,
    ) -> Result<CommandOutcome, CoreError> {
        let plan = self.plan(command_name)?;
        Ok(self.executor.execute(address, &plan).await)
    }

    pub async fn power_on(&self, address: &str) -> CommandOutcome {
        self.executor
            .execute(address, &CommandPlan::power_on())
            .await
    }

    pub async fn power_off(&self, address: &str) -> CommandOutcome {
        self.executor
            .execute(address, &CommandPlan::power_off())
            .await
    }

    /// Press a raw protocol key (e.g. `KEY_VOLUP`) on a reachable device.
    pub async fn send_key(&self, address: &str, key_code: &str) -> CommandOutcome {
        self.executor
            .execute(address, &CommandPlan::key(key_code))
            .await
    }

    /// Pair with a device. With `force`, re-pairs even if a token is cached.
    pub async fn pair(&self, address: &str, force: bool) -> Result<Pairing, CoreError> {
        self.tokens.ensure_paired(address, force).await
    }

    pub async fn probe(&self, address: &str) -> bool {
        self.prober.is_reachable(address).await
    }

    pub fn forget_token(&self, address: &str) -> Result<(), CoreError> {
        if self.directory.get(address).is_none() {
            return Err(CoreError::DeviceNotFound {
                address: address.to_owned(),
            });
        }
        self.tokens.clear_token(address)
    }

    // ── Many devices ─────────────────────────────────────────────────

    pub async fn execute_bulk(
        &self,
        addresses: &[String],
        command_name: &str,
    ) -> Result<BulkResult, CoreError> {
        self.execute_bulk_with(addresses, command_name, &CancellationToken::new())
            .await
    }

    /// Bulk execution tied to `cancel`: cancelling it fails every
    /// unfinished device with a "Cancelled" outcome.
    pub async fn execute_bulk_with(
        &self,
        addresses: &[String],
        command_name: &str,
        cancel: &CancellationToken,
    ) -> Result<BulkResult, CoreError> {
        let plan = self.plan(command_name)?;
        let targets = dedupe_targets(addresses);
        if targets.is_empty() {
            return Err(CoreError::NoTargets);
        }
        Ok(self.bulk.run(targets, &plan, cancel).await)
    }

    /// Probe many devices concurrently. Results are in input order.
    pub async fn probe_all(&self, addresses: &[String]) -> Vec<(String, bool, std::time::Duration)> {
        let checks = dedupe_targets(addresses).into_iter().map(|address| async move {
            let started = Instant::now();
            let up = self.prober.is_reachable(&address).await;
            (address, up, started.elapsed())
        });
        futures_util::future::join_all(checks).await
    }
}

/// Trim, drop empties and duplicates, keep first-seen order.
fn dedupe_targets(addresses: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    addresses
        .iter()
        .map(String::as_str)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .filter(|a| seen.insert(*a))
        .map(str::to_owned)
        .collect()
}
