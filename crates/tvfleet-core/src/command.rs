// ── Command routing ──
//
// A command name is resolved once per call into a closed `CommandKind`
// and then matched to the power controller or the dispatcher.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::directory::DeviceDirectory;
use crate::dispatcher::Dispatcher;
use crate::error::CoreError;
use crate::model::{CommandOutcome, unknown_device_name};
use crate::power::PowerController;
use crate::registry::CommandRegistry;

pub const POWER_ON: &str = "power-on";
pub const POWER_OFF: &str = "power-off";

/// What a command does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    PowerOn,
    PowerOff,
    /// A generic remote key, by protocol key code.
    Key(String),
}

/// A resolved command: the name the caller used, plus its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    pub name: String,
    pub kind: CommandKind,
}

impl CommandPlan {
    /// Resolve `name`. `power-on` / `power-off` never consult the registry.
    pub fn resolve(name: &str, registry: &dyn CommandRegistry) -> Result<Self, CoreError> {
        let kind = match name {
            POWER_ON => CommandKind::PowerOn,
            POWER_OFF => CommandKind::PowerOff,
            other => registry
                .resolve(other)
                .map(CommandKind::Key)
                .ok_or_else(|| CoreError::UnknownCommand {
                    name: other.to_owned(),
                })?,
        };
        Ok(Self {
            name: name.to_owned(),
            kind,
        })
    }

    pub fn power_on() -> Self {
        Self {
            name: POWER_ON.to_owned(),
            kind: CommandKind::PowerOn,
        }
    }

    pub fn power_off() -> Self {
        Self {
            name: POWER_OFF.to_owned(),
            kind: CommandKind::PowerOff,
        }
    }

    /// A raw key press, bypassing the registry.
    pub fn key(key_code: impl Into<String>) -> Self {
        let key_code = key_code.into();
        Self {
            name: key_code.clone(),
            kind: CommandKind::Key(key_code),
        }
    }
}

/// Runs one plan against one device and packages the outcome.
pub struct CommandExecutor {
    directory: Arc<dyn DeviceDirectory>,
    power: Arc<PowerController>,
    dispatcher: Arc<Dispatcher>,
}

impl CommandExecutor {
    pub fn new(
        directory: Arc<dyn DeviceDirectory>,
        power: Arc<PowerController>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            directory,
            power,
            dispatcher,
        }
    }

    pub async fn execute(&self, address: &str, plan: &CommandPlan) -> CommandOutcome {
        let started = Instant::now();
        tracing::debug!(address, command = %plan.name, "executing");

        let result = match &plan.kind {
            CommandKind::PowerOn => self.power.power_on(address).await,
            CommandKind::PowerOff => self.power.power_off(address).await,
            CommandKind::Key(code) => self.dispatcher.press(address, code).await,
        };

        let outcome = self.outcome(address, &plan.name, result, started.elapsed());
        if outcome.success {
            tracing::info!(address, command = %plan.name, message = %outcome.message, "command succeeded");
        } else {
            tracing::info!(address, command = %plan.name, message = %outcome.message, "command failed");
        }
        outcome
    }

    /// Build an outcome, filling in the device name from the directory.
    pub fn outcome(
        &self,
        address: &str,
        command: &str,
        result: Result<String, CoreError>,
        elapsed: Duration,
    ) -> CommandOutcome {
        let name = self
            .directory
            .get(address)
            .map_or_else(|| unknown_device_name(address), |d| d.display_name());
        let (success, message) = match result {
            Ok(message) => (true, message),
            Err(e) => (false, e.to_string()),
        };
        CommandOutcome {
            address: address.to_owned(),
            name,
            command: command.to_owned(),
            success,
            message,
            elapsed,
        }
    }
}
