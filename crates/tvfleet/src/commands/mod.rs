//! Command dispatch: bridges CLI args -> `Fleet` calls -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod keys;
pub mod pair;
pub mod probe;
pub mod send;
pub mod util;

use std::path::PathBuf;
use std::sync::Arc;

use clap::ValueEnum;

use tvfleet_config::{Config, FileDirectory};
use tvfleet_core::{Fleet, KeyMap};

use crate::cli::{ColorMode, Command, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Everything a handler needs, resolved once from config + flags.
pub struct Context {
    pub config: Config,
    pub config_path: PathBuf,
    pub devices_path: PathBuf,
    pub keys_path: PathBuf,
    pub output: OutputFormat,
    pub color: bool,
    pub quiet: bool,
    pub yes: bool,
    workers: Option<usize>,
    deadline: Option<u64>,
}

impl Context {
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let config_path = global
            .config
            .clone()
            .unwrap_or_else(tvfleet_config::config_path);
        let config = tvfleet_config::load_config_from(&config_path)?;

        let output = match global.output {
            Some(format) => format,
            None => parse_setting::<OutputFormat>("defaults.output", &config.defaults.output)?,
        };
        let color = match global.color {
            Some(mode) => mode,
            None => parse_setting::<ColorMode>("defaults.color", &config.defaults.color)?,
        };
        if global.workers == Some(0) {
            return Err(CliError::Validation {
                field: "workers".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            devices_path: global.devices.clone().unwrap_or_else(|| config.devices_path()),
            keys_path: global.keys.clone().unwrap_or_else(|| config.keys_path()),
            workers: global.workers,
            deadline: global.deadline,
            output,
            color: output::should_color(color),
            quiet: global.quiet,
            yes: global.yes,
            config,
            config_path,
        })
    }

    pub fn directory(&self) -> Result<Arc<FileDirectory>, CliError> {
        Ok(Arc::new(FileDirectory::open(&self.devices_path)?))
    }

    pub fn keys(&self) -> Result<KeyMap, CliError> {
        Ok(tvfleet_config::load_keys(&self.keys_path)?)
    }

    /// Build a fleet over the file inventory and the real network stack.
    pub fn fleet(&self) -> Result<Fleet, CliError> {
        let mut fleet_config = self.config.to_fleet_config()?;
        if self.workers.is_some() {
            fleet_config.workers = self.workers;
        }
        if let Some(secs) = self.deadline {
            fleet_config.bulk_deadline = Some(std::time::Duration::from_secs(secs));
        }
        Ok(Fleet::with_network(
            fleet_config,
            self.directory()?,
            Arc::new(self.keys()?),
        ))
    }
}

fn parse_setting<T: ValueEnum>(field: &str, value: &str) -> Result<T, CliError> {
    T::from_str(value, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}

/// Dispatch a command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context) -> Result<(), CliError> {
    match cmd {
        Command::Send(args) => send::handle(ctx, &args.command, &args.targets).await,
        Command::PowerOn(targets) => send::handle(ctx, tvfleet_core::command::POWER_ON, &targets).await,
        Command::PowerOff(targets) => send::handle(ctx, tvfleet_core::command::POWER_OFF, &targets).await,
        Command::Key(args) => send::handle_key(ctx, &args).await,
        Command::Pair(args) => pair::handle(ctx, &args).await,
        Command::Probe(targets) => probe::handle(ctx, &targets).await,
        Command::Devices(args) => devices::handle(ctx, args),
        Command::Commands => keys::handle(ctx),
        Command::Config(args) => config_cmd::handle(ctx, &args),
        // Completions are handled before a context is built
        Command::Completions(_) => Ok(()),
    }
}
