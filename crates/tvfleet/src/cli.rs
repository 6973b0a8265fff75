//! Clap derive structures for the `tvfleet` CLI.
//!
//! Also compiled by build.rs for man pages, so this file may only use
//! clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tvfleet -- control a fleet of Samsung smart TVs
#[derive(Debug, Parser)]
#[command(
    name = "tvfleet",
    version,
    about = "Control Samsung smart TVs from the command line",
    long_about = "Send remote-control keys to one or many Samsung smart TVs over their\n\
        local WebSocket control channel, pair with new sets, and switch them\n\
        on (Wake-on-LAN) or off.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (default: platform config dir)
    #[arg(long, env = "TVFLEET_CONFIG", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Device inventory file (overrides config)
    #[arg(long, env = "TVFLEET_DEVICES", global = true, value_name = "PATH")]
    pub devices: Option<PathBuf>,

    /// Key map file (overrides config)
    #[arg(long, env = "TVFLEET_KEYS", global = true, value_name = "PATH")]
    pub keys: Option<PathBuf>,

    /// Output format (default from config, else table)
    #[arg(long, short = 'o', env = "TVFLEET_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Concurrent devices in bulk commands (default: all targets at once)
    #[arg(long, short = 'w', env = "TVFLEET_WORKERS", global = true)]
    pub workers: Option<usize>,

    /// Per-device deadline in seconds for bulk commands
    #[arg(long, global = true, value_name = "SECS")]
    pub deadline: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a named command to one or more devices
    #[command(alias = "s")]
    Send(SendArgs),

    /// Wake devices and wait until they answer
    PowerOn(TargetArgs),

    /// Switch devices off
    PowerOff(TargetArgs),

    /// Press a raw protocol key (e.g. KEY_VOLUP) on one device
    Key(KeyArgs),

    /// Pair with a device (accept the prompt on the TV)
    Pair(PairArgs),

    /// Check which devices answer on the network
    Probe(TargetArgs),

    /// Manage the device inventory
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// List command names and their key codes
    #[command(alias = "keys")]
    Commands,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Target Arguments ──────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Device addresses, comma separated, or `all` for the whole inventory
    #[arg(long, short = 't', value_delimiter = ',', required = true, num_args = 1..)]
    pub target: Vec<String>,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Command name (see `tvfleet commands`)
    pub command: String,

    #[command(flatten)]
    pub targets: TargetArgs,
}

#[derive(Debug, Args)]
pub struct KeyArgs {
    /// Device address
    pub address: String,

    /// Protocol key code
    #[arg(value_name = "KEY_CODE")]
    pub key_code: String,
}

#[derive(Debug, Args)]
pub struct PairArgs {
    /// Device address
    pub address: String,

    /// Pair again even if a token is already stored
    #[arg(long, short = 'f')]
    pub force: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List known devices
    #[command(alias = "ls")]
    List,

    /// Show one device
    Show {
        /// Device address
        address: String,
    },

    /// Add a device, or update fields of an existing one
    Add {
        /// Device address (IP or hostname)
        address: String,

        /// Friendly name
        #[arg(long)]
        name: Option<String>,

        /// Hardware address for Wake-on-LAN
        #[arg(long)]
        mac: Option<String>,

        /// Broadcast address for wake packets (IPv4)
        #[arg(long)]
        broadcast: Option<String>,

        /// Model string
        #[arg(long)]
        model: Option<String>,
    },

    /// Remove a device from the inventory
    #[command(alias = "rm")]
    Remove {
        /// Device address
        address: String,
    },

    /// Drop the stored pairing token
    ForgetToken {
        /// Device address
        address: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display the resolved configuration
    Show,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
