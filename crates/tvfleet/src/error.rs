//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use tvfleet_config::ConfigError;
use tvfleet_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Devices ──────────────────────────────────────────────────────
    #[error("No devices in the inventory")]
    #[diagnostic(
        code(tvfleet::no_devices),
        help(
            "Add one with: tvfleet devices add <address> --mac <mac>\n\
             Inventory file: {path}"
        )
    )]
    NoDevices { path: String },

    #[error("Device '{address}' not found")]
    #[diagnostic(
        code(tvfleet::not_found),
        help("Run: tvfleet devices list to see known devices")
    )]
    DeviceNotFound { address: String },

    #[error("Unknown command '{name}'")]
    #[diagnostic(
        code(tvfleet::unknown_command),
        help("Run: tvfleet commands to see available names")
    )]
    UnknownCommand { name: String },

    // ── Device interaction ───────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(tvfleet::auth_failed),
        help(
            "The device refused the pairing request or stored token.\n\
             Re-pair with: tvfleet pair <address> --force"
        )
    )]
    AuthFailed { message: String },

    #[error("Could not reach device: {reason}")]
    #[diagnostic(
        code(tvfleet::connection_failed),
        help(
            "Check that the TV is on and on the same network.\n\
             Try: tvfleet probe --target <address>"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Timed out after {seconds}s")]
    #[diagnostic(
        code(tvfleet::timeout),
        help("Pairing waits for someone to accept the prompt on the TV.")
    )]
    Timeout { seconds: u64 },

    #[error("{failed} of {total} devices failed")]
    #[diagnostic(code(tvfleet::partial_failure))]
    PartialFailure { failed: usize, total: usize },

    #[error("{message}")]
    #[diagnostic(code(tvfleet::core))]
    Core { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tvfleet::validation))]
    Validation { field: String, reason: String },

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(tvfleet::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(tvfleet::config),
        help("Check the file with: tvfleet config show")
    )]
    Config(#[from] ConfigError),

    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(tvfleet::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NoDevices { .. } | Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::UnknownCommand { .. }
            | Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ConfigExists { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DeviceNotFound { address } => Self::DeviceNotFound { address },
            CoreError::UnknownCommand { name } => Self::UnknownCommand { name },
            CoreError::NoTargets => Self::Validation {
                field: "target".into(),
                reason: "no device addresses given".into(),
            },
            CoreError::TokenUnavailable
            | CoreError::Unauthorized { .. }
            | CoreError::Rejected { .. } => Self::AuthFailed {
                message: err.to_string(),
            },
            CoreError::DeviceOff | CoreError::ConnectionFailed { .. } => Self::ConnectionFailed {
                reason: err.to_string(),
            },
            CoreError::Timeout { timeout_secs } | CoreError::DeadlineExceeded { timeout_secs } => {
                Self::Timeout {
                    seconds: timeout_secs,
                }
            }
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            other => Self::Core {
                message: other.to_string(),
            },
        }
    }
}
