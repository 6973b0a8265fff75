// ── Core error types ──
//
// Domain errors from tvfleet-core. Variants that end up in a
// `CommandOutcome` display as the bare operator-facing message; the
// outcome message is always `err.to_string()`.
//
// The `From<tvfleet_api::Error>` impl translates transport-layer errors
// into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Device state ─────────────────────────────────────────────────
    #[error("Device is off.")]
    DeviceOff,

    #[error("Device {address} is not registered.")]
    DeviceNotFound { address: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication token not available")]
    TokenUnavailable,

    /// The device rejected our token. The cached token has been cleared.
    #[error("{message}")]
    Unauthorized { message: String },

    /// The device answered with something other than `ms.channel.connect`.
    #[error("{message}")]
    Rejected { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No MAC address configured.")]
    NoMacAddress,

    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },

    #[error("No target devices given")]
    NoTargets,

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Transport ────────────────────────────────────────────────────
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("{message}")]
    Wake { message: String },

    #[error("Protocol error: {message}")]
    Protocol { message: String },

    // ── Directory ────────────────────────────────────────────────────
    #[error("Device directory error: {message}")]
    Directory { message: String },

    // ── Task boundary ────────────────────────────────────────────────
    #[error("Cancelled")]
    Cancelled,

    #[error("Deadline of {timeout_secs}s exceeded")]
    DeadlineExceeded { timeout_secs: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Token rejected or pairing impossible. Self-heals on the next call.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::TokenUnavailable | Self::Unauthorized { .. })
    }

    /// Network conditions; safe for the caller to retry later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::DeviceOff
                | Self::ConnectionFailed { .. }
                | Self::Timeout { .. }
                | Self::Wake { .. }
                | Self::Rejected { .. }
        )
    }

    /// Bad local setup; retrying will not help.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::NoMacAddress
                | Self::UnknownCommand { .. }
                | Self::NoTargets
                | Self::Config { .. }
                | Self::DeviceNotFound { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tvfleet_api::Error> for CoreError {
    fn from(err: tvfleet_api::Error) -> Self {
        use tvfleet_api::Error as Api;

        match err {
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Tls(msg) => CoreError::ConnectionFailed {
                reason: format!("TLS error: {msg}"),
            },
            Api::WebSocketConnect(reason) => CoreError::ConnectionFailed { reason },
            Api::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                reason: format!("closed by device (code {code}): {reason}"),
            },
            Api::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            Api::Frame { message, body: _ } => CoreError::Protocol { message },
            Api::Encode(e) => CoreError::Internal(format!("encode error: {e}")),
            e @ (Api::InvalidMac(_) | Api::Wake(_)) => CoreError::Wake {
                message: e.to_string(),
            },
        }
    }
}
