use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `tvfleet-api` crate.
///
/// Covers every wire-level failure mode: endpoint construction, TLS setup,
/// the WebSocket exchange, frame decoding and Wake-on-LAN emission.
/// `tvfleet-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Endpoint ────────────────────────────────────────────────────
    /// The control endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Transport ───────────────────────────────────────────────────
    /// TLS configuration or handshake error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// WebSocket connection failed (refused, reset, handshake rejected).
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed before the exchange finished.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// Connect, greeting or send did not finish in time.
    #[error("Timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data ────────────────────────────────────────────────────────
    /// The device sent a frame we could not decode, with the raw body for debugging.
    #[error("Malformed frame: {message}")]
    Frame { message: String, body: String },

    /// A command frame could not be encoded.
    #[error("Failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),

    // ── Wake-on-LAN ─────────────────────────────────────────────────
    /// Hardware address is not 6 bytes of hex after stripping separators.
    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    /// The broadcast datagram could not be emitted.
    #[error("Error sending wake packet: {0}")]
    Wake(#[source] std::io::Error),
}

impl Error {
    /// A timeout after `after`, reported in whole seconds rounded up.
    pub fn timeout(after: Duration) -> Self {
        Self::Timeout {
            timeout_secs: ceil_secs(after),
        }
    }

    /// Returns `true` if this is a transient error worth retrying later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::WebSocketConnect(_) | Self::WebSocketClosed { .. } | Self::Timeout { .. }
        )
    }

    /// Returns `true` for errors caused by bad local input rather than the network.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidUrl(_) | Self::InvalidMac(_) | Self::Tls(_))
    }
}

/// Whole seconds in `duration`, rounding any fraction up so sub-second
/// budgets never render as `0s`.
pub fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}
