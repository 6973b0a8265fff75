// ── Protocol frames ──
//
// Inbound: JSON control frames `{ "event": ..., "data": { "token": ... } }`.
// Outbound: one remote-key click per session.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Event sent when the channel is ready (token accepted, if one was given).
pub const CHANNEL_CONNECT: &str = "ms.channel.connect";

/// Event sent when the supplied token was rejected.
pub const CHANNEL_UNAUTHORIZED: &str = "ms.channel.unauthorized";

/// Method name of remote-control command frames.
pub const REMOTE_CONTROL_METHOD: &str = "ms.remote.control";

// ── Inbound ─────────────────────────────────────────────────────────

/// Raw control frame as the device sends it.
///
/// `data` is kept loosely typed: devices attach client lists and ids
/// we never look at, and only `data.token` matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlFrame {
    #[serde(default)]
    pub event: Option<String>,

    #[serde(default)]
    pub data: Option<serde_json::Value>,

    #[serde(default)]
    pub message: Option<String>,
}

impl ControlFrame {
    /// Decode a text frame.
    pub fn parse(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::Frame {
            message: e.to_string(),
            body: text.to_owned(),
        })
    }

    /// The token issued in `data.token`, if any. Numeric tokens are accepted.
    pub fn token(&self) -> Option<String> {
        let token = self.data.as_ref()?.get("token")?;
        match token {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// The first frame of a session, classified.
#[derive(Debug, Clone)]
pub enum Greeting {
    /// `ms.channel.connect`: ready for commands.
    Ready,

    /// A freshly issued token (only when the session was opened without one).
    Paired { token: SecretString },

    /// `ms.channel.unauthorized`: the supplied token was rejected.
    Unauthorized { message: Option<String> },

    /// Any other event.
    Rejected {
        event: Option<String>,
        message: Option<String>,
    },
}

impl Greeting {
    /// Classify a control frame.
    ///
    /// A token in the frame only counts as a pairing response when the
    /// session was opened without one; otherwise `connect` is plain `Ready`.
    pub fn classify(frame: &ControlFrame, token_supplied: bool) -> Self {
        let event = frame.event.as_deref();

        if event == Some(CHANNEL_UNAUTHORIZED) {
            return Self::Unauthorized {
                message: frame.message.clone(),
            };
        }

        if !token_supplied {
            if let Some(token) = frame.token() {
                return Self::Paired {
                    token: SecretString::from(token),
                };
            }
        }

        if event == Some(CHANNEL_CONNECT) {
            Self::Ready
        } else {
            Self::Rejected {
                event: frame.event.clone(),
                message: frame.message.clone(),
            }
        }
    }

    /// Server-provided message, if the frame carried one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message } | Self::Rejected { message, .. } => message.as_deref(),
            Self::Ready | Self::Paired { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

// ── Outbound ────────────────────────────────────────────────────────

/// A remote-key press: `{"method":"ms.remote.control","params":{...}}`.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteControl {
    method: &'static str,
    params: RemoteKeyParams,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RemoteKeyParams {
    cmd: &'static str,
    data_of_cmd: String,
    option: &'static str,
    type_of_remote: &'static str,
}

impl RemoteControl {
    /// A single click of `key` (e.g. `KEY_VOLUP`).
    pub fn click(key: impl Into<String>) -> Self {
        Self {
            method: REMOTE_CONTROL_METHOD,
            params: RemoteKeyParams {
                cmd: "Click",
                data_of_cmd: key.into(),
                option: "false",
                type_of_remote: "SendRemoteKey",
            },
        }
    }

    pub fn key(&self) -> &str {
        &self.params.data_of_cmd
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}
