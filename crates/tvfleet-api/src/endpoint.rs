// ── Control endpoint ──
//
// wss://{host}:{port}/api/v2/channels/samsung.remote.control?name=<b64>[&token=<t>]
//
// The query string is assembled by hand: devices expect the base64 app
// name verbatim (padding `=` included), which `Url::query_pairs_mut`
// would percent-encode.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use url::Url;

use crate::error::Error;

/// Default TLS port of the remote-control channel.
pub const DEFAULT_PORT: u16 = 8002;

/// Path of the remote-control channel.
pub const CHANNEL_PATH: &str = "/api/v2/channels/samsung.remote.control";

/// A fully-built channel URL, plus whether it carries a token.
///
/// `Debug` and [`redacted`](Self::redacted) mask the token so the URL can
/// be logged safely.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
    has_token: bool,
}

impl Endpoint {
    /// Build the remote-control endpoint for a device.
    ///
    /// `host` may be an IPv4 address, a hostname, or a bare IPv6 address
    /// (brackets are added).
    pub fn remote_control(
        host: &str,
        port: u16,
        app_name: &str,
        token: Option<&str>,
    ) -> Result<Self, Error> {
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_owned()
        };
        let name = STANDARD.encode(app_name.as_bytes());

        let mut raw = format!("wss://{host}:{port}{CHANNEL_PATH}?name={name}");
        if let Some(token) = token {
            raw.push_str("&token=");
            raw.push_str(token);
        }

        Ok(Self {
            url: Url::parse(&raw)?,
            has_token: token.is_some(),
        })
    }

    /// Wrap an arbitrary URL (custom gateways, loopback test servers).
    pub fn from_url(url: Url) -> Self {
        let has_token = url.query_pairs().any(|(k, _)| k == "token");
        Self { url, has_token }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the URL carries an authentication token.
    pub fn has_token(&self) -> bool {
        self.has_token
    }

    /// The URL with the token value replaced by `****`.
    pub fn redacted(&self) -> String {
        let raw = self.url.as_str();
        match raw.find("token=") {
            Some(start) => {
                let value_start = start + "token=".len();
                let value_end = raw[value_start..]
                    .find('&')
                    .map_or(raw.len(), |i| value_start + i);
                format!("{}****{}", &raw[..value_start], &raw[value_end..])
            }
            None => raw.to_owned(),
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("url", &self.redacted())
            .field("has_token", &self.has_token)
            .finish()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}
