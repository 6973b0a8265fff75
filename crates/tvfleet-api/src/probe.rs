// ── Reachability probes ──
//
// A probe answers one question: does the device answer right now?
// Failures of any kind (spawn error, refused, timeout) read as "no".

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::process::Command;

use crate::endpoint::DEFAULT_PORT;

/// Default wait for a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Liveness check for a device address.
#[async_trait]
pub trait Prober: Send + Sync {
    /// `true` if the device answered within the probe's timeout.
    async fn is_reachable(&self, address: &str) -> bool;
}

// ── TCP connect ─────────────────────────────────────────────────────

/// Probes by opening (and dropping) a TCP connection to the control port.
#[derive(Debug, Clone, Copy)]
pub struct TcpProber {
    port: u16,
    timeout: Duration,
}

impl Default for TcpProber {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl TcpProber {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn is_reachable(&self, address: &str) -> bool {
        let target = if address.contains(':') && !address.starts_with('[') {
            format!("[{address}]:{}", self.port)
        } else {
            format!("{address}:{}", self.port)
        };

        match tokio::time::timeout(self.timeout, TcpStream::connect(&target)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                tracing::trace!(%target, error = %e, "tcp probe refused");
                false
            }
            Err(_) => {
                tracing::trace!(%target, "tcp probe timed out");
                false
            }
        }
    }
}

// ── ICMP echo ───────────────────────────────────────────────────────

/// Probes with a single echo request via the system `ping` binary.
#[derive(Debug, Clone, Copy)]
pub struct PingProber {
    timeout: Duration,
}

impl Default for PingProber {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl PingProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn args(&self, address: &str) -> Vec<String> {
        if cfg!(windows) {
            let millis = self.timeout.as_millis().max(1);
            vec!["-n".into(), "1".into(), "-w".into(), millis.to_string(), address.into()]
        } else {
            let secs = self.timeout.as_secs().max(1);
            vec!["-c".into(), "1".into(), "-W".into(), secs.to_string(), address.into()]
        }
    }
}

#[async_trait]
impl Prober for PingProber {
    async fn is_reachable(&self, address: &str) -> bool {
        // An address starting with '-' would be read as a ping option.
        if address.is_empty() || address.starts_with('-') {
            return false;
        }

        let mut command = Command::new("ping");
        command
            .args(self.args(address))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        // Grace period on top of ping's own deadline.
        let deadline = self.timeout + Duration::from_secs(1);
        match tokio::time::timeout(deadline, command.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "failed to run ping");
                false
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn tcp_probe_sees_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.ok();
        let Some(listener) = listener else { return };
        let port = listener.local_addr().map(|a| a.port()).unwrap_or_default();

        let prober = TcpProber::new(port, Duration::from_secs(1));
        assert!(prober.is_reachable("127.0.0.1").await);
    }

    #[tokio::test]
    async fn tcp_probe_refused_is_unreachable() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.ok();
            listener
                .and_then(|l| l.local_addr().ok())
                .map_or(1, |a| a.port())
        };
        let prober = TcpProber::new(port, Duration::from_millis(500));
        assert!(!prober.is_reachable("127.0.0.1").await);
    }

    #[tokio::test]
    async fn ping_rejects_option_like_addresses() {
        let prober = PingProber::default();
        assert!(!prober.is_reachable("-f").await);
        assert!(!prober.is_reachable("").await);
    }

    #[test]
    fn ping_args_end_with_address() {
        let args = PingProber::new(Duration::from_millis(1500)).args("10.0.0.5");
        assert_eq!(args.last().map(String::as_str), Some("10.0.0.5"));
        assert_eq!(args.get(1).map(String::as_str), Some("1"));
    }
}
