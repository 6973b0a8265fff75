// ── Session channel ──
//
// One short-lived WebSocket exchange per operation:
//   connect → read first frame (greeting) → optionally send → close.
//
// Sessions are never pooled. Callers open, do their one thing, and
// close, whatever the outcome.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::frames::{ControlFrame, Greeting, RemoteControl};
use crate::transport::TlsMode;

/// Close code reported when the peer vanished without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;

/// Opens sessions against a device endpoint.
#[async_trait]
pub trait SessionChannel: Send + Sync {
    /// Connect and read the greeting. `timeout` bounds both steps together.
    async fn open(&self, endpoint: &Endpoint, timeout: Duration)
    -> Result<Box<dyn Session>, Error>;
}

/// An open session whose greeting has already been read.
#[async_trait]
pub trait Session: Send {
    fn greeting(&self) -> &Greeting;

    /// Send one command frame.
    async fn send(&mut self, command: &RemoteControl) -> Result<(), Error>;

    /// Close the session. Errors are logged, never returned.
    async fn close(&mut self);
}

// ── WebSocket implementation ────────────────────────────────────────

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// [`SessionChannel`] over `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsChannel {
    tls: TlsMode,
}

impl WsChannel {
    pub fn new(tls: TlsMode) -> Self {
        Self { tls }
    }
}

#[async_trait]
impl SessionChannel for WsChannel {
    async fn open(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> Result<Box<dyn Session>, Error> {
        let connector = self.tls.connector()?;
        tracing::debug!(endpoint = %endpoint, "opening control channel");

        let handshake = async move {
            let (mut stream, _response) = tokio_tungstenite::connect_async_tls_with_config(
                endpoint.url().as_str(),
                None,
                false,
                connector,
            )
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

            match read_greeting(&mut stream, endpoint.has_token()).await {
                Ok(greeting) => Ok((stream, greeting)),
                Err(e) => {
                    let _ = stream.close(None).await;
                    Err(e)
                }
            }
        };

        let (stream, greeting) = tokio::time::timeout(timeout, handshake)
            .await
            .map_err(|_| Error::timeout(timeout))??;

        tracing::debug!(?greeting, "control channel greeting");
        Ok(Box::new(WsSession {
            stream,
            greeting,
            timeout,
            open: true,
        }))
    }
}

/// Read frames until the first text frame and classify it.
async fn read_greeting(stream: &mut WsStream, token_supplied: bool) -> Result<Greeting, Error> {
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let frame = ControlFrame::parse(text.as_str())?;
                return Ok(Greeting::classify(&frame, token_supplied));
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
            Some(Ok(Message::Binary(_))) => {
                return Err(Error::Frame {
                    message: "expected a text frame, got binary".into(),
                    body: String::new(),
                });
            }
            Some(Ok(Message::Close(frame))) => {
                let (code, reason) = frame.map_or((ABNORMAL_CLOSURE, String::new()), |cf| {
                    (u16::from(cf.code), cf.reason.as_str().to_owned())
                });
                return Err(Error::WebSocketClosed { code, reason });
            }
            Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
            None => {
                return Err(Error::WebSocketClosed {
                    code: ABNORMAL_CLOSURE,
                    reason: "stream ended before greeting".into(),
                });
            }
        }
    }
}

struct WsSession {
    stream: WsStream,
    greeting: Greeting,
    timeout: Duration,
    open: bool,
}

#[async_trait]
impl Session for WsSession {
    fn greeting(&self) -> &Greeting {
        &self.greeting
    }

    async fn send(&mut self, command: &RemoteControl) -> Result<(), Error> {
        let json = command.to_json()?;
        tracing::debug!(key = command.key(), "sending remote key");

        tokio::time::timeout(self.timeout, self.stream.send(Message::text(json)))
            .await
            .map_err(|_| Error::timeout(self.timeout))?
            .map_err(|e| Error::WebSocketConnect(e.to_string()))
    }

    async fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        match tokio::time::timeout(self.timeout, self.stream.close(None)).await {
            Ok(Ok(())) => tracing::trace!("control channel closed"),
            Ok(Err(e)) => tracing::debug!(error = %e, "control channel close failed"),
            Err(_) => tracing::debug!("control channel close timed out"),
        }
    }
}
