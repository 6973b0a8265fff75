// tvfleet-api: wire-level pieces for talking to networked displays.
//
// Everything in here is stateless with respect to devices: the session
// channel speaks one framed exchange, the wake signaler emits one
// datagram, the prober answers one liveness question. Token caching and
// power-state policy live in `tvfleet-core`.

pub mod endpoint;
pub mod error;
pub mod frames;
pub mod mac;
pub mod probe;
pub mod session;
pub mod transport;
pub mod wake;

pub use endpoint::Endpoint;
pub use error::Error;
pub use frames::{ControlFrame, Greeting, RemoteControl};
pub use mac::MacAddress;
pub use probe::{PingProber, Prober, TcpProber};
pub use session::{Session, SessionChannel, WsChannel};
pub use transport::TlsMode;
pub use wake::{UdpWakeSignaler, WakeSignaler};
