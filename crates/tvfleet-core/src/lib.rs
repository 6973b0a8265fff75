// tvfleet-core: device control logic between tvfleet-api and front ends.
//
// Owns the token lifecycle, command routing, power-state policy and the
// bulk fan-out. Storage is abstracted behind `DeviceDirectory` and
// `CommandRegistry`; the network behind the tvfleet-api traits.

pub mod bulk;
pub mod command;
pub mod config;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod fleet;
pub mod model;
pub mod pairing;
pub mod power;
pub mod registry;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{CommandKind, CommandPlan};
pub use config::{FleetConfig, ProbeMethod, TlsVerification};
pub use directory::{DeviceDirectory, MemoryDirectory};
pub use error::CoreError;
pub use fleet::{Collaborators, Fleet};
pub use model::{AuthToken, BulkResult, CommandOutcome, DevicePatch, DeviceRecord, MacAddress};
pub use pairing::Pairing;
pub use registry::{CommandRegistry, KeyMap};

// Cancellation handle accepted by `Fleet::execute_bulk_with`.
pub use tokio_util::sync::CancellationToken;
