pub mod device;
pub mod outcome;

pub use device::{AuthToken, DevicePatch, DeviceRecord, unknown_device_name};
pub use outcome::{BulkResult, CommandOutcome};
pub use tvfleet_api::MacAddress;
