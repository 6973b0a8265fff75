// ── Device directory ──
//
// Key-value store of device records, keyed by network address. All token
// mutation in the core goes through `upsert` / `clear_token`; each call
// must be atomic per key.

use dashmap::DashMap;

use crate::error::CoreError;
use crate::model::{DevicePatch, DeviceRecord};

/// Storage for device records.
pub trait DeviceDirectory: Send + Sync {
    fn get(&self, address: &str) -> Option<DeviceRecord>;

    /// Create or update a record, returning the stored result.
    fn upsert(&self, address: &str, patch: DevicePatch) -> Result<DeviceRecord, CoreError>;

    /// Drop the cached token. No-op for unknown addresses.
    fn clear_token(&self, address: &str) -> Result<(), CoreError>;

    /// Delete a record, returning it if it existed.
    fn remove(&self, address: &str) -> Result<Option<DeviceRecord>, CoreError>;

    /// All records, ordered by address.
    fn list(&self) -> Vec<DeviceRecord>;
}

/// In-memory directory backed by a `DashMap`.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    devices: DashMap<String, DeviceRecord>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from existing records.
    pub fn with_devices(devices: impl IntoIterator<Item = DeviceRecord>) -> Self {
        let map = DashMap::new();
        for device in devices {
            map.insert(device.address.clone(), device);
        }
        Self { devices: map }
    }
}

impl DeviceDirectory for MemoryDirectory {
    fn get(&self, address: &str) -> Option<DeviceRecord> {
        self.devices.get(address).map(|r| r.value().clone())
    }

    fn upsert(&self, address: &str, patch: DevicePatch) -> Result<DeviceRecord, CoreError> {
        let mut entry = self
            .devices
            .entry(address.to_owned())
            .or_insert_with(|| DeviceRecord::new(address));
        entry.apply(patch);
        Ok(entry.value().clone())
    }

    fn clear_token(&self, address: &str) -> Result<(), CoreError> {
        if let Some(mut device) = self.devices.get_mut(address) {
            device.token = None;
            device.last_updated = Some(chrono::Utc::now());
        }
        Ok(())
    }

    fn remove(&self, address: &str) -> Result<Option<DeviceRecord>, CoreError> {
        Ok(self.devices.remove(address).map(|(_, device)| device))
    }

    fn list(&self) -> Vec<DeviceRecord> {
        let mut devices: Vec<DeviceRecord> =
            self.devices.iter().map(|r| r.value().clone()).collect();
        devices.sort_by(|a, b| a.address.cmp(&b.address));
        devices
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::AuthToken;

    #[test]
    fn upsert_creates_then_merges() {
        let dir = MemoryDirectory::new();
        dir.upsert(
            "10.0.0.2",
            DevicePatch {
                name: Some("Bar".into()),
                ..DevicePatch::default()
            },
        )
        .unwrap();
        let stored = dir.upsert("10.0.0.2", DevicePatch::token(AuthToken::new("t"))).unwrap();

        assert_eq!(stored.name.as_deref(), Some("Bar"));
        assert!(stored.has_token());
    }

    #[test]
    fn clear_token_keeps_record() {
        let dir = MemoryDirectory::new();
        dir.upsert("10.0.0.2", DevicePatch::token(AuthToken::new("t"))).unwrap();
        dir.clear_token("10.0.0.2").unwrap();

        let device = dir.get("10.0.0.2").unwrap();
        assert!(!device.has_token());
        dir.clear_token("10.0.0.99").unwrap();
        assert!(dir.get("10.0.0.99").is_none());
    }

    #[test]
    fn list_is_sorted() {
        let dir = MemoryDirectory::with_devices(
            ["10.0.0.3", "10.0.0.1", "10.0.0.2"].map(DeviceRecord::new),
        );
        let addresses: Vec<_> = dir.list().into_iter().map(|d| d.address).collect();
        assert_eq!(addresses, ["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        assert!(dir.remove("10.0.0.1").unwrap().is_some());
        assert_eq!(dir.list().len(), 2);
    }
}
