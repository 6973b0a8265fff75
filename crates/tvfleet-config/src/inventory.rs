// ── File-backed inventory ──
//
// devices.toml:
//   [devices."10.0.0.21"]
//   name = "Lobby"
//   mac = "a4:30:7a:01:bc:ef"
//   broadcast = "10.0.0.255"
//   token = "11223344"
//
// keys.toml:
//   [keys]
//   volup = "KEY_VOLUP"
//
// The directory keeps the whole file in memory behind a mutex; every
// mutation rewrites the file (temp file + rename) while holding it, and
// the in-memory copy is rolled back if that write fails. The write is
// synchronous and short; async callers run it on a runtime worker.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tvfleet_core::{
    AuthToken, CoreError, DeviceDirectory, DevicePatch, DeviceRecord, KeyMap,
};

use crate::ConfigError;

// ── On-disk shapes ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Serialize)]
struct DevicesFile {
    #[serde(default)]
    devices: BTreeMap<String, DeviceEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct DeviceEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    broadcast: Option<Ipv4Addr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated: Option<DateTime<Utc>>,
}

impl DeviceEntry {
    fn into_record(self, address: &str) -> DeviceRecord {
        let mut record = DeviceRecord::new(address);
        record.name = self.name;
        record.mac = self.mac;
        record.broadcast = self.broadcast;
        record.model = self.model;
        record.token = self.token.filter(|t| !t.is_empty()).map(AuthToken::from);
        record.last_updated = self.last_updated;
        record
    }

    fn from_record(record: &DeviceRecord) -> Self {
        Self {
            name: record.name.clone(),
            mac: record.mac.clone(),
            broadcast: record.broadcast,
            model: record.model.clone(),
            token: record.token.as_ref().map(|t| t.expose().to_owned()),
            last_updated: record.last_updated,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct KeysFile {
    #[serde(default)]
    keys: KeyMap,
}

// ── FileDirectory ───────────────────────────────────────────────────

/// A [`DeviceDirectory`] persisted to a TOML file.
///
/// Mutations write the file synchronously. Called from async code they
/// block the current runtime worker for the length of one small write.
#[derive(Debug)]
pub struct FileDirectory {
    path: PathBuf,
    devices: Mutex<BTreeMap<String, DeviceRecord>>,
}

impl FileDirectory {
    /// Open `path`. A missing file is an empty inventory; it is created
    /// on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let devices = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            let file: DevicesFile = toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
            file.devices
                .into_iter()
                .map(|(address, entry)| {
                    let record = entry.into_record(&address);
                    (address, record)
                })
                .collect()
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), count = devices.len(), "device inventory loaded");
        Ok(Self {
            path,
            devices: Mutex::new(devices),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, DeviceRecord>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, devices: &BTreeMap<String, DeviceRecord>) -> Result<(), CoreError> {
        let file = DevicesFile {
            devices: devices
                .iter()
                .map(|(address, record)| (address.clone(), DeviceEntry::from_record(record)))
                .collect(),
        };
        let text = toml::to_string_pretty(&file).map_err(directory_error)?;
        write_atomic(&self.path, &text).map_err(directory_error)
    }
}

impl DeviceDirectory for FileDirectory {
    fn get(&self, address: &str) -> Option<DeviceRecord> {
        self.lock().get(address).cloned()
    }

    fn upsert(&self, address: &str, patch: DevicePatch) -> Result<DeviceRecord, CoreError> {
        let mut devices = self.lock();
        let mut record = devices
            .get(address)
            .cloned()
            .unwrap_or_else(|| DeviceRecord::new(address));
        record.apply(patch);
        let previous = devices.insert(address.to_owned(), record.clone());
        if let Err(err) = self.persist(&devices) {
            restore(&mut devices, address, previous);
            return Err(err);
        }
        Ok(record)
    }

    fn clear_token(&self, address: &str) -> Result<(), CoreError> {
        let mut devices = self.lock();
        let Some(record) = devices.get(address) else {
            return Ok(());
        };
        let mut cleared = record.clone();
        cleared.token = None;
        cleared.last_updated = Some(Utc::now());
        let previous = devices.insert(address.to_owned(), cleared);
        if let Err(err) = self.persist(&devices) {
            restore(&mut devices, address, previous);
            return Err(err);
        }
        Ok(())
    }

    fn remove(&self, address: &str) -> Result<Option<DeviceRecord>, CoreError> {
        let mut devices = self.lock();
        let removed = devices.remove(address);
        if removed.is_some() {
            if let Err(err) = self.persist(&devices) {
                restore(&mut devices, address, removed);
                return Err(err);
            }
        }
        Ok(removed)
    }

    fn list(&self) -> Vec<DeviceRecord> {
        self.lock().values().cloned().collect()
    }
}

/// Put `address` back to what it was before a failed write.
fn restore(
    devices: &mut BTreeMap<String, DeviceRecord>,
    address: &str,
    previous: Option<DeviceRecord>,
) {
    match previous {
        Some(record) => {
            devices.insert(address.to_owned(), record);
        }
        None => {
            devices.remove(address);
        }
    }
}

fn directory_error(err: impl std::fmt::Display) -> CoreError {
    CoreError::Directory {
        message: err.to_string(),
    }
}

/// Write to a sibling temp file, then rename over the target.
fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

// ── Key map ─────────────────────────────────────────────────────────

/// Load the key map. A missing file yields the built-in table.
pub fn load_keys(path: &Path) -> Result<KeyMap, ConfigError> {
    if !path.exists() {
        return Ok(KeyMap::default());
    }
    let text = std::fs::read_to_string(path)?;
    let file: KeysFile = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.keys)
}

pub fn save_keys(path: &Path, keys: &KeyMap) -> Result<(), ConfigError> {
    let text = toml::to_string_pretty(&KeysFile { keys: keys.clone() })?;
    write_atomic(path, &text)?;
    Ok(())
}
