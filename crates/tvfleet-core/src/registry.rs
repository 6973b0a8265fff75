// ── Command registry ──
//
// Human command names → protocol key codes. `power-on` / `power-off`
// appear in the table for listing, but are routed to the power
// controller before any lookup.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Read-only lookup of command names.
pub trait CommandRegistry: Send + Sync {
    /// Key code for `name`, or `None` if unrecognized.
    fn resolve(&self, name: &str) -> Option<String>;

    /// Every `(name, key code)` pair, in table order.
    fn entries(&self) -> Vec<(String, String)>;
}

/// The built-in remote-control table.
pub const DEFAULT_KEYS: &[(&str, &str)] = &[
    ("power-on", "WOL"),
    ("power-off", "KEY_POWER"),
    ("volup", "KEY_VOLUP"),
    ("voldown", "KEY_VOLDOWN"),
    ("mute", "KEY_MUTE"),
    ("chup", "KEY_CHUP"),
    ("chdown", "KEY_CHDOWN"),
    ("menu", "KEY_MENU"),
    ("home", "KEY_HOME"),
    ("source", "KEY_SOURCE"),
    ("guide", "KEY_GUIDE"),
    ("up", "KEY_UP"),
    ("down", "KEY_DOWN"),
    ("left", "KEY_LEFT"),
    ("right", "KEY_RIGHT"),
    ("enter", "KEY_ENTER"),
    ("return", "KEY_RETURN"),
    ("hdmi1", "KEY_HDMI1"),
    ("hdmi2", "KEY_HDMI2"),
    ("hdmi3", "KEY_HDMI3"),
    ("hdmi4", "KEY_HDMI4"),
];

/// Ordered key map. Serializes as a plain `name = "KEY_..."` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyMap(IndexMap<String, String>);

impl Default for KeyMap {
    fn default() -> Self {
        DEFAULT_KEYS
            .iter()
            .map(|(name, key)| ((*name).to_owned(), (*key).to_owned()))
            .collect()
    }
}

impl FromIterator<(String, String)> for KeyMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl KeyMap {
    pub fn insert(&mut self, name: impl Into<String>, key: impl Into<String>) {
        self.0.insert(name.into(), key.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl CommandRegistry for KeyMap {
    fn resolve(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}
