use thiserror::Error;
use tracing::debug;

use crate::settings::{Settings, SettingsPatch};

/// Client storage key for the persisted form. Bump the suffix if the layout ever
/// changes incompatibly.
pub const SETTINGS_KEY: &str = "reko:ui:v1";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("local storage is unavailable")]
    Unavailable,
    #[error("storage rejected the write: {0}")]
    Rejected(String),
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Read the persisted settings. Every failure reads as "nothing stored".
pub fn load_settings(store: &dyn KeyValueStore) -> Option<SettingsPatch> {
    let raw = match store.get(SETTINGS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            debug!("settings load skipped: {err}");
            return None;
        }
    };

    let value = match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => value,
        Err(err) => {
            debug!("ignoring unreadable stored settings: {err}");
            return None;
        }
    };
    SettingsPatch::from_json(&value)
}

/// Best-effort write; quota or availability problems are dropped.
pub fn save_settings(store: &dyn KeyValueStore, settings: &Settings) {
    let encoded = match serde_json::to_string(settings) {
        Ok(encoded) => encoded,
        Err(err) => {
            debug!("settings not encodable: {err}");
            return;
        }
    };
    if let Err(err) = store.set(SETTINGS_KEY, &encoded) {
        debug!("settings save skipped: {err}");
    }
}
