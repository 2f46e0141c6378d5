//! Application settings blobs
//!
//! Branding, templates and network topology are stored as JSON values under
//! fixed keys in settings.json.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use serde_json::{Map, Value};

use crate::error::PackError;

use super::file_io::{read_json, write_json_atomic};

/// Branding key/value map (`logo_url`, `favicon_url`, `app_title`, ...)
pub const BRANDING: &str = "branding";
/// Device template definitions
pub const DEVICE_TEMPLATES: &str = "device_templates";
/// Switch template definitions
pub const SWITCH_TEMPLATES: &str = "switch_templates";
/// Template editor settings
pub const TEMPLATE_SETTINGS: &str = "template_settings";
/// Network devices
pub const NETWORK_DEVICES: &str = "network_devices";
/// Network connections
pub const NETWORK_CONNECTIONS: &str = "network_connections";
/// Switch port mappings
pub const PORT_MAPPINGS: &str = "port_mappings";
/// NIC mappings
pub const NIC_MAPPINGS: &str = "nic_mappings";

/// Branding entry holding the logo URL
pub const LOGO_URL: &str = "logo_url";
/// Branding entry holding the favicon URL
pub const FAVICON_URL: &str = "favicon_url";

/// Repository for keyed settings blobs
pub struct SettingsRepository {
    path: PathBuf,
    data: RwLock<BTreeMap<String, Value>>,
}

impl SettingsRepository {
    /// Create a new settings repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load settings from disk
    pub fn load(&self) -> Result<(), PackError> {
        let file_data: BTreeMap<String, Value> = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| PackError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        *data = file_data;
        Ok(())
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<(), PackError> {
        let data = self
            .data
            .read()
            .map_err(|e| PackError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        write_json_atomic(&self.path, &*data)
    }

    /// Get the value stored under a key
    pub fn get(&self, key: &str) -> Result<Option<Value>, PackError> {
        let data = self
            .data
            .read()
            .map_err(|e| PackError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.get(key).cloned())
    }

    /// Get an object-valued setting, empty if absent or not an object
    pub fn get_object(&self, key: &str) -> Result<Map<String, Value>, PackError> {
        Ok(match self.get(key)? {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        })
    }

    /// Get an array-valued setting, empty if absent or not an array
    pub fn get_array(&self, key: &str) -> Result<Vec<Value>, PackError> {
        Ok(match self.get(key)? {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        })
    }

    /// Store a value under a key, replacing what was there
    pub fn set(&self, key: &str, value: Value) -> Result<(), PackError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| PackError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.insert(key.to_string(), value);
        Ok(())
    }

    /// Remove every stored key, returning how many were removed
    pub fn clear(&self) -> Result<usize, PackError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| PackError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let count = data.len();
        data.clear();
        Ok(count)
    }
}
