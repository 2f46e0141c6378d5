//! User settings for dashpack
//!
//! Manages the producer identity written into manifests, the key-derivation
//! cost used for new credential payloads, and export/import defaults.

use serde::{Deserialize, Serialize};

use super::paths::DashPaths;
use crate::error::PackError;

/// Argon2id cost parameters applied when encrypting new credential payloads
///
/// Decryption always uses the parameters stored in the payload itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDerivationCost {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub memory_cost: u32,
    /// Time cost (iterations)
    pub time_cost: u32,
    /// Parallelism degree
    pub parallelism: u32,
}

impl Default for KeyDerivationCost {
    fn default() -> Self {
        Self {
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

/// User settings for dashpack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Producer identifier recorded in every manifest
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Key derivation cost for credentialed exports
    #[serde(default)]
    pub key_derivation: KeyDerivationCost,

    /// Whether imports verify manifest checksums unless told otherwise
    #[serde(default = "default_true")]
    pub verify_checksums: bool,

    /// Filename prefix for written archives
    #[serde(default = "default_export_prefix")]
    pub export_prefix: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_instance_name() -> String {
    "dashpack".to_string()
}

fn default_true() -> bool {
    true
}

fn default_export_prefix() -> String {
    "dashboard-backup".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            instance_name: default_instance_name(),
            key_derivation: KeyDerivationCost::default(),
            verify_checksums: true,
            export_prefix: default_export_prefix(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &DashPaths) -> Result<Self, PackError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| PackError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                PackError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &DashPaths) -> Result<(), PackError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| PackError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(&settings_path, contents)
            .map_err(|e| PackError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.instance_name, "dashpack");
        assert!(settings.verify_checksums);
        assert_eq!(settings.key_derivation.memory_cost, 65536);
        assert_eq!(settings.export_prefix, "dashboard-backup");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = DashPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.instance_name = "lab-display".into();
        settings.verify_checksums = false;

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.instance_name, "lab-display");
        assert!(!loaded.verify_checksums);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let loaded: Settings = serde_json::from_str(r#"{"instance_name": "x"}"#).unwrap();
        assert_eq!(loaded.instance_name, "x");
        assert!(loaded.verify_checksums);
        assert_eq!(loaded.key_derivation, KeyDerivationCost::default());
    }
}
