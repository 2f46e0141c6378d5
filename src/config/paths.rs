//! Path management for dashpack
//!
//! Provides XDG-compliant path resolution for configuration, the target
//! store, uploaded assets, and import scratch space.
//!
//! ## Path Resolution Order
//!
//! 1. `DASHPACK_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/dashpack` or `~/.config/dashpack`
//! 3. Windows: `%APPDATA%\dashpack`

use std::path::PathBuf;

use crate::error::PackError;

/// Manages all paths used by dashpack
#[derive(Debug, Clone)]
pub struct DashPaths {
    /// Base directory for all dashpack data
    base_dir: PathBuf,
}

impl DashPaths {
    /// Create a new DashPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, PackError> {
        let base_dir = if let Ok(custom) = std::env::var("DASHPACK_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create DashPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/dashpack/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory holding the store's JSON files
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the directory holding binary assets served under `/uploads/`
    pub fn uploads_dir(&self) -> PathBuf {
        self.base_dir.join("uploads")
    }

    /// Get the root for per-import scratch directories
    pub fn scratch_dir(&self) -> PathBuf {
        self.base_dir.join("tmp")
    }

    /// Get the default directory for written archives
    pub fn exports_dir(&self) -> PathBuf {
        self.base_dir.join("exports")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to dashboards.json (dashboards, widgets, groups, layouts)
    pub fn dashboards_file(&self) -> PathBuf {
        self.data_dir().join("dashboards.json")
    }

    /// Get the path to integrations.json
    pub fn integrations_file(&self) -> PathBuf {
        self.data_dir().join("integrations.json")
    }

    /// Get the path to media.json (libraries and image metadata)
    pub fn media_file(&self) -> PathBuf {
        self.data_dir().join("media.json")
    }

    /// Get the path to settings.json (branding, templates, network blobs)
    pub fn app_settings_file(&self) -> PathBuf {
        self.data_dir().join("settings.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), PackError> {
        for (dir, label) in [
            (self.base_dir.clone(), "base"),
            (self.data_dir(), "data"),
            (self.uploads_dir(), "uploads"),
            (self.scratch_dir(), "scratch"),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                PackError::Io(format!("Failed to create {} directory: {}", label, e))
            })?;
        }

        Ok(())
    }

    /// Check if dashpack has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

/// Resolve the default data directory path based on platform
#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, PackError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let home = std::env::var("HOME").map_err(|_| {
                PackError::Config("Could not determine HOME directory".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("dashpack"))
}

/// Resolve the default data directory path based on platform
#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, PackError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| PackError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("dashpack"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = DashPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.data_dir(), temp_dir.path().join("data"));
        assert_eq!(paths.uploads_dir(), temp_dir.path().join("uploads"));
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = DashPaths::with_base_dir(temp_dir.path().to_path_buf());

        paths.ensure_directories().unwrap();

        assert!(paths.data_dir().exists());
        assert!(paths.uploads_dir().exists());
        assert!(paths.scratch_dir().exists());
    }

    #[test]
    fn test_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = DashPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
        assert_eq!(
            paths.dashboards_file(),
            temp_dir.path().join("data").join("dashboards.json")
        );
    }
}
