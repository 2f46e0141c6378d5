//! Storage layer for dashpack
//!
//! The target store the pipeline reads from and writes into: JSON tables
//! with atomic writes plus a flat directory of uploaded assets.

pub mod assets;
pub mod dashboards;
pub mod file_io;
pub mod integrations;
pub mod media;
pub mod settings;

pub use assets::{AssetStore, StoredAsset};
pub use dashboards::DashboardRepository;
pub use file_io::{read_json, write_json_atomic};
pub use integrations::IntegrationRepository;
pub use media::MediaRepository;
pub use settings::SettingsRepository;

use serde::Serialize;

use crate::config::paths::DashPaths;
use crate::error::PackError;

/// Entity totals across the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub dashboards: usize,
    pub widgets: usize,
    pub groups: usize,
    pub integrations: usize,
    pub libraries: usize,
    pub images: usize,
}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: DashPaths,
    pub dashboards: DashboardRepository,
    pub integrations: IntegrationRepository,
    pub media: MediaRepository,
    pub settings: SettingsRepository,
    pub assets: AssetStore,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: DashPaths) -> Result<Self, PackError> {
        paths.ensure_directories()?;

        Ok(Self {
            dashboards: DashboardRepository::new(paths.dashboards_file()),
            integrations: IntegrationRepository::new(paths.integrations_file()),
            media: MediaRepository::new(paths.media_file()),
            settings: SettingsRepository::new(paths.app_settings_file()),
            assets: AssetStore::new(paths.uploads_dir()),
            paths,
        })
    }

    /// Open the store and load everything from disk
    pub fn open(paths: DashPaths) -> Result<Self, PackError> {
        let storage = Self::new(paths)?;
        storage.load_all()?;
        Ok(storage)
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &DashPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), PackError> {
        self.dashboards.load()?;
        self.integrations.load()?;
        self.media.load()?;
        self.settings.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), PackError> {
        self.dashboards.save()?;
        self.integrations.save()?;
        self.media.save()?;
        self.settings.save()?;
        Ok(())
    }

    /// Entity totals
    pub fn counts(&self) -> Result<StoreCounts, PackError> {
        Ok(StoreCounts {
            dashboards: self.dashboards.dashboard_count()?,
            widgets: self.dashboards.widget_count()?,
            groups: self.dashboards.group_count()?,
            integrations: self.integrations.count()?,
            libraries: self.media.library_count()?,
            images: self.media.image_count()?,
        })
    }
}
