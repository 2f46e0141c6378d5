//! Media repository for JSON storage
//!
//! Manages media libraries and image metadata in media.json. Image bytes are
//! kept by the [`AssetStore`](super::AssetStore).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::PackError;
use crate::models::{ImageId, LibraryId, MediaImage, MediaLibrary};

use super::file_io::{read_json, write_json_atomic};

/// Serializable media data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct MediaData {
    #[serde(default)]
    libraries: Vec<MediaLibrary>,
    #[serde(default)]
    images: Vec<MediaImage>,
}

#[derive(Default)]
struct MediaTables {
    libraries: HashMap<LibraryId, MediaLibrary>,
    images: HashMap<ImageId, MediaImage>,
}

/// Repository for media library persistence
pub struct MediaRepository {
    path: PathBuf,
    data: RwLock<MediaTables>,
}

impl MediaRepository {
    /// Create a new media repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(MediaTables::default()),
        }
    }

    /// Load libraries and images from disk
    pub fn load(&self) -> Result<(), PackError> {
        let file_data: MediaData = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| PackError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.libraries = file_data
            .libraries
            .into_iter()
            .map(|l| (l.id, l))
            .collect();
        data.images = file_data.images.into_iter().map(|i| (i.id, i)).collect();

        Ok(())
    }

    /// Save libraries and images to disk
    pub fn save(&self) -> Result<(), PackError> {
        let data = self
            .data
            .read()
            .map_err(|e| PackError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut libraries: Vec<_> = data.libraries.values().cloned().collect();
        libraries.sort_by(|a, b| a.name.cmp(&b.name));

        let mut images: Vec<_> = data.images.values().cloned().collect();
        images.sort_by_key(|i| (i.library_id, i.created_at, i.id));

        write_json_atomic(&self.path, &MediaData { libraries, images })
    }

    /// Get all libraries sorted by name
    pub fn get_libraries(&self) -> Result<Vec<MediaLibrary>, PackError> {
        let data = self
            .data
            .read()
            .map_err(|e| PackError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut list: Vec<_> = data.libraries.values().cloned().collect();
        list.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(list)
    }

    /// Find a library by exact name
    pub fn get_library_by_name(&self, name: &str) -> Result<Option<MediaLibrary>, PackError> {
        let data = self
            .data
            .read()
            .map_err(|e| PackError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.libraries.values().find(|l| l.name == name).cloned())
    }

    /// Insert or update a library
    pub fn upsert_library(&self, library: MediaLibrary) -> Result<(), PackError> {
        if library.name.trim().is_empty() {
            return Err(PackError::Validation("Library name cannot be empty".into()));
        }

        let mut data = self
            .data
            .write()
            .map_err(|e| PackError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.libraries.insert(library.id, library);
        Ok(())
    }

    /// Images of one library in upload order
    pub fn get_images(&self, library_id: LibraryId) -> Result<Vec<MediaImage>, PackError> {
        let data = self
            .data
            .read()
            .map_err(|e| PackError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut list: Vec<_> = data
            .images
            .values()
            .filter(|i| i.library_id == library_id)
            .cloned()
            .collect();
        list.sort_by_key(|i| (i.created_at, i.id));
        Ok(list)
    }

    /// Insert image metadata; the library must exist
    pub fn insert_image(&self, image: MediaImage) -> Result<(), PackError> {
        if image.filename.is_empty() {
            return Err(PackError::Validation("Image filename cannot be empty".into()));
        }

        let mut data = self
            .data
            .write()
            .map_err(|e| PackError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        if !data.libraries.contains_key(&image.library_id) {
            return Err(PackError::library_not_found(image.library_id.to_string()));
        }

        data.images.insert(image.id, image);
        Ok(())
    }

    /// Delete all image metadata, returning the removed records so their
    /// files can be deleted from the asset store
    pub fn clear_images(&self) -> Result<Vec<MediaImage>, PackError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| PackError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(data.images.drain().map(|(_, image)| image).collect())
    }

    /// Delete all libraries; images must already be gone
    pub fn clear_libraries(&self) -> Result<usize, PackError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| PackError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        if !data.images.is_empty() {
            return Err(PackError::Storage(
                "Cannot delete libraries while images reference them".into(),
            ));
        }

        let count = data.libraries.len();
        data.libraries.clear();
        Ok(count)
    }

    /// Count libraries
    pub fn library_count(&self) -> Result<usize, PackError> {
        let data = self
            .data
            .read()
            .map_err(|e| PackError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.libraries.len())
    }

    /// Count images
    pub fn image_count(&self) -> Result<usize, PackError> {
        let data = self
            .data
            .read()
            .map_err(|e| PackError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.images.len())
    }
}
