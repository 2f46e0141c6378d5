//! Binary asset storage
//!
//! Uploaded files (branding logos, media library images) live flat in the
//! `uploads/` directory and are served as `/uploads/<filename>`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use crate::error::PackError;
use crate::models::media::{local_upload_name, upload_url};

/// A file placed into the asset store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub filename: String,
    pub url: String,
    pub size_bytes: u64,
}

/// Flat directory of uploaded files
#[derive(Debug, Clone)]
pub struct AssetStore {
    dir: PathBuf,
}

impl AssetStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a stored file
    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Resolve a locally hosted URL to the file backing it, if present
    pub fn resolve_url(&self, url: &str) -> Option<PathBuf> {
        let path = self.path_of(local_upload_name(url)?);
        path.is_file().then_some(path)
    }

    /// Copy a file into the store under a freshly generated name.
    ///
    /// The original extension is kept so the asset is served with a sensible
    /// content type.
    pub fn import_file(&self, source: &Path) -> Result<StoredAsset, PackError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            PackError::Io(format!("Failed to create uploads directory: {}", e))
        })?;

        let filename = generate_filename(source);
        let target = self.path_of(&filename);
        let size_bytes = fs::copy(source, &target).map_err(|e| {
            PackError::Io(format!("Failed to copy {}: {}", source.display(), e))
        })?;

        Ok(StoredAsset {
            url: upload_url(&filename),
            filename,
            size_bytes,
        })
    }

    /// Copy several files in, all or nothing. If any copy fails the files
    /// already copied are removed again.
    pub fn import_files(&self, sources: &[&Path]) -> Result<Vec<StoredAsset>, PackError> {
        let mut stored = Vec::with_capacity(sources.len());
        for source in sources {
            match self.import_file(source) {
                Ok(asset) => stored.push(asset),
                Err(e) => {
                    self.discard(&stored);
                    return Err(e);
                }
            }
        }
        Ok(stored)
    }

    /// Best-effort removal of assets whose owning record was never written
    pub fn discard(&self, assets: &[StoredAsset]) {
        for asset in assets {
            if let Err(e) = self.remove(&asset.filename) {
                warn!(file = %asset.filename, error = %e, "Failed to remove orphaned asset");
            }
        }
    }

    /// Write bytes into the store under the given name
    pub fn write(&self, filename: &str, bytes: &[u8]) -> Result<StoredAsset, PackError> {
        if local_upload_name(&upload_url(filename)).is_none() {
            return Err(PackError::Validation(format!(
                "Invalid asset filename: {}",
                filename
            )));
        }

        fs::create_dir_all(&self.dir).map_err(|e| {
            PackError::Io(format!("Failed to create uploads directory: {}", e))
        })?;
        fs::write(self.path_of(filename), bytes)
            .map_err(|e| PackError::Io(format!("Failed to write asset {}: {}", filename, e)))?;

        Ok(StoredAsset {
            filename: filename.to_string(),
            url: upload_url(filename),
            size_bytes: bytes.len() as u64,
        })
    }

    /// Delete a stored file; a missing file is not an error
    pub fn remove(&self, filename: &str) -> Result<(), PackError> {
        match fs::remove_file(self.path_of(filename)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PackError::Io(format!(
                "Failed to remove asset {}: {}",
                filename, e
            ))),
        }
    }
}

/// `<uuid>.<ext>` using the source file's extension, if it has one
fn generate_filename(source: &Path) -> String {
    let stem = Uuid::new_v4().simple().to_string();
    match source
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
    {
        Some(ext) => format!("{}.{}", stem, ext.to_ascii_lowercase()),
        None => stem,
    }
}
