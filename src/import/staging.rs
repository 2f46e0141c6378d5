//! Staged packages
//!
//! An archive extracted into a scratch directory that is unique to one
//! request and removed when the staged package is closed or dropped, on every
//! exit path.

use std::fs::{self, File};
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::archive::{self, sanitize_entry_path};
use crate::crypto::{CredentialVault, EncryptedPayload};
use crate::error::{PackError, PackResult};
use crate::package::{ConfigSnapshot, Manifest, CONFIG_PATH, CREDENTIALS_PATH, MANIFEST_PATH};

/// An extracted archive awaiting verification and import
#[derive(Debug)]
pub struct StagedPackage {
    scratch: TempDir,
    pub manifest: Manifest,
    pub entries: Vec<String>,
}

impl StagedPackage {
    /// Extract `source` into a fresh directory under `scratch_root`.
    ///
    /// Fails if the container is malformed or lacks a manifest or config
    /// entry. The scratch directory is already gone when this returns an error.
    pub fn extract<R: Read + Seek>(source: R, scratch_root: &Path) -> PackResult<Self> {
        fs::create_dir_all(scratch_root).map_err(|e| {
            PackError::Io(format!("Failed to create scratch directory: {}", e))
        })?;
        let scratch = tempfile::Builder::new()
            .prefix("dashpack-import-")
            .tempdir_in(scratch_root)
            .map_err(|e| PackError::Io(format!("Failed to create scratch directory: {}", e)))?;
        debug!(path = %scratch.path().display(), "Created scratch directory");

        let entries = archive::extract(source, scratch.path())?;

        for required in [MANIFEST_PATH, CONFIG_PATH] {
            if !scratch.path().join(required).is_file() {
                return Err(PackError::InvalidPackage(format!(
                    "Package is missing {}",
                    required
                )));
            }
        }

        let manifest: Manifest = read_document(&scratch.path().join(MANIFEST_PATH))
            .map_err(|e| PackError::InvalidPackage(format!("Unreadable manifest: {}", e)))?;

        info!(
            entries = entries.len(),
            format_version = %manifest.format_version,
            "Package extracted"
        );

        Ok(Self {
            scratch,
            manifest,
            entries,
        })
    }

    /// Directory the archive was extracted into
    pub fn root(&self) -> &Path {
        self.scratch.path()
    }

    /// Absolute path of an extracted entry, if the entry name is safe
    pub fn entry_path(&self, entry: &str) -> Option<PathBuf> {
        sanitize_entry_path(entry)
            .ok()
            .map(|relative| self.root().join(relative))
    }

    /// Check every manifest checksum against the extracted bytes
    pub fn verify_checksums(&self) -> PackResult<()> {
        let failed = self.manifest.failed_checksums(self.root());
        if failed.is_empty() {
            debug!(entries = self.manifest.checksums.len(), "Checksums verified");
            Ok(())
        } else {
            Err(PackError::ChecksumMismatch { paths: failed })
        }
    }

    /// Parse the config snapshot
    pub fn load_snapshot(&self) -> PackResult<ConfigSnapshot> {
        read_document(&self.root().join(CONFIG_PATH))
            .map_err(|e| PackError::InvalidPackage(format!("Unreadable config: {}", e)))
    }

    pub fn has_credentials(&self) -> bool {
        self.root().join(CREDENTIALS_PATH).is_file()
    }

    /// Read and shape-check the encrypted credentials entry
    pub fn read_credentials(&self) -> PackResult<EncryptedPayload> {
        let value: Value = read_document(&self.root().join(CREDENTIALS_PATH))
            .map_err(|_| PackError::InvalidCredentials("credentials file is not valid JSON".into()))?;
        CredentialVault::parse_payload(&value)
    }

    /// Remove the scratch directory, logging rather than failing
    pub fn close(self) {
        let path = self.scratch.path().to_path_buf();
        if let Err(e) = self.scratch.close() {
            warn!(path = %path.display(), error = %e, "Failed to remove scratch directory");
        } else {
            debug!(path = %path.display(), "Removed scratch directory");
        }
    }
}

fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| e.to_string())
}
