//! Archive manifest
//!
//! The manifest is written last and records the checksum of every other
//! entry. Its own bytes are never checksummed.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::archive::sanitize_entry_path;
use crate::checksum;

/// One media library's entry in the asset inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryListing {
    pub library_id: String,
    pub name: String,
    /// Archive directory holding the library's images
    pub path: String,
    pub image_count: usize,
    #[serde(default)]
    pub files: Vec<String>,
}

/// Which optional assets the archive carries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestContents {
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub has_credentials: bool,
    #[serde(default)]
    pub libraries: Vec<LibraryListing>,
}

/// Table of contents for an archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: String,
    pub app_version: String,
    pub created_at: DateTime<Utc>,
    /// Identifier of the producing instance
    #[serde(default)]
    pub producer: String,
    /// Archive path -> `sha256:<hex>`
    #[serde(default)]
    pub checksums: BTreeMap<String, String>,
    #[serde(default)]
    pub contents: ManifestContents,
    #[serde(default)]
    pub total_files: usize,
}

impl Manifest {
    /// Paths whose extracted file under `root` is missing or does not match
    /// its recorded checksum, in manifest order
    pub fn failed_checksums(&self, root: &Path) -> Vec<String> {
        self.checksums
            .iter()
            .filter(|(path, expected)| {
                let Ok(relative) = sanitize_entry_path(path) else {
                    return true;
                };
                match checksum::digest_file(&root.join(relative)) {
                    Ok(actual) => !actual.eq_ignore_ascii_case(expected.trim()),
                    Err(_) => true,
                }
            })
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Total images across all libraries
    pub fn image_count(&self) -> usize {
        self.contents.libraries.iter().map(|l| l.image_count).sum()
    }
}
