//! Media library models
//!
//! Libraries group uploaded images; image bytes live in the asset store and
//! are referenced by URL from widget and group configs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ImageId, LibraryId};

/// URL prefix under which uploaded assets are served
pub const UPLOADS_URL_PREFIX: &str = "/uploads/";

/// A media library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaLibrary {
    pub id: LibraryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl MediaLibrary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: LibraryId::new(),
            name: name.into(),
            description: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// Metadata for one stored image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaImage {
    pub id: ImageId,
    pub library_id: LibraryId,

    /// Name of the file in the asset store
    pub filename: String,

    /// Name the file was uploaded with
    #[serde(default)]
    pub original_name: String,

    #[serde(default)]
    pub mime_type: String,

    #[serde(default)]
    pub size_bytes: u64,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,

    #[serde(default)]
    pub alt_text: String,

    /// Public URL, normally `/uploads/<filename>`
    pub url: String,

    pub created_at: DateTime<Utc>,
}

impl MediaImage {
    /// Create image metadata for a file already placed in the asset store
    pub fn new(library_id: LibraryId, filename: impl Into<String>, size_bytes: u64) -> Self {
        let filename = filename.into();
        Self {
            id: ImageId::new(),
            library_id,
            url: upload_url(&filename),
            mime_type: mime_from_filename(&filename).to_string(),
            original_name: filename.clone(),
            filename,
            size_bytes,
            width: None,
            height: None,
            alt_text: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// Public URL for a file in the asset store
pub fn upload_url(filename: &str) -> String {
    format!("{}{}", UPLOADS_URL_PREFIX, filename)
}

/// Asset-store filename for a locally hosted URL, if it is one
pub fn local_upload_name(url: &str) -> Option<&str> {
    let name = url.strip_prefix(UPLOADS_URL_PREFIX)?;
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return None;
    }
    Some(name)
}

/// Best-effort MIME type from a file extension
pub fn mime_from_filename(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}
