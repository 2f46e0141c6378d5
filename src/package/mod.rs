//! Package layout
//!
//! Entry names, format version and the documents stored in an archive:
//!
//! ```text
//! manifest.json                      checksums and asset inventory
//! config.json                        config snapshot
//! credentials.json                   encrypted secrets (optional)
//! assets/logo.<ext>                  branding (optional)
//! assets/favicon.<ext>               branding (optional)
//! images/library-<id>/<filename>     media library images
//! ```

pub mod manifest;
pub mod record;
pub mod snapshot;

pub use manifest::{LibraryListing, Manifest, ManifestContents};
pub use record::Record;
pub use snapshot::{
    ConfigSnapshot, ExportedDashboard, ExportedGroup, ExportedImage, ExportedIntegration,
    ExportedLibrary, ExportedMember, ExportedWidget, MediaSnapshot, NetworkSnapshot,
    TemplateSnapshot,
};

use chrono::NaiveDate;

/// Version of the package layout written by this build
pub const FORMAT_VERSION: &str = "1.0";

/// Version of the application producing packages
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const MANIFEST_PATH: &str = "manifest.json";
pub const CONFIG_PATH: &str = "config.json";
pub const CREDENTIALS_PATH: &str = "credentials.json";
pub const ASSETS_DIR: &str = "assets";
pub const IMAGES_DIR: &str = "images";

/// Archive directory holding one library's images
pub fn library_dir(library_id: &str) -> String {
    format!("{}/library-{}", IMAGES_DIR, library_id)
}

/// Archive path of a branding asset, keeping the source extension
pub fn branding_path(kind: &str, source_filename: &str) -> String {
    match source_filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => {
            format!("{}/{}.{}", ASSETS_DIR, kind, ext.to_ascii_lowercase())
        }
        _ => format!("{}/{}", ASSETS_DIR, kind),
    }
}

/// `<prefix>-YYYY-MM-DD.zip`
pub fn export_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}.zip", prefix, date.format("%Y-%m-%d"))
}

/// Major component of a `major.minor` format version
pub fn format_major(version: &str) -> Option<u32> {
    version.split('.').next()?.trim().parse().ok()
}
