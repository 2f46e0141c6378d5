//! Import pipeline
//!
//! Archives are extracted into a request-scoped scratch directory
//! ([`StagedPackage`]), verified, and applied to the store by the
//! [`Importer`]. [`preview`] runs the read-only half of the same path.

pub mod entities;
pub mod media;
pub mod orchestrator;
pub mod preview;
pub mod remap;
pub mod result;
pub mod settings;
pub mod staging;

pub use orchestrator::{ImportContext, ImportOptions, ImportStage, Importer};
pub use preview::{compatibility_warnings, preview, PackageSummary, SummaryCounts};
pub use remap::IdentityRemap;
pub use result::{ClearedCounts, ImportResult, KindReport, Outcome};
pub use staging::StagedPackage;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{PackError, PackResult};

/// Preview the archive at `path`
pub fn preview_path(
    path: &Path,
    scratch_root: &Path,
    verify_checksums: bool,
) -> PackResult<PackageSummary> {
    let file = File::open(path)
        .map_err(|e| PackError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    preview(BufReader::new(file), scratch_root, verify_checksums)
}
