//! Reading side of the archive codec
//!
//! Extraction refuses any entry whose path would land outside the
//! destination directory.

use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use crate::error::{PackError, PackResult};

/// Turn an archive entry name into a safe relative path
pub fn sanitize_entry_path(name: &str) -> PackResult<PathBuf> {
    let candidate = Path::new(name);
    let unsafe_component = candidate
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

    if name.is_empty() || name.contains('\\') || candidate.is_absolute() || unsafe_component {
        return Err(PackError::Archive(format!(
            "Invalid path component in archive entry: {}",
            name
        )));
    }

    let relative: PathBuf = candidate
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    if relative.as_os_str().is_empty() {
        return Err(PackError::Archive(format!("Empty archive entry path: {}", name)));
    }
    Ok(relative)
}

/// Bounds on what one extraction may write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractLimits {
    pub max_entries: usize,
    /// Total uncompressed bytes across all entries
    pub max_total_bytes: u64,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_entries: 100_000,
            max_total_bytes: 4 * 1024 * 1024 * 1024,
        }
    }
}

/// Extract every file entry into `destination` under the default limits
pub fn extract<R: Read + Seek>(source: R, destination: &Path) -> PackResult<Vec<String>> {
    extract_with_limits(source, destination, ExtractLimits::default())
}

/// Extract every file entry into `destination`.
///
/// Returns the forward-slash paths of the extracted entries. A container
/// that cannot be opened, any unsafe entry, or exceeding `limits` fails the
/// whole extraction.
pub fn extract_with_limits<R: Read + Seek>(
    source: R,
    destination: &Path,
    limits: ExtractLimits,
) -> PackResult<Vec<String>> {
    let mut archive = ZipArchive::new(source)
        .map_err(|e| PackError::Archive(format!("Failed to read archive: {}", e)))?;

    if archive.len() > limits.max_entries {
        return Err(PackError::Archive(format!(
            "Archive has {} entries, more than the limit of {}",
            archive.len(),
            limits.max_entries
        )));
    }

    let mut extracted = Vec::with_capacity(archive.len());
    let mut written: u64 = 0;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| PackError::Archive(format!("Failed to read archive entry: {}", e)))?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let relative = sanitize_entry_path(&name)?;
        if entry.enclosed_name().is_none() {
            return Err(PackError::Archive(format!(
                "Archive entry escapes destination: {}",
                name
            )));
        }

        let out_path = destination.join(&relative);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PackError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let remaining = limits.max_total_bytes.saturating_sub(written);
        if entry.size() > remaining {
            return Err(too_large(limits));
        }

        let mut outfile = File::create(&out_path)
            .map_err(|e| PackError::Io(format!("Failed to create {}: {}", out_path.display(), e)))?;
        let copied = io::copy(&mut (&mut entry).take(remaining.saturating_add(1)), &mut outfile)
            .map_err(|e| PackError::Archive(format!("Failed to extract {}: {}", name, e)))?;
        if copied > remaining {
            return Err(too_large(limits));
        }
        written += copied;

        debug!(entry = %name, "Extracted archive entry");
        extracted.push(to_entry_name(&relative));
    }

    Ok(extracted)
}

fn too_large(limits: ExtractLimits) -> PackError {
    PackError::Archive(format!(
        "Archive expands beyond the limit of {} bytes",
        limits.max_total_bytes
    ))
}

/// Forward-slash form of a relative path
pub fn to_entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
