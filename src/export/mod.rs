//! Export pipeline
//!
//! [`ExportAssembler`] builds the bundle from the store and [`ExportWriter`]
//! streams it into a zip sink. [`export_to_path`] ties both together for
//! file output, writing next to the destination and renaming only once the
//! archive is complete. [`export_to_writer`] serves sinks that cannot seek.

pub mod assembler;
pub mod writer;

pub use assembler::{AssetEntry, ExportAssembler, ExportBundle};
pub use writer::ExportWriter;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::config::Settings;
use crate::crypto::CredentialVault;
use crate::error::{PackError, PackResult};
use crate::package::{export_filename, Manifest};
use crate::storage::Storage;

/// Outcome of writing an archive to disk
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub path: PathBuf,
    pub manifest: Manifest,
    pub size_bytes: u64,
    /// Whether secrets existed that were left out because no password was given
    pub unprotected_secrets: bool,
}

/// Resolve the output path: a directory gets the dated default filename
pub fn resolve_output(output: &Path, prefix: &str) -> PathBuf {
    if output.is_dir() {
        output.join(export_filename(prefix, Local::now().date_naive()))
    } else {
        output.to_path_buf()
    }
}

/// Export the whole store to `output` (a file path or a directory)
pub fn export_to_path(
    storage: &Storage,
    settings: &Settings,
    output: &Path,
    password: Option<&str>,
) -> PackResult<ExportReport> {
    let path = resolve_output(output, &settings.export_prefix);
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .map_err(|e| PackError::Export(format!("Failed to create {}: {}", parent.display(), e)))?;

    let bundle = ExportAssembler::new(storage).assemble()?;

    let temp = tempfile::Builder::new()
        .prefix(".dashpack-export-")
        .suffix(".zip.tmp")
        .tempfile_in(&parent)
        .map_err(|e| PackError::Export(format!("Failed to create temporary file: {}", e)))?;

    let writer = ExportWriter::new(
        settings.instance_name.clone(),
        CredentialVault::new(settings.key_derivation),
    );
    let (temp, manifest) = writer.write(&bundle, temp, password)?;

    let file = temp
        .persist(&path)
        .map_err(|e| PackError::Export(format!("Failed to save {}: {}", path.display(), e)))?;
    let size_bytes = file.metadata().map(|m| m.len()).unwrap_or(0);

    info!(path = %path.display(), size_bytes, "Export complete");

    Ok(ExportReport {
        path,
        manifest,
        size_bytes,
        unprotected_secrets: password.is_none() && !bundle.credentials.is_empty(),
    })
}

/// Export the whole store into any writable sink, such as standard output.
/// Returns the sink, the manifest, and whether secrets were left out for
/// lack of a password.
pub fn export_to_writer<W: Write>(
    storage: &Storage,
    settings: &Settings,
    sink: W,
    password: Option<&str>,
) -> PackResult<(W, Manifest, bool)> {
    let bundle = ExportAssembler::new(storage).assemble()?;
    let writer = ExportWriter::new(
        settings.instance_name.clone(),
        CredentialVault::new(settings.key_derivation),
    );
    let (sink, manifest) = writer.write_stream(&bundle, sink, password)?;

    info!(files = manifest.total_files, "Export streamed");
    let unprotected = password.is_none() && !bundle.credentials.is_empty();
    Ok((sink, manifest, unprotected))
}
