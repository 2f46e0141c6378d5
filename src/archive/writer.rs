//! Writing side of the archive codec
//!
//! Wraps a zip writer and records the checksum of every entry as it is
//! written, so the manifest can be emitted last with a complete checksum map.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Seek, Write};
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::checksum::{self, ALGORITHM_PREFIX};
use crate::error::{PackError, PackResult};

/// Streams entries into a zip container
pub struct ArchiveWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
    checksums: BTreeMap<String, String>,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    /// Start a new archive on the given sink
    pub fn new(sink: W) -> Self {
        Self {
            zip: ZipWriter::new(sink),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            checksums: BTreeMap::new(),
        }
    }

    /// Add an entry from memory and record its checksum
    pub fn add_entry(&mut self, path: &str, bytes: &[u8]) -> PackResult<()> {
        self.write_raw(path, bytes)?;
        self.checksums
            .insert(path.to_string(), checksum::digest(bytes));
        Ok(())
    }

    /// Add an entry by streaming a file from disk and record its checksum.
    ///
    /// A missing or unreadable file fails the whole write.
    pub fn add_file(&mut self, path: &str, source: &Path) -> PackResult<()> {
        let file = File::open(source).map_err(|e| {
            PackError::Export(format!(
                "Cannot read {} for entry {}: {}",
                source.display(),
                path,
                e
            ))
        })?;

        self.start(path)?;
        let mut hashing = HashingWriter {
            inner: &mut self.zip,
            hasher: Sha256::new(),
        };
        let written = io::copy(&mut BufReader::new(file), &mut hashing)?;
        let digest = format!("{}{}", ALGORITHM_PREFIX, hex::encode(hashing.hasher.finalize()));

        debug!(entry = path, bytes = written, "Wrote archive entry");
        self.checksums.insert(path.to_string(), digest);
        Ok(())
    }

    /// Add an entry without recording a checksum (used for the manifest)
    pub fn add_unchecked(&mut self, path: &str, bytes: &[u8]) -> PackResult<()> {
        self.write_raw(path, bytes)
    }

    /// Checksums of every recorded entry so far
    pub fn checksums(&self) -> &BTreeMap<String, String> {
        &self.checksums
    }

    /// Number of entries with a recorded checksum
    pub fn entry_count(&self) -> usize {
        self.checksums.len()
    }

    /// Write the central directory and hand back the sink
    pub fn finish(self) -> PackResult<W> {
        Ok(self.zip.finish()?)
    }

    fn start(&mut self, path: &str) -> PackResult<()> {
        if path.is_empty() || path.starts_with('/') || path.split('/').any(|c| c == "..") {
            return Err(PackError::Archive(format!("Invalid entry path: {}", path)));
        }
        if self.checksums.contains_key(path) {
            return Err(PackError::Archive(format!("Duplicate entry: {}", path)));
        }
        self.zip.start_file(path, self.options)?;
        Ok(())
    }

    fn write_raw(&mut self, path: &str, bytes: &[u8]) -> PackResult<()> {
        self.start(path)?;
        self.zip.write_all(bytes)?;
        debug!(entry = path, bytes = bytes.len(), "Wrote archive entry");
        Ok(())
    }
}

/// Hashes bytes on their way to the zip stream
struct HashingWriter<'a, W: Write> {
    inner: &'a mut W,
    hasher: Sha256,
}

impl<W: Write> Write for HashingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
