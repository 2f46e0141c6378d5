//! Content digests for archive members
//!
//! Checksums are SHA-256 rendered as `sha256:<hex>` so the algorithm is
//! recorded alongside the value.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Algorithm tag prefixed to every checksum
pub const ALGORITHM_PREFIX: &str = "sha256:";

/// Digest a byte buffer
pub fn digest(bytes: &[u8]) -> String {
    format!("{}{}", ALGORITHM_PREFIX, hex::encode(Sha256::digest(bytes)))
}

/// Digest a file without loading it into memory
pub fn digest_file(path: &Path) -> io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(format!("{}{}", ALGORITHM_PREFIX, hex::encode(hasher.finalize())))
}
