//! Archive codec
//!
//! Zip containers with forward-slash entry paths relative to the archive
//! root.

pub mod reader;
pub mod writer;

pub use reader::{extract, extract_with_limits, sanitize_entry_path, to_entry_name, ExtractLimits};
pub use writer::ArchiveWriter;
