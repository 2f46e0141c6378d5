//! Display formatting for terminal output
//!
//! Renders package summaries, import reports and store counts as aligned
//! text for the CLI.

pub mod import;
pub mod preview;

pub use import::{format_export_report, format_import_result};
pub use preview::{format_store_counts, format_summary};
