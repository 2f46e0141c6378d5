//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the export and import pipelines.

pub mod package;
pub mod password;
pub mod store;

pub use package::{handle_export, handle_import, handle_preview, ExportArgs, ImportArgs, PreviewArgs};
pub use store::{handle_config, handle_init, handle_status};
