//! dashpack - portable archives of dashboard application state
//!
//! This library exports a dashboard store (dashboards, widgets, groups,
//! integrations, branding, templates, network settings and media libraries)
//! into a single zip package and imports such packages back into a store,
//! remapping identifiers and asset URLs along the way.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Dashboard, widget, group, integration and media models
//! - `storage`: JSON file store and asset directory
//! - `checksum`: Content digests recorded in manifests
//! - `crypto`: Password-based encryption of integration secrets
//! - `archive`: Zip container reading and writing
//! - `package`: Manifest and config snapshot documents
//! - `export`: Export assembly and writing
//! - `import`: Preview and import orchestration
//! - `display` / `cli`: Terminal output and command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use dashpack::config::{paths::DashPaths, settings::Settings};
//! use dashpack::storage::Storage;
//!
//! let paths = DashPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::open(paths)?;
//! dashpack::export::export_to_path(&storage, &settings, "backup.zip".as_ref(), None)?;
//! ```

pub mod archive;
pub mod checksum;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod models;
pub mod package;
pub mod storage;

pub use error::{PackError, PackResult};
