//! Configuration module for dashpack
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Settings persistence
//! - Key-derivation cost and export defaults

pub mod paths;
pub mod settings;

pub use paths::DashPaths;
pub use settings::{KeyDerivationCost, Settings};
