//! Custom error types for dashpack
//!
//! This module defines the error hierarchy for the export/import pipeline
//! using thiserror for ergonomic error definitions.

use thiserror::Error;

/// The main error type for dashpack operations
#[derive(Error, Debug)]
pub enum PackError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// The container could not be opened or contains unsafe entries
    #[error("Archive error: {0}")]
    Archive(String),

    /// The archive opened but is not a usable package
    #[error("Invalid package: {0}")]
    InvalidPackage(String),

    /// One or more archive members failed integrity verification
    #[error("Checksum mismatch for {}", paths.join(", "))]
    ChecksumMismatch { paths: Vec<String> },

    /// Encrypted credentials file is structurally malformed
    #[error("Invalid credentials payload: {0}")]
    InvalidCredentials(String),

    /// Wrong password, corrupted payload or tampering. Deliberately opaque.
    #[error("Decryption failed: invalid password or corrupted data")]
    Decryption,

    /// Encryption errors
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Import errors
    #[error("Import error: {0}")]
    Import(String),
}

impl PackError {
    /// Create a "not found" error for dashboards
    pub fn dashboard_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Dashboard",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for widgets
    pub fn widget_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Widget",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for groups
    pub fn group_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Group",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for integrations
    pub fn integration_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Integration",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for media libraries
    pub fn library_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Media library",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Errors that abort an import before the target store is touched
    pub fn is_fatal_package_error(&self) -> bool {
        matches!(
            self,
            Self::Archive(_) | Self::InvalidPackage(_) | Self::ChecksumMismatch { .. }
        )
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for PackError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PackError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<zip::result::ZipError> for PackError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

/// Result type alias for dashpack operations
pub type PackResult<T> = Result<T, PackError>;
