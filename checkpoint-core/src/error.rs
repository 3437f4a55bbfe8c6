/*!
Error types for the checkpoint engine.
*/

use thiserror::Error;

/// Result type used throughout the checkpoint core.
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Errors that can occur while reading or writing a checkpoint container.
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// I/O errors during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required group, table, blob or attribute is absent
    #[error("Missing node: {0}")]
    MissingNode(String),

    /// A snapshot was requested for a date that has no population table
    #[error("No snapshot stored for date {0}")]
    InvalidDate(String),

    /// A relation row points at a person that is not in the loaded population
    #[error("Relation '{relation}' references unknown person {person_id}")]
    DanglingReference { relation: String, person_id: u32 },

    /// The stored shape of a node does not match what the caller expects
    #[error("Schema mismatch at '{path}': expected {expected}, found {found}")]
    SchemaMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// A file blob is missing its extension sidecar or the sidecar is unreadable
    #[error("Invalid blob: {0}")]
    InvalidBlob(String),

    /// Compression/decompression errors
    #[error("Compression error: {0}")]
    Compression(String),

    /// Integrity check failures
    #[error("Integrity check failed: expected hash {expected}, got {actual}")]
    IntegrityCheckFailed { expected: String, actual: String },

    /// Invalid container image
    #[error("Invalid container format: {0}")]
    InvalidFormat(String),

    /// Storage adapter errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

impl CheckpointError {
    /// Create a new missing node error
    pub fn missing_node<S: Into<String>>(path: S) -> Self {
        Self::MissingNode(path.into())
    }

    /// Create a new invalid date error
    pub fn invalid_date<S: Into<String>>(msg: S) -> Self {
        Self::InvalidDate(msg.into())
    }

    /// Create a new invalid blob error
    pub fn invalid_blob<S: Into<String>>(msg: S) -> Self {
        Self::InvalidBlob(msg.into())
    }

    /// Create a new schema mismatch error
    pub fn schema_mismatch<P, E, F>(path: P, expected: E, found: F) -> Self
    where
        P: Into<String>,
        E: Into<String>,
        F: Into<String>,
    {
        Self::SchemaMismatch {
            path: path.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a new compression error
    pub fn compression<S: Into<String>>(msg: S) -> Self {
        Self::Compression(msg.into())
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new invalid format error
    pub fn invalid_format<S: Into<String>>(msg: S) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// True for the error kinds that signal an absent node rather than a broken one.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingNode(_) | Self::InvalidDate(_))
    }
}
