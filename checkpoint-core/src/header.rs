/*!
Container header: identity, format version and integrity data.
*/

use crate::{CheckpointError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Magic bytes at the start of every container image
pub const CONTAINER_MAGIC: [u8; 4] = *b"SCKP";

/// Current container format version for compatibility tracking
pub const CONTAINER_FORMAT_VERSION: u8 = 1;

/// Header written in front of the encoded node tree
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContainerHeader {
    /// Unique identifier of the container, stable across re-saves
    pub container_id: String,

    /// Format version for compatibility (current: 1)
    pub format_version: u8,

    /// When the container was first created
    pub created_at: DateTime<Utc>,

    /// When the container was last closed
    pub modified_at: DateTime<Utc>,

    /// SHA-256 hash of the uncompressed node tree
    pub content_hash: String,

    /// Size of the uncompressed node tree in bytes
    pub uncompressed_size: usize,

    /// Compression algorithm used for the tree
    pub compression_algorithm: String,
}

impl ContainerHeader {
    /// Create a header for a brand new container
    ///
    /// # Example
    /// ```rust
    /// use checkpoint_core::ContainerHeader;
    ///
    /// let header = ContainerHeader::new("gzip");
    /// assert_eq!(header.compression_algorithm, "gzip");
    /// assert!(header.is_compatible());
    /// ```
    pub fn new<S: Into<String>>(compression_algorithm: S) -> Self {
        let now = Utc::now();
        Self {
            container_id: Uuid::new_v4().to_string(),
            format_version: CONTAINER_FORMAT_VERSION,
            created_at: now,
            modified_at: now,
            content_hash: String::new(),
            uncompressed_size: 0,
            compression_algorithm: compression_algorithm.into(),
        }
    }

    /// Set the content hash and size from the encoded tree
    ///
    /// # Arguments
    /// * `tree` - The encoded node tree as bytes
    ///
    /// # Returns
    /// Updated header with computed hash and uncompressed size
    pub fn with_content_hash(mut self, tree: &[u8]) -> Self {
        self.content_hash = Self::compute_hash(tree);
        self.uncompressed_size = tree.len();
        self
    }

    /// Set the compression algorithm
    pub fn with_compression_algorithm<S: Into<String>>(mut self, algorithm: S) -> Self {
        self.compression_algorithm = algorithm.into();
        self
    }

    /// Bump the modification time
    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }

    /// Compute SHA-256 hash of the provided data
    ///
    /// # Returns
    /// Hexadecimal string representation of the SHA-256 hash
    pub fn compute_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    /// Verify the encoded tree against the stored hash
    ///
    /// # Returns
    /// Ok(()) if the hash matches, Err(CheckpointError::IntegrityCheckFailed) otherwise
    pub fn verify_integrity(&self, tree: &[u8]) -> Result<()> {
        let computed_hash = Self::compute_hash(tree);
        if computed_hash == self.content_hash {
            Ok(())
        } else {
            Err(CheckpointError::IntegrityCheckFailed {
                expected: self.content_hash.clone(),
                actual: computed_hash,
            })
        }
    }

    /// Validate that all required fields are properly set
    pub fn validate(&self) -> Result<()> {
        if self.container_id.is_empty() {
            return Err(CheckpointError::validation("container_id cannot be empty"));
        }
        if self.content_hash.is_empty() {
            return Err(CheckpointError::validation("content_hash cannot be empty"));
        }
        if self.compression_algorithm.is_empty() {
            return Err(CheckpointError::validation(
                "compression_algorithm cannot be empty",
            ));
        }
        if !self.is_compatible() {
            return Err(CheckpointError::invalid_format(format!(
                "Container format version {} is newer than supported version {}",
                self.format_version, CONTAINER_FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Check if this header is compatible with the current format version
    pub fn is_compatible(&self) -> bool {
        self.format_version <= CONTAINER_FORMAT_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_creation() {
        let header = ContainerHeader::new("gzip");
        assert_eq!(header.format_version, CONTAINER_FORMAT_VERSION);
        assert_eq!(header.created_at, header.modified_at);
        assert!(!header.container_id.is_empty());
        assert!(header.content_hash.is_empty());
    }

    #[test]
    fn test_content_hash() {
        let hash = ContainerHeader::compute_hash(b"test data");

        assert_eq!(
            hash,
            "916f0027a575074ce72a331777c3478d6513f786a591bd892da1a577bf2335f9"
        );
    }

    #[test]
    fn test_integrity_verification() {
        let tree = b"encoded tree";
        let header = ContainerHeader::new("none").with_content_hash(tree);
        assert_eq!(header.uncompressed_size, tree.len());

        assert!(header.verify_integrity(tree).is_ok());
        assert!(matches!(
            header.verify_integrity(b"tampered tree"),
            Err(CheckpointError::IntegrityCheckFailed { .. })
        ));
    }

    #[test]
    fn test_validation() {
        let mut header = ContainerHeader::new("gzip").with_content_hash(b"tree");
        assert!(header.validate().is_ok());

        header.format_version = CONTAINER_FORMAT_VERSION + 1;
        assert!(!header.is_compatible());
        assert!(matches!(
            header.validate(),
            Err(CheckpointError::InvalidFormat(_))
        ));

        let header = ContainerHeader::new("gzip");
        assert!(header.validate().is_err());
    }

    #[test]
    fn test_touch_keeps_identity() {
        let mut header = ContainerHeader::new("gzip");
        let id = header.container_id.clone();
        let created = header.created_at;

        header.touch();
        assert_eq!(header.container_id, id);
        assert_eq!(header.created_at, created);
        assert!(header.modified_at >= created);
    }
}
