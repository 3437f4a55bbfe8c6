//! Configuration module for engine construction
//!
//! This module provides configuration structures and enums for selecting
//! the storage backend and compression of container images, and the scratch
//! directory embedded input files are materialized into.

use crate::{CheckpointError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix of in-memory locations accepted by [`EngineConfig::from_uri`]
pub const MEMORY_URI_PREFIX: &str = "mem://";

/// Enumeration of supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    /// Local filesystem storage
    Local,
    /// Process-local memory, mostly for tests
    Memory,
}

/// Compression applied to the node tree of written containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionKind {
    None,
    Gzip,
}

/// Configuration structure for engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The storage backend to use
    pub backend: StorageBackend,
    /// Base path for local storage (optional, defaults to current directory)
    pub local_base_path: Option<PathBuf>,
    /// Compression for written containers; any supported one can be read
    pub compression: CompressionKind,
    /// Gzip level 0-9 (optional, defaults to 6)
    pub compression_level: Option<u32>,
    /// Directory embedded files are materialized into (optional, defaults to current directory)
    pub data_dir: Option<PathBuf>,
}

impl EngineConfig {
    /// Create a default configuration for local filesystem storage
    pub fn default_local() -> Self {
        EngineConfig {
            backend: StorageBackend::Local,
            local_base_path: None,
            compression: CompressionKind::Gzip,
            compression_level: None,
            data_dir: None,
        }
    }

    /// Create a configuration for in-memory storage without compression
    pub fn in_memory() -> Self {
        EngineConfig {
            backend: StorageBackend::Memory,
            local_base_path: None,
            compression: CompressionKind::None,
            compression_level: None,
            data_dir: None,
        }
    }

    /// Parse a container URI and create appropriate configuration
    ///
    /// Supports formats:
    /// - `mem://name` for in-memory storage
    /// - `/local/path` or `./relative/path` for local storage
    ///
    /// Returns the config and the extracted location
    pub fn from_uri(uri: &str) -> Result<(EngineConfig, String)> {
        if let Some(name) = uri.strip_prefix(MEMORY_URI_PREFIX) {
            if name.is_empty() {
                return Err(CheckpointError::validation(
                    "Invalid memory URI: missing container name",
                ));
            }
            Ok((EngineConfig::in_memory(), name.to_string()))
        } else if uri.is_empty() {
            Err(CheckpointError::validation("Empty container location"))
        } else {
            Ok((EngineConfig::default_local(), uri.to_string()))
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<EngineConfig> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Directory embedded files are written to
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(level) = self.compression_level {
            if level > 9 {
                return Err(CheckpointError::validation(format!(
                    "Compression level {level} is out of range 0-9"
                )));
            }
            if self.compression == CompressionKind::None {
                return Err(CheckpointError::validation(
                    "Compression level set but compression is disabled",
                ));
            }
        }
        if self.backend == StorageBackend::Memory && self.local_base_path.is_some() {
            return Err(CheckpointError::validation(
                "Memory backend does not take a local base path",
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::default_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_local_config() {
        let config = EngineConfig::default();
        assert_eq!(config.backend, StorageBackend::Local);
        assert_eq!(config.compression, CompressionKind::Gzip);
        assert!(config.local_base_path.is_none());
        assert_eq!(config.data_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_from_uri_memory() {
        let (config, location) = EngineConfig::from_uri("mem://flanders").unwrap();
        assert_eq!(config.backend, StorageBackend::Memory);
        assert_eq!(config.compression, CompressionKind::None);
        assert_eq!(location, "flanders");
    }

    #[test]
    fn test_from_uri_local() {
        let (config, path) = EngineConfig::from_uri("/data/checkpoints/run.ckpt").unwrap();
        assert_eq!(config.backend, StorageBackend::Local);
        assert_eq!(path, "/data/checkpoints/run.ckpt");
    }

    #[test]
    fn test_from_uri_invalid() {
        let result = EngineConfig::from_uri("mem://");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("missing container name"));
        assert!(EngineConfig::from_uri("").is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = EngineConfig::default_local();
        config.compression_level = Some(9);
        assert!(config.validate().is_ok());

        config.compression_level = Some(10);
        assert!(config.validate().is_err());

        let mut config = EngineConfig::in_memory();
        config.compression_level = Some(1);
        assert!(config.validate().is_err());

        let mut config = EngineConfig::in_memory();
        config.local_base_path = Some(PathBuf::from("/tmp"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("engine.json");
        std::fs::write(
            &path,
            r#"{
                "backend": "Local",
                "local_base_path": "/var/lib/stride",
                "compression": "Gzip",
                "compression_level": 1,
                "data_dir": "/tmp/stride"
            }"#,
        )
        .unwrap();

        let config = EngineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.local_base_path, Some(PathBuf::from("/var/lib/stride")));
        assert_eq!(config.compression_level, Some(1));
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/stride"));

        std::fs::write(&path, r#"{"backend": "Cloud"}"#).unwrap();
        assert!(matches!(
            EngineConfig::from_json_file(&path),
            Err(CheckpointError::Json(_))
        ));
    }
}
