/*!
Local filesystem storage adapter implementation.
*/

use super::StorageAdapter;
use crate::{CheckpointError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Local filesystem storage adapter
///
/// Each container image is one file. Writes go to a temporary file in the
/// target directory which is then renamed over the destination, so readers
/// only ever observe a complete image.
///
/// # Example
/// ```rust,no_run
/// use checkpoint_core::storage::{LocalFileStorage, StorageAdapter};
///
/// let storage = LocalFileStorage::with_base_dir("/var/lib/stride/checkpoints");
/// storage.save(b"image bytes", "flanders.ckpt")?;
/// # Ok::<(), checkpoint_core::CheckpointError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct LocalFileStorage {
    /// Optional base directory for all container files
    base_dir: Option<PathBuf>,
}

impl LocalFileStorage {
    /// Create a new local file storage adapter without a base directory
    ///
    /// Locations provided to save/load will be used as-is.
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    /// Create a new local file storage adapter with a base directory
    ///
    /// All locations will be resolved relative to the base directory.
    pub fn with_base_dir<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: Some(base_dir.as_ref().to_path_buf()),
        }
    }

    /// Resolve the full path for a given location
    pub fn resolve_path(&self, location: &str) -> PathBuf {
        match &self.base_dir {
            Some(base) => base.join(location),
            None => PathBuf::from(location),
        }
    }

    /// Ensure the parent directory exists, creating it if necessary
    fn ensure_parent_dir(&self, path: &Path) -> Result<PathBuf> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.exists() {
            fs::create_dir_all(&parent).map_err(|e| {
                CheckpointError::storage(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(parent)
    }
}

impl StorageAdapter for LocalFileStorage {
    fn save(&self, data: &[u8], location: &str) -> Result<()> {
        let full_path = self.resolve_path(location);
        let parent = self.ensure_parent_dir(&full_path)?;

        let mut staged = NamedTempFile::new_in(&parent)?;
        staged.write_all(data)?;
        staged.as_file().sync_all()?;
        staged.persist(&full_path).map_err(|e| {
            CheckpointError::storage(format!(
                "Failed to write container to {}: {}",
                full_path.display(),
                e.error
            ))
        })?;

        Ok(())
    }

    fn load(&self, location: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve_path(location);

        if !full_path.is_file() {
            return Err(CheckpointError::missing_node(format!(
                "container file {}",
                full_path.display()
            )));
        }

        fs::read(&full_path).map_err(|e| {
            CheckpointError::storage(format!(
                "Failed to read container from {}: {}",
                full_path.display(),
                e
            ))
        })
    }

    fn exists(&self, location: &str) -> bool {
        self.resolve_path(location).is_file()
    }

    fn delete(&self, location: &str) -> Result<()> {
        let full_path = self.resolve_path(location);

        if full_path.exists() {
            fs::remove_file(&full_path).map_err(|e| {
                CheckpointError::storage(format!(
                    "Failed to delete container {}: {}",
                    full_path.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_file_storage_basic_operations() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalFileStorage::with_base_dir(temp_dir.path());

        let image = b"container image";
        let location = "belgium.ckpt";

        assert!(storage.save(image, location).is_ok());
        assert!(storage.exists(location));
        assert_eq!(storage.load(location).unwrap(), image);

        assert!(storage.delete(location).is_ok());
        assert!(!storage.exists(location));
    }

    #[test]
    fn test_save_replaces_existing_image() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalFileStorage::with_base_dir(temp_dir.path());

        storage.save(b"first version, longer", "run.ckpt").unwrap();
        storage.save(b"second", "run.ckpt").unwrap();

        assert_eq!(storage.load("run.ckpt").unwrap(), b"second");
    }

    #[test]
    fn test_nested_directories_are_created() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalFileStorage::with_base_dir(temp_dir.path());

        let location = "regions/flanders/run0.ckpt";
        storage.save(b"image", location).unwrap();

        assert!(temp_dir.path().join(location).is_file());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalFileStorage::with_base_dir(temp_dir.path());

        let result = storage.load("nonexistent.ckpt");
        assert!(matches!(result, Err(CheckpointError::MissingNode(_))));
    }
}
