/*!
In-memory storage adapter.
*/

use super::StorageAdapter;
use crate::{CheckpointError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Memory-based storage adapter
///
/// Images live in a shared map; clones of a `MemoryStorage` see the same
/// images, which lets two engines exchange containers (combine/split) without
/// touching the filesystem.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    images: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locations currently holding an image, sorted
    pub fn locations(&self) -> Result<Vec<String>> {
        let images = self.images()?;
        let mut locations: Vec<String> = images.keys().cloned().collect();
        locations.sort();
        Ok(locations)
    }

    fn images(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.images
            .lock()
            .map_err(|_| CheckpointError::storage("Memory storage lock poisoned"))
    }
}

impl StorageAdapter for MemoryStorage {
    fn save(&self, data: &[u8], location: &str) -> Result<()> {
        self.images()?.insert(location.to_string(), data.to_vec());
        Ok(())
    }

    fn load(&self, location: &str) -> Result<Vec<u8>> {
        self.images()?
            .get(location)
            .cloned()
            .ok_or_else(|| CheckpointError::missing_node(format!("container '{location}'")))
    }

    fn exists(&self, location: &str) -> bool {
        self.images()
            .map(|images| images.contains_key(location))
            .unwrap_or(false)
    }

    fn delete(&self, location: &str) -> Result<()> {
        self.images()?.remove(location);
        Ok(())
    }
}
