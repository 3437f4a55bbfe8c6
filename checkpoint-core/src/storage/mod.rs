/*!
Storage adapters for container images.

A container is persisted as a single opaque image. This module defines the
storage abstraction (port) and its adapters; the engine only ever moves whole
images in and out, so the same container logic runs on disk or in memory.
*/

pub mod local;
pub mod memory;

use crate::Result;

/// Storage abstraction for saving and loading container images
///
/// Locations are interpreted by the implementation (a file path for
/// [`LocalFileStorage`], a key for [`MemoryStorage`]).
pub trait StorageAdapter {
    /// Save a complete container image, replacing any previous one
    ///
    /// # Arguments
    /// * `data` - The encoded container image
    /// * `location` - Where to store it
    fn save(&self, data: &[u8], location: &str) -> Result<()>;

    /// Load a container image
    ///
    /// # Arguments
    /// * `location` - The location to load from
    ///
    /// # Returns
    /// The image bytes or an error
    fn load(&self, location: &str) -> Result<Vec<u8>>;

    /// Check if an image exists at the specified location
    fn exists(&self, location: &str) -> bool;

    /// Delete an image; deleting a missing image is not an error
    fn delete(&self, location: &str) -> Result<()>;
}

pub use local::LocalFileStorage;
pub use memory::MemoryStorage;
