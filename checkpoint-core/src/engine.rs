/*!
Container engine: the create/open/close lifecycle.

The engine ties a storage adapter and a compression adapter together. Opening
a container loads and verifies the whole image into memory; closing it encodes
the tree again and writes it back as one image. Nothing reaches storage
between open and close.
*/

use crate::compression::{CompressionAdapter, GzipCompressor, NoCompression};
use crate::config::{CompressionKind, EngineConfig, StorageBackend};
use crate::container::format::{decode_header, decode_image, encode_image};
use crate::container::{Container, Group};
use crate::header::ContainerHeader;
use crate::observability::OperationTimer;
use crate::storage::{LocalFileStorage, MemoryStorage, StorageAdapter};
use crate::{CheckpointError, Result};
use tracing::{debug, info};

/// Main engine for container lifecycle operations
///
/// # Example
/// ```rust
/// use checkpoint_core::{ContainerEngine, MemoryStorage, NoCompression};
///
/// let engine = ContainerEngine::new(MemoryStorage::new(), NoCompression::new());
///
/// let mut container = engine.create("flanders.ckpt")?;
/// container.create_group_if_missing("Config")?;
/// engine.close(container)?;
///
/// let reopened = engine.open("flanders.ckpt")?;
/// assert!(reopened.group_exists("Config"));
/// # Ok::<(), checkpoint_core::CheckpointError>(())
/// ```
pub struct ContainerEngine<S, C>
where
    S: StorageAdapter,
    C: CompressionAdapter,
{
    storage: S,
    compressor: C,
}

impl<S, C> ContainerEngine<S, C>
where
    S: StorageAdapter,
    C: CompressionAdapter,
{
    /// Create a new engine with the specified storage and compression adapters
    pub fn new(storage: S, compressor: C) -> Self {
        Self {
            storage,
            compressor,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Create an empty container at `path`, replacing any existing one
    ///
    /// The empty image is written immediately, so the path exists even if the
    /// returned container is dropped without being closed.
    pub fn create(&self, path: &str) -> Result<Container> {
        let timer = OperationTimer::start("create", path);
        let mut container = Container::from_parts(
            path.to_string(),
            ContainerHeader::new(self.compressor.algorithm_name()),
            Group::default(),
        );
        match self.flush(&mut container) {
            Ok(()) => {
                timer.finish();
                info!(path = %path, container_id = %container.header().container_id, "Created container");
                Ok(container)
            }
            Err(e) => {
                timer.finish_with_error(&e);
                Err(e)
            }
        }
    }

    /// Open the container at `path`
    ///
    /// # Errors
    /// * `MissingNode` - no container exists at `path`
    /// * `InvalidFormat` - the image is not a container or is too new
    /// * `IntegrityCheckFailed` - the tree does not match its recorded hash
    pub fn open(&self, path: &str) -> Result<Container> {
        if !self.storage.exists(path) {
            return Err(CheckpointError::missing_node(format!("container {path}")));
        }
        let timer = OperationTimer::start("open", path);
        let result = self
            .storage
            .load(path)
            .and_then(|image| decode_image(&image));
        match result {
            Ok((header, root)) => {
                timer.finish();
                debug!(
                    path = %path,
                    container_id = %header.container_id,
                    size = header.uncompressed_size,
                    "Opened container"
                );
                Ok(Container::from_parts(path.to_string(), header, root))
            }
            Err(e) => {
                timer.finish_with_error(&e);
                Err(e)
            }
        }
    }

    /// Persist the container without closing it
    pub fn flush(&self, container: &mut Container) -> Result<()> {
        let (header, image) = encode_image(container.header(), container.root(), &self.compressor)?;
        self.storage.save(&image, container.location())?;
        debug!(
            path = %container.location(),
            uncompressed = header.uncompressed_size,
            stored = image.len(),
            "Flushed container"
        );
        container.set_header(header);
        Ok(())
    }

    /// Persist and release the container
    ///
    /// # Returns
    /// The header written with the final image
    pub fn close(&self, mut container: Container) -> Result<ContainerHeader> {
        let timer = OperationTimer::start("close", container.location());
        match self.flush(&mut container) {
            Ok(()) => {
                timer.finish();
                info!(
                    path = %container.location(),
                    size = container.header().uncompressed_size,
                    "Closed container"
                );
                Ok(container.header().clone())
            }
            Err(e) => {
                timer.finish_with_error(&e);
                Err(e)
            }
        }
    }

    /// Check if a container exists at the specified path
    pub fn exists(&self, path: &str) -> bool {
        self.storage.exists(path)
    }

    /// Delete the container at `path`
    pub fn delete(&self, path: &str) -> Result<()> {
        self.storage.delete(path)?;
        info!(path = %path, "Deleted container");
        Ok(())
    }

    /// Read the header without decoding the tree
    pub fn header(&self, path: &str) -> Result<ContainerHeader> {
        if !self.storage.exists(path) {
            return Err(CheckpointError::missing_node(format!("container {path}")));
        }
        let image = self.storage.load(path)?;
        let (header, _) = decode_header(&image)?;
        Ok(header)
    }

    /// Fully decode the container at `path`, verifying its integrity
    pub fn verify(&self, path: &str) -> Result<ContainerHeader> {
        let container = self.open(path)?;
        Ok(container.header().clone())
    }
}

/// Object-safe view of a [`ContainerEngine`]
///
/// Lets callers hold engines with different adapters behind one type, as
/// returned by [`create_engine_from_config`].
pub trait ContainerStore {
    fn create(&self, path: &str) -> Result<Container>;
    fn open(&self, path: &str) -> Result<Container>;
    fn flush(&self, container: &mut Container) -> Result<()>;
    fn close(&self, container: Container) -> Result<ContainerHeader>;
    fn exists(&self, path: &str) -> bool;
    fn delete(&self, path: &str) -> Result<()>;
    fn header(&self, path: &str) -> Result<ContainerHeader>;
    fn verify(&self, path: &str) -> Result<ContainerHeader>;

    /// Open the container at `path`, creating an empty one if there is none
    fn open_or_create(&self, path: &str) -> Result<Container> {
        if self.exists(path) {
            self.open(path)
        } else {
            self.create(path)
        }
    }
}

impl<S, C> ContainerStore for ContainerEngine<S, C>
where
    S: StorageAdapter,
    C: CompressionAdapter,
{
    fn create(&self, path: &str) -> Result<Container> {
        self.create(path)
    }

    fn open(&self, path: &str) -> Result<Container> {
        self.open(path)
    }

    fn flush(&self, container: &mut Container) -> Result<()> {
        self.flush(container)
    }

    fn close(&self, container: Container) -> Result<ContainerHeader> {
        self.close(container)
    }

    fn exists(&self, path: &str) -> bool {
        self.exists(path)
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.delete(path)
    }

    fn header(&self, path: &str) -> Result<ContainerHeader> {
        self.header(path)
    }

    fn verify(&self, path: &str) -> Result<ContainerHeader> {
        self.verify(path)
    }
}

/// Open `path` (creating it if absent), run `work`, then close it
///
/// The container is only persisted when `work` succeeds.
pub fn with_container<T, F>(store: &dyn ContainerStore, path: &str, work: F) -> Result<T>
where
    F: FnOnce(&mut Container) -> Result<T>,
{
    let mut container = store.open_or_create(path)?;
    let value = work(&mut container)?;
    store.close(container)?;
    Ok(value)
}

/// Convenience function to create an engine with default components
///
/// Creates an engine with:
/// - Local file storage (no base directory)
/// - Gzip compression with default level
pub fn create_default_engine() -> ContainerEngine<LocalFileStorage, GzipCompressor> {
    ContainerEngine::new(LocalFileStorage::new(), GzipCompressor::new())
}

/// Engine keeping containers in memory, without compression
pub fn create_memory_engine() -> ContainerEngine<MemoryStorage, NoCompression> {
    ContainerEngine::new(MemoryStorage::new(), NoCompression::new())
}

/// Create an engine from configuration
///
/// # Example
/// ```rust
/// use checkpoint_core::{create_engine_from_config, EngineConfig};
///
/// let engine = create_engine_from_config(EngineConfig::in_memory())?;
/// let container = engine.create("run.ckpt")?;
/// engine.close(container)?;
/// assert!(engine.exists("run.ckpt"));
/// # Ok::<(), checkpoint_core::CheckpointError>(())
/// ```
pub fn create_engine_from_config(config: EngineConfig) -> Result<Box<dyn ContainerStore>> {
    config.validate()?;

    match config.backend {
        StorageBackend::Local => {
            let storage = match &config.local_base_path {
                Some(base_path) => LocalFileStorage::with_base_dir(base_path),
                None => LocalFileStorage::new(),
            };
            Ok(boxed_engine(storage, &config))
        }
        StorageBackend::Memory => Ok(boxed_engine(MemoryStorage::new(), &config)),
    }
}

fn boxed_engine<S>(storage: S, config: &EngineConfig) -> Box<dyn ContainerStore>
where
    S: StorageAdapter + 'static,
{
    match config.compression {
        CompressionKind::Gzip => {
            let compressor = match config.compression_level {
                Some(level) => GzipCompressor::with_level(level),
                None => GzipCompressor::new(),
            };
            Box::new(ContainerEngine::new(storage, compressor))
        }
        CompressionKind::None => Box::new(ContainerEngine::new(storage, NoCompression::new())),
    }
}
