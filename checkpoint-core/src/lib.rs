/*!
# Checkpoint Core

Checkpoint and restore engine for agent-based epidemic simulations.

A checkpoint is a single hierarchical container holding, per simulation run:

- the run configuration, with the input files it was started from embedded
  as blobs,
- the geography of the region (cluster locations and towns),
- one dated snapshot per checkpointed day: the population, cluster
  memberships and travel journals.

Several runs can share one container (`Simulation 0`, `Simulation 1`, ...);
runs can be combined into and split out of such a container.

## Architecture

Storage and compression are adapters behind the [`ContainerEngine`], which
reads and writes whole container images. Everything else works on an open
[`Container`] plus a [`RunScope`] naming the run:

- [`config_block::ConfigBlock`] reads and writes run configuration,
- [`snapshot::SnapshotManager`] saves and restores dated snapshots,
- [`composer`] combines and splits runs.

## Usage

```rust
use checkpoint_core::snapshot::{Snapshot, SnapshotManager};
use checkpoint_core::{create_memory_engine, RunScope};
use chrono::NaiveDate;

let engine = create_memory_engine();
let date = NaiveDate::from_ymd_opt(2020, 3, 15).unwrap();

let mut container = engine.create("flanders.ckpt")?;
let manager = SnapshotManager::new(RunScope::single());
manager.save_snapshot(&mut container, date, 74, &Snapshot::default())?;
engine.close(container)?;

let container = engine.open("flanders.ckpt")?;
let restored = manager.load_snapshot(&container, date)?;
assert!(restored.population.is_empty());
# Ok::<(), checkpoint_core::CheckpointError>(())
```
*/

pub mod composer;
pub mod compression;
pub mod config;
pub mod config_block;
pub mod container;
pub mod engine;
pub mod error;
pub mod header;
pub mod layout;
pub mod model;
pub mod observability;
pub mod records;
pub mod relation;
pub mod snapshot;
pub mod storage;

pub use composer::{combine_files, combine_run_into, split_all, split_run_out};
pub use compression::{CompressionAdapter, GzipCompressor, NoCompression};
pub use config::{CompressionKind, EngineConfig, StorageBackend};
pub use config_block::{ConfigBlob, ConfigBlock, EditableConfig};
pub use container::{copy_subtree, AttrValue, Container, NodePath};
pub use engine::{
    create_default_engine, create_engine_from_config, create_memory_engine, with_container,
    ContainerEngine, ContainerStore,
};
pub use error::{CheckpointError, Result};
pub use header::ContainerHeader;
pub use layout::{ContainerLayout, RunScope};
pub use snapshot::{last_snapshot_date_in, Snapshot, SnapshotManager};
pub use storage::{LocalFileStorage, MemoryStorage, StorageAdapter};
