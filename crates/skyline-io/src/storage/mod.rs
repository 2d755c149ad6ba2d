//! Storage adapters implementing `skyline_heap::Storage`, plus builders that
//! choose a backend from the configured data URI (`file:///var/skyline`,
//! `memory://`, or a bare directory).

mod fs;
pub use fs::FsStorage;

use std::sync::Arc;

use skyline_core::config::StorageConfig;
use skyline_heap::{RelationStore, Storage};

use crate::error::{Error, Result};
use crate::memory_storage::MemoryStorage;

/// Build the correct storage backend using the provided configuration.
pub fn build_storage_from_config(cfg: &StorageConfig) -> Result<Arc<dyn Storage>> {
    match cfg.scheme() {
        Some("file") | None => {
            // Default to filesystem (treat URI as file:// or bare path).
            Ok(Arc::new(FsStorage::new()))
        }
        Some("memory") | Some("mem") => Ok(Arc::new(MemoryStorage::new())),
        Some(other) => Err(Error::Config(format!("unsupported data scheme '{other}'"))),
    }
}

/// Backend plus relation catalog in one step.
pub fn build_relation_store(cfg: &StorageConfig) -> Result<RelationStore> {
    let storage = build_storage_from_config(cfg)?;
    Ok(RelationStore::from_config(storage, cfg)?)
}
