#![forbid(unsafe_code)]
//! skyline-io: concrete `skyline_heap::Storage` backends.
//!
//! - `FsStorage`: local filesystem.
//! - `MemoryStorage`: process-local map, used for `memory://` URIs and tests.

pub mod error;
pub mod memory_storage;
pub mod storage;

pub use error::{Error, Result};
pub use memory_storage::MemoryStorage;
pub use storage::{build_relation_store, build_storage_from_config, FsStorage};
