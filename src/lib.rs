#![forbid(unsafe_code)]
//! Nested-loop skyline evaluation over heap-file relations.
//!
//! Facade over the workspace crates:
//! - [`skyline_core`]: schema, scalar and tuple types, identifiers, engine configuration
//! - [`skyline_heap`]: heap-file relations, page format, tuple codec
//! - [`skyline_io`]: filesystem and in-memory storage backends
//! - [`skyline_operators`]: the skyline operator and its scan sources

pub use skyline_core;
pub use skyline_heap;
pub use skyline_io;
pub use skyline_operators;

pub use skyline_core::config::EngineConfig;
pub use skyline_heap::RelationStore;
pub use skyline_operators::{
    NestedLoopSkyline, OpError, Preference, PreferenceList, SkylineOptions, TupleIterator,
};

/// Relation store for the configuration read from `SKYLINE_*` environment
/// variables.
pub fn relation_store_from_env() -> skyline_io::Result<RelationStore> {
    let cfg = EngineConfig::from_env();
    cfg.validate()
        .map_err(|e| skyline_io::Error::Config(e.to_string()))?;
    skyline_io::build_relation_store(&cfg.storage_config())
}
