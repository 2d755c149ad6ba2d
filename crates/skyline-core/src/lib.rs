#![forbid(unsafe_code)]
//! skyline-core: schemas, typed values, identifiers and engine configuration.
//!
//! Pure data only. Storage lives in `skyline-heap`/`skyline-io`, operators in
//! `skyline-operators`.

pub mod config;
pub mod error;
pub mod id;
pub mod prelude;
pub mod schema;
pub mod types;

pub use error::{Error, Result};
