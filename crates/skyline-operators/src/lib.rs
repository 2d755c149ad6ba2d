#![forbid(unsafe_code)]
//! skyline-operators: pull-based skyline evaluation over stored relations.
//!
//! - `TupleIterator` is the contract between operators and their sources.
//! - `NestedLoopSkyline` copies the base relation into a private scratch
//!   relation and checks every outer candidate against it.
//! - Dominance is decided by `dominance::dominates` over a `PreferenceList`.

pub mod dominance;
pub mod error;
pub mod preference;
pub mod scan;
pub mod skyline;
pub mod traits;
pub mod working_copy;

pub use dominance::dominates;
pub use error::{OpError, Result, ScanSide};
pub use preference::{Direction, Preference, PreferenceList};
pub use scan::{FileScan, ValuesScan};
pub use skyline::{NestedLoopSkyline, SkylineOptions, SkylineState, SkylineStats};
pub use traits::{collect_tuples, TupleIterator};
pub use working_copy::WorkingCopy;
