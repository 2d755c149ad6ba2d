//! Convenient re-exports for downstream crates.

pub use crate::config::{EngineConfig, StorageConfig};
pub use crate::error::{Error, Result};
pub use crate::id::{PageId, RecordId, SlotId};
pub use crate::schema::{DataType, Field, Schema};
pub use crate::types::{Scalar, Tuple};
