#![forbid(unsafe_code)]
//! skyline-heap: heap-file relations, page format and tuple codec.
//!
//! Relations are named collections of fixed-layout records stored as
//! checksummed pages behind the `Storage` trait. Concrete storage backends live
//! in `skyline-io`.

pub mod codec;
pub mod error;
pub mod heapfile;
pub mod page;
pub mod record;
pub mod scan;
pub mod storage;

pub use codec::Codec;
pub use error::{Error, Result};
pub use heapfile::{HeapFile, RelationMeta, RelationStore};
pub use record::{decode_tuple, encode_tuple};
pub use scan::HeapScan;
pub use storage::Storage;
