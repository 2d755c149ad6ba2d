//! Abstract byte-object storage underneath heap files.
//!
//! Implemented by `skyline-io::FsStorage` for the local filesystem and by
//! `skyline-io::MemoryStorage` for tests and embedded use.

use crate::error::Result;

pub trait Storage: Send + Sync {
    /// Write bytes to a path, replacing any previous object. Creates parent
    /// directories if needed.
    fn write(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Read a byte range from a path. May return fewer than `len` bytes at the
    /// end of the object.
    fn read_range(&self, path: &str, offset: u64, len: usize) -> Result<Vec<u8>>;

    /// Delete a path. Idempotent (no error if path doesn't exist).
    fn delete(&self, path: &str) -> Result<()>;

    /// List all paths under a prefix.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Get size of a path in bytes.
    fn size(&self, path: &str) -> Result<u64>;

    /// Get an ETag or hash for a path (optional, for caching/validation).
    fn etag(&self, path: &str) -> Result<Option<String>>;

    /// Read a whole object.
    fn read_all(&self, path: &str) -> Result<Vec<u8>> {
        let len = self.size(path)? as usize;
        self.read_range(path, 0, len)
    }
}
