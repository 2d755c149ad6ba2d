//! In-memory storage backend.
//!
//! Provides a HashMap-based storage that implements the Storage trait.
//! Used for the `memory://` URI scheme and in tests to avoid file I/O.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use skyline_heap::error::{Error as HeapError, Result as HeapResult};
use skyline_heap::Storage;

/// Thread-safe in-memory storage using a HashMap. Clones share contents.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> HeapResult<MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.data
            .lock()
            .map_err(|_| HeapError::Storage("memory storage lock poisoned".into()))
    }

    /// Check if a path exists
    pub fn contains(&self, path: &str) -> bool {
        self.lock().map(|d| d.contains_key(path)).unwrap_or(false)
    }

    /// Get the number of stored objects
    pub fn len(&self) -> usize {
        self.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Paths under `prefix`, sorted.
    pub fn paths(&self, prefix: &str) -> Vec<String> {
        self.list(prefix).unwrap_or_default()
    }
}

impl Storage for MemoryStorage {
    fn write(&self, path: &str, bytes: &[u8]) -> HeapResult<()> {
        self.lock()?.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn read_range(&self, path: &str, offset: u64, len: usize) -> HeapResult<Vec<u8>> {
        let data = self.lock()?;
        let bytes = data
            .get(path)
            .ok_or_else(|| HeapError::Storage(format!("path not found: {}", path)))?;

        let start = offset as usize;
        if start > bytes.len() {
            return Err(HeapError::Storage(format!(
                "offset {} exceeds size {}",
                offset,
                bytes.len()
            )));
        }
        let end = start.saturating_add(len).min(bytes.len());
        Ok(bytes[start..end].to_vec())
    }

    fn delete(&self, path: &str) -> HeapResult<()> {
        self.lock()?.remove(path);
        Ok(())
    }

    fn list(&self, prefix: &str) -> HeapResult<Vec<String>> {
        let data = self.lock()?;
        let mut result: Vec<String> = data
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        result.sort();
        Ok(result)
    }

    fn size(&self, path: &str) -> HeapResult<u64> {
        let data = self.lock()?;
        let bytes = data
            .get(path)
            .ok_or_else(|| HeapError::Storage(format!("path not found: {}", path)))?;
        Ok(bytes.len() as u64)
    }

    fn etag(&self, path: &str) -> HeapResult<Option<String>> {
        let data = self.lock()?;
        Ok(data
            .get(path)
            .map(|bytes| blake3::hash(bytes).to_hex().to_string()))
    }
}
