use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use blake3::Hasher;
use skyline_heap::error::{Error as HeapError, Result as HeapResult};
use skyline_heap::Storage;

/// Local filesystem storage (rooted at the host filesystem).
#[derive(Debug, Clone, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for FsStorage {
    fn write(&self, path: &str, bytes: &[u8]) -> HeapResult<()> {
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| HeapError::Storage(format!("mkparent {path}: {e}")))?;
        }
        let mut f =
            File::create(p).map_err(|e| HeapError::Storage(format!("create {path}: {e}")))?;
        f.write_all(bytes)
            .map_err(|e| HeapError::Storage(format!("write {path}: {e}")))?;
        f.flush()
            .map_err(|e| HeapError::Storage(format!("flush {path}: {e}")))?;
        Ok(())
    }

    fn read_range(&self, path: &str, offset: u64, len: usize) -> HeapResult<Vec<u8>> {
        let mut f = File::open(Path::new(path))
            .map_err(|e| HeapError::Storage(format!("open {path}: {e}")))?;
        f.seek(SeekFrom::Start(offset))
            .map_err(|e| HeapError::Storage(format!("seek {path}: {e}")))?;
        let mut buf = Vec::with_capacity(len);
        f.take(len as u64)
            .read_to_end(&mut buf)
            .map_err(|e| HeapError::Storage(format!("read {path}: {e}")))?;
        Ok(buf)
    }

    fn delete(&self, path: &str) -> HeapResult<()> {
        let p = Path::new(path);
        if p.exists() {
            fs::remove_file(p).map_err(|e| HeapError::Storage(format!("delete {path}: {e}")))?;
            // Drop the relation directory once its last object is gone; a
            // non-empty directory makes this fail, which is expected.
            if let Some(parent) = p.parent() {
                let _ = fs::remove_dir(parent);
            }
        }
        Ok(())
    }

    fn list(&self, prefix: &str) -> HeapResult<Vec<String>> {
        let prefix_path = Path::new(prefix);
        let mut results = Vec::new();

        if !prefix_path.exists() {
            return Ok(results);
        }

        if prefix_path.is_file() {
            if let Some(s) = prefix_path.to_str() {
                results.push(s.to_string());
            }
            return Ok(results);
        }

        fn visit_dirs(dir: &Path, results: &mut Vec<String>) -> std::io::Result<()> {
            if dir.is_dir() {
                for entry in fs::read_dir(dir)? {
                    let entry = entry?;
                    let path = entry.path();
                    if path.is_dir() {
                        visit_dirs(&path, results)?;
                    } else if let Some(s) = path.to_str() {
                        results.push(s.to_string());
                    }
                }
            }
            Ok(())
        }

        visit_dirs(prefix_path, &mut results)
            .map_err(|e| HeapError::Storage(format!("list {prefix}: {e}")))?;

        results.sort();
        Ok(results)
    }

    fn size(&self, path: &str) -> HeapResult<u64> {
        let meta =
            fs::metadata(path).map_err(|e| HeapError::Storage(format!("size {path}: {e}")))?;
        Ok(meta.len())
    }

    fn etag(&self, path: &str) -> HeapResult<Option<String>> {
        // Lightweight pseudo-ETag: hash(size || mtime || path)
        let p = Path::new(path);
        match fs::metadata(p) {
            Ok(meta) => {
                let mut h = Hasher::new();
                h.update(&meta.len().to_le_bytes());
                if let Ok(m) = meta.modified() {
                    if let Ok(d) = m.duration_since(std::time::SystemTime::UNIX_EPOCH) {
                        h.update(&d.as_secs().to_le_bytes());
                        h.update(&d.subsec_nanos().to_le_bytes());
                    }
                }
                h.update(path.as_bytes());
                Ok(Some(h.finalize().to_hex().to_string()))
            }
            Err(_) => Ok(None),
        }
    }
}
