//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use skyline_core::schema::{DataType, Field, Schema};
use skyline_core::types::{Scalar, Tuple};
use skyline_heap::error::{Error as HeapError, Result as HeapResult};
use skyline_heap::{encode_tuple, RelationStore, Storage};
use skyline_io::MemoryStorage;
use skyline_operators::{dominates, Preference};

/// Fresh directory under the system temp dir, removed first if it exists.
pub fn create_temp_data_dir(name: &str) -> String {
    let mut dir = std::env::temp_dir();
    dir.push(format!("skyline-tests-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir.to_string_lossy().to_string()
}

pub fn memory_store() -> RelationStore {
    RelationStore::new(Arc::new(MemoryStorage::new()), "mem").with_page_capacity(4)
}

/// `n` Int32 columns named c0, c1, ...
pub fn int_schema(n: usize) -> Schema {
    Schema::new(
        (0..n)
            .map(|i| Field::new(format!("c{i}"), DataType::Int32))
            .collect(),
    )
}

pub fn int_row(values: &[i32]) -> Tuple {
    Tuple::new(values.iter().map(|v| Scalar::I32(*v)).collect())
}

pub fn int_rows(rows: &[&[i32]]) -> Vec<Tuple> {
    rows.iter().map(|r| int_row(r)).collect()
}

/// Create `name` in `store` holding `rows` in order.
pub fn load_relation(store: &RelationStore, name: &str, schema: &Schema, rows: &[Tuple]) {
    let mut file = store.create(name).expect("create relation");
    for row in rows {
        let bytes = encode_tuple(row, schema).expect("encode row");
        file.insert(&bytes).expect("insert row");
    }
}

/// Deterministic pseudo-random Int32 rows with values in `0..modulo`.
pub fn generate_random_rows(count: usize, dims: usize, modulo: i32, seed: u64) -> Vec<Tuple> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 33) % modulo.max(1) as u64) as i32
    };
    (0..count)
        .map(|_| Tuple::new((0..dims).map(|_| Scalar::I32(next())).collect()))
        .collect()
}

/// Every row of `rows` not dominated by another row, in input order.
pub fn brute_force_skyline(rows: &[Tuple], schema: &Schema, prefs: &[Preference]) -> Vec<Tuple> {
    rows.iter()
        .filter(|candidate| {
            !rows
                .iter()
                .any(|other| dominates(other, candidate, schema, prefs).expect("comparable rows"))
        })
        .cloned()
        .collect()
}

/// In-memory storage that can be told to fail reads or deletes of paths
/// containing a marker.
#[derive(Clone)]
pub struct FailingStorage {
    inner: MemoryStorage,
    marker: String,
    fail_reads: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
}

impl FailingStorage {
    pub fn new(marker: &str) -> Self {
        Self {
            inner: MemoryStorage::new(),
            marker: marker.to_string(),
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_deletes: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, on: bool) {
        self.fail_deletes.store(on, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }

    fn armed(&self, flag: &AtomicBool, path: &str) -> bool {
        flag.load(Ordering::SeqCst) && path.contains(&self.marker)
    }
}

impl Storage for FailingStorage {
    fn write(&self, path: &str, bytes: &[u8]) -> HeapResult<()> {
        self.inner.write(path, bytes)
    }

    fn read_range(&self, path: &str, offset: u64, len: usize) -> HeapResult<Vec<u8>> {
        if self.armed(&self.fail_reads, path) {
            return Err(HeapError::Storage(format!("injected read failure: {path}")));
        }
        self.inner.read_range(path, offset, len)
    }

    fn delete(&self, path: &str) -> HeapResult<()> {
        if self.armed(&self.fail_deletes, path) {
            return Err(HeapError::Storage(format!("injected delete failure: {path}")));
        }
        self.inner.delete(path)
    }

    fn list(&self, prefix: &str) -> HeapResult<Vec<String>> {
        self.inner.list(prefix)
    }

    fn size(&self, path: &str) -> HeapResult<u64> {
        if self.armed(&self.fail_reads, path) {
            return Err(HeapError::Storage(format!("injected size failure: {path}")));
        }
        self.inner.size(path)
    }

    fn etag(&self, path: &str) -> HeapResult<Option<String>> {
        self.inner.etag(path)
    }
}
