//! Named heap-file relations on top of a `Storage` backend.
//!
//! A relation `name` under `root` is stored as:
//! - `root/name/relation.json`: the manifest (`RelationMeta`)
//! - `root/name/page-00000000.pg`, ...: pages (see `page.rs`)
//!
//! A `HeapFile` handle caches the manifest, so a relation should have at most
//! one writer handle at a time.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use skyline_core::config::StorageConfig;
use skyline_core::id::{PageId, RecordId};

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::page::Page;
use crate::scan::HeapScan;
use crate::storage::Storage;

pub const DEFAULT_PAGE_CAPACITY: usize = 64;
const MANIFEST: &str = "relation.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMeta {
    pub name: String,
    pub page_count: u32,
    pub record_count: u64,
    pub page_capacity: u32,
    pub codec: Codec,
}

/// Catalog of heap-file relations under one storage root.
#[derive(Clone)]
pub struct RelationStore {
    storage: Arc<dyn Storage>,
    root: String,
    page_capacity: usize,
    codec: Codec,
}

impl RelationStore {
    pub fn new(storage: Arc<dyn Storage>, root: impl Into<String>) -> Self {
        Self {
            storage,
            root: root.into().trim_end_matches('/').to_string(),
            page_capacity: DEFAULT_PAGE_CAPACITY,
            codec: Codec::None,
        }
    }

    pub fn from_config(storage: Arc<dyn Storage>, cfg: &StorageConfig) -> Result<Self> {
        let codec = Codec::from_name(&cfg.page_codec)?;
        Ok(Self::new(storage, cfg.root.clone())
            .with_page_capacity(cfg.page_capacity)
            .with_codec(codec))
    }

    pub fn with_page_capacity(mut self, records: usize) -> Self {
        self.page_capacity = records.clamp(1, u16::MAX as usize);
        self
    }

    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    fn relation_dir(&self, name: &str) -> String {
        format!("{}/{}", self.root, name)
    }

    fn manifest_path(&self, name: &str) -> String {
        format!("{}/{}/{}", self.root, name, MANIFEST)
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        let manifest = self.manifest_path(name);
        Ok(self
            .storage
            .list(&self.relation_dir(name))?
            .iter()
            .any(|p| *p == manifest))
    }

    /// Create an empty relation. Fails if one already exists under `name`.
    pub fn create(&self, name: &str) -> Result<HeapFile> {
        if self.exists(name)? {
            return Err(Error::RelationExists(name.to_string()));
        }
        let meta = RelationMeta {
            name: name.to_string(),
            page_count: 0,
            record_count: 0,
            page_capacity: self.page_capacity as u32,
            codec: self.codec,
        };
        let file = HeapFile {
            storage: Arc::clone(&self.storage),
            dir: self.relation_dir(name),
            meta,
            tail: None,
        };
        file.write_manifest()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(relation = name, "created relation");

        Ok(file)
    }

    pub fn open(&self, name: &str) -> Result<HeapFile> {
        if !self.exists(name)? {
            return Err(Error::RelationNotFound(name.to_string()));
        }
        let bytes = self.storage.read_all(&self.manifest_path(name))?;
        let meta: RelationMeta = serde_json::from_slice(&bytes)?;
        Ok(HeapFile {
            storage: Arc::clone(&self.storage),
            dir: self.relation_dir(name),
            meta,
            tail: None,
        })
    }

    /// Delete a relation and all of its pages. Idempotent.
    pub fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let prefix = format!("{}/", self.relation_dir(name));
        let manifest = self.manifest_path(name);
        let mut paths: Vec<String> = self
            .storage
            .list(&self.relation_dir(name))?
            .into_iter()
            .filter(|p| p.starts_with(&prefix))
            .collect();
        // Manifest last, so a half-deleted relation is still visible and can
        // be deleted again.
        paths.sort_by_key(|p| *p == manifest);
        for path in &paths {
            self.storage.delete(path)?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(relation = name, objects = paths.len(), "deleted relation");

        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

pub(crate) fn page_path(dir: &str, page: PageId) -> String {
    format!("{}/page-{:08}.pg", dir, page.get())
}

pub(crate) fn read_page(storage: &dyn Storage, dir: &str, page: PageId) -> Result<Page> {
    let path = page_path(dir, page);
    let bytes = storage.read_all(&path)?;
    Page::decode(&bytes, &path)
}

/// Handle to one stored relation.
pub struct HeapFile {
    storage: Arc<dyn Storage>,
    dir: String,
    meta: RelationMeta,
    /// Cached image of the last page while it still has room.
    tail: Option<Page>,
}

impl HeapFile {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn meta(&self) -> &RelationMeta {
        &self.meta
    }

    /// Live records.
    pub fn record_count(&self) -> u64 {
        self.meta.record_count
    }

    pub fn page_count(&self) -> u32 {
        self.meta.page_count
    }

    fn write_manifest(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&self.meta)?;
        self.storage
            .write(&format!("{}/{}", self.dir, MANIFEST), &bytes)
    }

    fn write_page(&self, page_id: PageId, page: &Page) -> Result<()> {
        let bytes = page.encode(self.meta.codec)?;
        self.storage.write(&page_path(&self.dir, page_id), &bytes)
    }

    /// Append a record image. Pages and manifest are written through.
    pub fn insert(&mut self, bytes: &[u8]) -> Result<RecordId> {
        let capacity = self.meta.page_capacity as usize;

        if self.tail.is_none() && self.meta.page_count > 0 {
            let last = PageId::new(self.meta.page_count - 1);
            let page = read_page(self.storage.as_ref(), &self.dir, last)?;
            self.tail = Some(page);
        }

        let mut page = match self.tail.take() {
            Some(page) if page.len() < capacity => page,
            _ => {
                self.meta.page_count += 1;
                Page::new()
            }
        };
        let page_id = PageId::new(self.meta.page_count - 1);
        let slot = page.push(bytes)?;

        self.write_page(page_id, &page)?;
        self.meta.record_count += 1;
        self.write_manifest()?;
        self.tail = Some(page);

        Ok(RecordId::new(page_id, slot))
    }

    pub fn get(&self, rid: RecordId) -> Result<Vec<u8>> {
        if rid.page.get() >= self.meta.page_count {
            return Err(Error::InvalidRecord(rid));
        }
        let page = read_page(self.storage.as_ref(), &self.dir, rid.page)?;
        page.get(rid.slot)
            .map(|b| b.to_vec())
            .ok_or(Error::InvalidRecord(rid))
    }

    /// Tombstone one record.
    pub fn delete_record(&mut self, rid: RecordId) -> Result<()> {
        if rid.page.get() >= self.meta.page_count {
            return Err(Error::InvalidRecord(rid));
        }
        let mut page = read_page(self.storage.as_ref(), &self.dir, rid.page)?;
        if !page.tombstone(rid.slot) {
            return Err(Error::InvalidRecord(rid));
        }
        self.write_page(rid.page, &page)?;
        self.meta.record_count = self.meta.record_count.saturating_sub(1);
        self.write_manifest()?;
        // The tail cache may hold the page we just rewrote.
        self.tail = None;
        Ok(())
    }

    /// Sequential scan from the first page, one page at a time.
    pub fn open_scan(&self) -> HeapScan {
        self.open_scan_with_readahead(1)
    }

    /// Sequential scan that buffers up to `pages` pages per storage round.
    pub fn open_scan_with_readahead(&self, pages: usize) -> HeapScan {
        HeapScan::new(
            Arc::clone(&self.storage),
            self.dir.clone(),
            self.meta.page_count,
            pages,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_validated() {
        assert!(validate_name("hf_copy_nls").is_ok());
        assert!(validate_name("scratch-1.v2").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("a/b").is_err());
    }

    #[test]
    fn page_paths_are_zero_padded() {
        assert_eq!(page_path("r/x", PageId::new(7)), "r/x/page-00000007.pg");
    }
}
