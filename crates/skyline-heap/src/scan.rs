//! Sequential cursor over a heap file.

use std::collections::VecDeque;
use std::sync::Arc;

use skyline_core::id::{PageId, RecordId};

use crate::error::{Error, Result};
use crate::heapfile::read_page;
use crate::storage::Storage;

/// Cursor yielding `(RecordId, record bytes)` in storage order.
///
/// The page count is fixed when the scan opens. Pages are read lazily, up to
/// `readahead` at a time; records tombstoned after their page was buffered are
/// still returned.
pub struct HeapScan {
    storage: Arc<dyn Storage>,
    dir: String,
    page_count: u32,
    next_page: u32,
    readahead: usize,
    buffered: VecDeque<(RecordId, Vec<u8>)>,
    pages_read: u64,
    closed: bool,
}

impl HeapScan {
    pub(crate) fn new(
        storage: Arc<dyn Storage>,
        dir: String,
        page_count: u32,
        readahead: usize,
    ) -> Self {
        Self {
            storage,
            dir,
            page_count,
            next_page: 0,
            readahead: readahead.max(1),
            buffered: VecDeque::new(),
            pages_read: 0,
            closed: false,
        }
    }

    /// Next live record, or `None` at end of relation.
    pub fn next(&mut self) -> Result<Option<(RecordId, Vec<u8>)>> {
        loop {
            if self.closed {
                return Err(Error::ScanClosed);
            }
            if let Some(entry) = self.buffered.pop_front() {
                return Ok(Some(entry));
            }
            if self.next_page >= self.page_count {
                return Ok(None);
            }
            self.fill()?;
        }
    }

    fn fill(&mut self) -> Result<()> {
        let mut budget = self.readahead;
        while budget > 0 && self.next_page < self.page_count {
            let page_id = PageId::new(self.next_page);
            let page = read_page(self.storage.as_ref(), &self.dir, page_id)?;
            self.buffered.extend(
                page.live_slots()
                    .map(|(slot, bytes)| (RecordId::new(page_id, slot), bytes.to_vec())),
            );
            self.next_page += 1;
            self.pages_read += 1;
            budget -= 1;
        }
        Ok(())
    }

    /// Pages fetched from storage so far.
    pub fn pages_read(&self) -> u64 {
        self.pages_read
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Release buffered pages. Idempotent.
    pub fn close(&mut self) {
        self.closed = true;
        self.buffered.clear();
    }
}
