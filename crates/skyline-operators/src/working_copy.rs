//! Operator-private snapshot of the base relation.
//!
//! The skyline operator scans this copy once per outer candidate. The scratch
//! relation is created once; only the cursor is reset between candidates.

use skyline_core::id::RecordId;
use skyline_core::schema::Schema;
use skyline_core::types::Tuple;
use skyline_heap::{decode_tuple, HeapFile, HeapScan, RelationStore};

use crate::error::{OpError, Result};

pub struct WorkingCopy {
    store: RelationStore,
    file: HeapFile,
    schema: Schema,
    buffer_pages: usize,
    cursor: Option<HeapScan>,
    disposed: bool,
}

impl WorkingCopy {
    /// Copy every record of `base` into a fresh relation named `scratch`,
    /// replacing any stale relation of that name.
    pub fn initialize(
        store: &RelationStore,
        base: &str,
        scratch: &str,
        schema: Schema,
        buffer_pages: usize,
    ) -> Result<Self> {
        if base == scratch {
            return Err(OpError::Config(format!(
                "scratch relation must not reuse the base relation name '{base}'"
            )));
        }
        let source = store.open(base)?;

        if store.exists(scratch)? {
            #[cfg(feature = "tracing")]
            tracing::debug!(scratch, "replacing stale scratch relation");
            store.delete(scratch)?;
        }
        let mut file = store.create(scratch)?;

        if let Err(e) = copy_records(&source, &mut file, buffer_pages) {
            // Don't leave a partial copy behind.
            if let Err(_cleanup) = store.delete(scratch) {
                #[cfg(feature = "tracing")]
                tracing::warn!(scratch, error = %_cleanup, "failed to delete partial working copy");
            }
            return Err(e);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            base,
            scratch,
            records = file.record_count(),
            "working copy initialized"
        );

        Ok(Self {
            store: store.clone(),
            file,
            schema,
            buffer_pages,
            cursor: None,
            disposed: false,
        })
    }

    pub fn name(&self) -> &str {
        self.file.name()
    }

    /// Live records in the copy.
    pub fn record_count(&self) -> u64 {
        self.file.record_count()
    }

    /// Close any open cursor and start a new one at the first record.
    pub fn open_inner_scan(&mut self) -> Result<()> {
        self.close_inner_scan();
        if self.disposed {
            return Err(skyline_heap::Error::RelationNotFound(self.name().to_string()).into());
        }
        self.cursor = Some(self.file.open_scan_with_readahead(self.buffer_pages));
        Ok(())
    }

    /// Next record of the open cursor with the schema attached. `None` at the
    /// end, or when no cursor is open.
    pub fn next_inner(&mut self) -> Result<Option<(RecordId, Tuple)>> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };
        match cursor.next()? {
            Some((rid, bytes)) => Ok(Some((rid, decode_tuple(&bytes, &self.schema)?))),
            None => Ok(None),
        }
    }

    /// Idempotent.
    pub fn close_inner_scan(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close();
        }
    }

    pub fn has_open_scan(&self) -> bool {
        self.cursor.is_some()
    }

    /// Remove a record from the copy. The open cursor is unaffected.
    pub fn prune(&mut self, rid: RecordId) -> Result<()> {
        self.file.delete_record(rid)?;
        Ok(())
    }

    /// Delete the scratch relation. Later calls are no-ops.
    pub fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.close_inner_scan();
        self.store.delete(self.file.name())?;
        self.disposed = true;

        #[cfg(feature = "tracing")]
        tracing::debug!(scratch = self.file.name(), "working copy disposed");

        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for WorkingCopy {
    fn drop(&mut self) {
        if !self.disposed {
            let _ = self.dispose();
        }
    }
}

fn copy_records(source: &HeapFile, target: &mut HeapFile, buffer_pages: usize) -> Result<()> {
    let mut scan = source.open_scan_with_readahead(buffer_pages);
    while let Some((_, bytes)) = scan.next()? {
        target.insert(&bytes)?;
    }
    scan.close();
    Ok(())
}
