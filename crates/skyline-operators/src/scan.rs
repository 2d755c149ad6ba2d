//! Leaf sources: a sequential scan of a stored relation and an in-memory
//! value list.

use std::collections::VecDeque;

use skyline_core::schema::Schema;
use skyline_core::types::Tuple;
use skyline_heap::{decode_tuple, HeapScan, RelationStore};

use crate::error::{OpError, Result};
use crate::traits::TupleIterator;

/// Sequential scan over a stored relation, decoding each record with `schema`.
pub struct FileScan {
    schema: Schema,
    relation: String,
    cursor: Option<HeapScan>,
}

impl FileScan {
    pub fn open(store: &RelationStore, relation: &str, schema: Schema) -> Result<Self> {
        schema.validate()?;
        let file = store.open(relation)?;
        Ok(Self {
            schema,
            relation: relation.to_string(),
            cursor: Some(file.open_scan()),
        })
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }
}

impl TupleIterator for FileScan {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next_tuple(&mut self) -> Result<Option<Tuple>> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Err(OpError::Storage(skyline_heap::Error::ScanClosed));
        };
        match cursor.next()? {
            Some((_, bytes)) => Ok(Some(decode_tuple(&bytes, &self.schema)?)),
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close();
        }
        Ok(())
    }

    fn source_relation(&self) -> Option<&str> {
        Some(&self.relation)
    }
}

/// Tuples held in memory, produced in insertion order.
pub struct ValuesScan {
    schema: Schema,
    rows: VecDeque<Tuple>,
    closed: bool,
}

impl ValuesScan {
    pub fn new(schema: Schema, rows: Vec<Tuple>) -> Self {
        Self {
            schema,
            rows: rows.into(),
            closed: false,
        }
    }
}

impl TupleIterator for ValuesScan {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next_tuple(&mut self) -> Result<Option<Tuple>> {
        if self.closed {
            return Ok(None);
        }
        Ok(self.rows.pop_front())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.rows.clear();
        Ok(())
    }
}
