//! Pull-based iterator contract shared by every operator and scan.
//!
//! The consumer calls `next_tuple` until it returns `None` (or an error), then
//! calls `close` exactly once. `close` must be safe to call again.

use skyline_core::schema::Schema;
use skyline_core::types::Tuple;

use crate::error::Result;

pub trait TupleIterator: Send {
    /// Schema of every tuple this iterator produces.
    fn schema(&self) -> &Schema;

    /// Next tuple, or `None` once the input is exhausted.
    fn next_tuple(&mut self) -> Result<Option<Tuple>>;

    /// Release resources. Idempotent.
    fn close(&mut self) -> Result<()>;

    /// Stored relation whose tuples this iterator yields unchanged, if any.
    fn source_relation(&self) -> Option<&str> {
        None
    }
}

impl<T: TupleIterator + ?Sized> TupleIterator for Box<T> {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }

    fn next_tuple(&mut self) -> Result<Option<Tuple>> {
        (**self).next_tuple()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn source_relation(&self) -> Option<&str> {
        (**self).source_relation()
    }
}

/// Drain `iter` into a vector. Does not close it.
pub fn collect_tuples<I: TupleIterator + ?Sized>(iter: &mut I) -> Result<Vec<Tuple>> {
    let mut out = Vec::new();
    while let Some(t) = iter.next_tuple()? {
        out.push(t);
    }
    Ok(out)
}
