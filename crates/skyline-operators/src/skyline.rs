//! Nested-loop skyline operator.
//!
//! For every tuple pulled from the outer source, the operator scans its private
//! working copy of the base relation. The candidate is emitted iff no inner
//! tuple dominates it; the first dominating inner tuple ends the scan early.
//!
//! ```text
//!            produce_next()
//!   NeedOuter ──outer tuple──▶ ScanningInner ──dominated──▶ NeedOuter
//!       │                          │
//!    exhausted                 survived: emit, then NeedOuter
//!       ▼
//!      Done ──close()──▶ Closed
//! ```
//!
//! Any fault while pulling from either side moves the operator to `Done`; the
//! tuples produced before it are a valid prefix of the skyline.

use serde::{Deserialize, Serialize};
use skyline_core::config::EngineConfig;
use skyline_core::schema::Schema;
use skyline_core::types::Tuple;
use skyline_heap::RelationStore;
use uuid::Uuid;

use crate::dominance::dominates;
use crate::error::{OpError, Result, ScanSide};
use crate::preference::PreferenceList;
use crate::traits::TupleIterator;
use crate::working_copy::WorkingCopy;

const DEFAULT_SCRATCH_PREFIX: &str = "skyline_scratch";

fn default_buffer_pages() -> usize {
    1
}

fn default_scratch_prefix() -> String {
    DEFAULT_SCRATCH_PREFIX.to_string()
}

/// Construction options for [`NestedLoopSkyline`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkylineOptions {
    /// Schema of the base relation and of every outer tuple.
    pub schema: Schema,
    pub base_relation: String,
    pub preferences: PreferenceList,
    /// Inner-scan read-ahead in pages. Advisory.
    #[serde(default = "default_buffer_pages")]
    pub buffer_pages: usize,
    /// Delete inner records dominated by a candidate from the working copy.
    /// Requires an outer source that scans the base relation itself.
    #[serde(default)]
    pub prune_dominated: bool,
    /// Fixed scratch relation suffix, stored as `<scratch_prefix>_<name>`.
    /// Defaults to `<scratch_prefix>_<uuid>`.
    #[serde(default)]
    pub scratch_name: Option<String>,
    #[serde(default = "default_scratch_prefix")]
    pub scratch_prefix: String,
}

impl SkylineOptions {
    pub fn new(schema: Schema, base_relation: impl Into<String>, preferences: PreferenceList) -> Self {
        Self {
            schema,
            base_relation: base_relation.into(),
            preferences,
            buffer_pages: default_buffer_pages(),
            prune_dominated: false,
            scratch_name: None,
            scratch_prefix: default_scratch_prefix(),
        }
    }

    /// Take read-ahead and scratch prefix from the engine configuration.
    pub fn with_engine_config(mut self, cfg: &EngineConfig) -> Self {
        self.buffer_pages = cfg.buffer_pages;
        self.scratch_prefix = cfg.scratch_prefix.clone();
        self
    }

    pub fn with_buffer_pages(mut self, pages: usize) -> Self {
        self.buffer_pages = pages;
        self
    }

    pub fn with_pruning(mut self, prune: bool) -> Self {
        self.prune_dominated = prune;
        self
    }

    pub fn with_scratch_name(mut self, name: impl Into<String>) -> Self {
        self.scratch_name = Some(name.into());
        self
    }

    /// Scratch names always live under `scratch_prefix`, so a stale relation
    /// replaced at construction can never be a user relation.
    fn scratch_relation(&self) -> String {
        let namespace = format!("{}_", self.scratch_prefix);
        match &self.scratch_name {
            Some(name) if name.starts_with(&namespace) => name.clone(),
            Some(name) => format!("{namespace}{name}"),
            None => format!("{namespace}{}", Uuid::new_v4().simple()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkylineState {
    /// Next call pulls a new outer candidate.
    NeedOuter,
    /// A candidate is being checked against the working copy.
    ScanningInner,
    /// Outer source exhausted, or a fault ended the stream.
    Done,
    /// Resources released.
    Closed,
}

/// Counters for one operator instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkylineStats {
    pub outer_pulled: u64,
    pub inner_examined: u64,
    pub dominance_tests: u64,
    pub emitted: u64,
    pub rejected: u64,
    pub pruned: u64,
}

pub struct NestedLoopSkyline {
    schema: Schema,
    preferences: PreferenceList,
    prune: bool,
    outer: Box<dyn TupleIterator>,
    working: WorkingCopy,
    state: SkylineState,
    candidate: Option<Tuple>,
    stats: SkylineStats,
}

impl NestedLoopSkyline {
    /// Validate `options` and build the working copy. Fails without returning
    /// an operator if the base relation cannot be copied.
    pub fn new(
        store: &RelationStore,
        options: SkylineOptions,
        outer: Box<dyn TupleIterator>,
    ) -> Result<Self> {
        options.schema.validate()?;
        options.preferences.validate(&options.schema)?;
        if outer.schema() != &options.schema {
            return Err(OpError::Config(
                "outer source schema differs from the base relation schema".into(),
            ));
        }
        if options.prune_dominated
            && outer.source_relation() != Some(options.base_relation.as_str())
        {
            return Err(OpError::Config(format!(
                "prune_dominated requires an outer scan of '{}'",
                options.base_relation
            )));
        }

        let scratch = options.scratch_relation();
        let working = WorkingCopy::initialize(
            store,
            &options.base_relation,
            &scratch,
            options.schema.clone(),
            options.buffer_pages,
        )?;

        Ok(Self {
            schema: options.schema,
            preferences: options.preferences,
            prune: options.prune_dominated,
            outer,
            working,
            state: SkylineState::NeedOuter,
            candidate: None,
            stats: SkylineStats::default(),
        })
    }

    pub fn state(&self) -> SkylineState {
        self.state
    }

    pub fn stats(&self) -> SkylineStats {
        self.stats
    }

    /// Name of the private scratch relation.
    pub fn scratch_relation(&self) -> &str {
        self.working.name()
    }

    /// Next skyline tuple in outer order, or `None` when the stream is over.
    pub fn produce_next(&mut self) -> Result<Option<Tuple>> {
        loop {
            match self.state {
                SkylineState::Done | SkylineState::Closed => return Ok(None),
                SkylineState::NeedOuter => {
                    let next = match self.outer.next_tuple() {
                        Ok(next) => next,
                        Err(e) => return Err(self.fail(ScanSide::Outer, e)),
                    };
                    let Some(tuple) = next else {
                        self.working.close_inner_scan();
                        self.state = SkylineState::Done;
                        return Ok(None);
                    };
                    self.stats.outer_pulled += 1;

                    if let Err(e) = self.working.open_inner_scan() {
                        return Err(self.fail(ScanSide::Inner, e));
                    }
                    self.candidate = Some(tuple);
                    self.state = SkylineState::ScanningInner;
                }
                SkylineState::ScanningInner => {
                    let survived = match self.scan_candidate() {
                        Ok(survived) => survived,
                        Err(e) => return Err(self.fail(ScanSide::Inner, e)),
                    };
                    self.state = SkylineState::NeedOuter;
                    let candidate = self.candidate.take();
                    if survived {
                        self.stats.emitted += 1;
                        #[cfg(feature = "tracing")]
                        if let Some(t) = &candidate {
                            tracing::trace!(tuple = %t, "skyline tuple");
                        }
                        return Ok(candidate);
                    }
                    self.stats.rejected += 1;
                }
            }
        }
    }

    /// Check the current candidate against the working copy. Returns false as
    /// soon as an inner tuple dominates it.
    fn scan_candidate(&mut self) -> Result<bool> {
        let Some(candidate) = self.candidate.as_ref() else {
            return Err(OpError::Config("no candidate to scan for".into()));
        };
        let prefs = self.preferences.as_slice();

        while let Some((rid, inner)) = self.working.next_inner()? {
            self.stats.inner_examined += 1;

            self.stats.dominance_tests += 1;
            if dominates(&inner, candidate, &self.schema, prefs)? {
                #[cfg(feature = "tracing")]
                tracing::trace!(candidate = %candidate, by = %inner, "candidate dominated");
                return Ok(false);
            }

            if self.prune {
                self.stats.dominance_tests += 1;
                if dominates(candidate, &inner, &self.schema, prefs)? {
                    self.working.prune(rid)?;
                    self.stats.pruned += 1;
                }
            }
        }
        Ok(true)
    }

    fn fail(&mut self, side: ScanSide, e: OpError) -> OpError {
        self.working.close_inner_scan();
        self.candidate = None;
        self.state = SkylineState::Done;

        #[cfg(feature = "tracing")]
        tracing::warn!(%side, error = %e, "skyline evaluation aborted");

        OpError::execution(side, e)
    }

    /// Close the outer source, the inner cursor and drop the working copy.
    /// Every step runs even if an earlier one fails. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if self.state == SkylineState::Closed {
            return Ok(());
        }

        let mut errors = Vec::new();
        if let Err(e) = self.outer.close() {
            errors.push(e);
        }
        self.working.close_inner_scan();
        if let Err(e) = self.working.dispose() {
            errors.push(e);
        }
        self.candidate = None;
        self.state = SkylineState::Closed;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            scratch = self.working.name(),
            stats = ?self.stats,
            errors = errors.len(),
            "skyline closed"
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(OpError::Teardown(errors))
        }
    }
}

impl TupleIterator for NestedLoopSkyline {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next_tuple(&mut self) -> Result<Option<Tuple>> {
        self.produce_next()
    }

    fn close(&mut self) -> Result<()> {
        NestedLoopSkyline::close(self)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use skyline_core::schema::{DataType, Field};
    use skyline_core::types::Scalar;
    use skyline_heap::encode_tuple;
    use skyline_io::MemoryStorage;

    use super::*;
    use crate::scan::{FileScan, ValuesScan};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("a", DataType::Int32),
            Field::new("b", DataType::Int32),
        ])
    }

    fn row(a: i32, b: i32) -> Tuple {
        Tuple::new(vec![Scalar::I32(a), Scalar::I32(b)])
    }

    fn store_with(rows: &[Tuple]) -> RelationStore {
        let store = RelationStore::new(Arc::new(MemoryStorage::new()), "mem").with_page_capacity(2);
        let mut file = store.create("base").unwrap();
        for r in rows {
            file.insert(&encode_tuple(r, &schema()).unwrap()).unwrap();
        }
        store
    }

    fn options() -> SkylineOptions {
        SkylineOptions::new(schema(), "base", PreferenceList::minimize(&[0, 1]).unwrap())
    }

    #[test]
    fn state_walks_to_done_then_closed() {
        let rows = vec![row(1, 2), row(2, 1), row(3, 3)];
        let store = store_with(&rows);
        let outer = FileScan::open(&store, "base", schema()).unwrap();
        let mut op = NestedLoopSkyline::new(&store, options(), Box::new(outer)).unwrap();

        assert_eq!(op.state(), SkylineState::NeedOuter);
        assert_eq!(op.produce_next().unwrap(), Some(row(1, 2)));
        assert_eq!(op.produce_next().unwrap(), Some(row(2, 1)));
        assert_eq!(op.produce_next().unwrap(), None);
        assert_eq!(op.state(), SkylineState::Done);
        assert_eq!(op.produce_next().unwrap(), None);

        op.close().unwrap();
        assert_eq!(op.state(), SkylineState::Closed);
        assert_eq!(op.produce_next().unwrap(), None);
    }

    #[test]
    fn stats_count_early_exit() {
        // (1,1) dominates everything else and is stored first, so every other
        // candidate is rejected after one inner tuple.
        let rows = vec![row(1, 1), row(2, 2), row(3, 3)];
        let store = store_with(&rows);
        let outer = FileScan::open(&store, "base", schema()).unwrap();
        let mut op = NestedLoopSkyline::new(&store, options(), Box::new(outer)).unwrap();

        assert_eq!(op.produce_next().unwrap(), Some(row(1, 1)));
        assert_eq!(op.produce_next().unwrap(), None);

        let stats = op.stats();
        assert_eq!(stats.outer_pulled, 3);
        assert_eq!(stats.emitted, 1);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.inner_examined, 3 + 1 + 1);
        op.close().unwrap();
    }

    #[test]
    fn outer_schema_must_match() {
        let store = store_with(&[row(1, 1)]);
        let other = Schema::new(vec![Field::new("a", DataType::Int64)]);
        let outer = ValuesScan::new(other, vec![]);
        let err = NestedLoopSkyline::new(&store, options(), Box::new(outer))
            .err()
            .expect("schema mismatch");
        assert!(matches!(err, OpError::Config(_)));
    }

    #[test]
    fn preference_out_of_schema_is_rejected() {
        let store = store_with(&[row(1, 1)]);
        let outer = ValuesScan::new(schema(), vec![]);
        let opts = SkylineOptions::new(schema(), "base", PreferenceList::minimize(&[5]).unwrap());
        let err = NestedLoopSkyline::new(&store, opts, Box::new(outer))
            .err()
            .expect("bad preference");
        assert!(matches!(err, OpError::Schema(_)));
    }

    #[test]
    fn missing_base_relation_aborts_construction() {
        let store = store_with(&[]);
        let outer = ValuesScan::new(schema(), vec![]);
        let opts = SkylineOptions::new(schema(), "nope", PreferenceList::minimize(&[0]).unwrap());
        let err = NestedLoopSkyline::new(&store, opts, Box::new(outer))
            .err()
            .expect("missing base");
        assert!(matches!(
            err,
            OpError::Storage(skyline_heap::Error::RelationNotFound(_))
        ));
    }

    #[test]
    fn pruning_requires_a_scan_of_the_base() {
        let store = store_with(&[row(1, 1), row(2, 2)]);
        let foreign = ValuesScan::new(schema(), vec![row(0, 0), row(2, 2)]);
        let err = NestedLoopSkyline::new(&store, options().with_pruning(true), Box::new(foreign))
            .err()
            .expect("foreign outer with pruning");
        assert!(matches!(err, OpError::Config(_)));
        assert!(store.storage().list("mem").unwrap().iter().all(|p| !p.contains("skyline_scratch_")));

        let base_scan = FileScan::open(&store, "base", schema()).unwrap();
        let mut op =
            NestedLoopSkyline::new(&store, options().with_pruning(true), Box::new(base_scan)).unwrap();
        assert_eq!(op.produce_next().unwrap(), Some(row(1, 1)));
        assert_eq!(op.produce_next().unwrap(), None);
        op.close().unwrap();
    }

    #[test]
    fn default_scratch_names_are_unique() {
        let opts = options();
        assert_ne!(opts.scratch_relation(), opts.scratch_relation());
        assert!(opts.scratch_relation().starts_with("skyline_scratch_"));
        let named = opts.with_scratch_name("hf_copy");
        assert_eq!(named.scratch_relation(), "skyline_scratch_hf_copy");
        let prefixed = named.with_scratch_name("skyline_scratch_nls");
        assert_eq!(prefixed.scratch_relation(), "skyline_scratch_nls");
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let json = r#"{
            "schema": {"fields": [
                {"name": "a", "data_type": "Int32", "max_len": null},
                {"name": "b", "data_type": "Int32", "max_len": null}
            ]},
            "base_relation": "base",
            "preferences": [{"index": 0}, {"index": 1, "direction": "Maximize"}]
        }"#;
        let opts: SkylineOptions = serde_json::from_str(json).unwrap();
        assert_eq!(opts.buffer_pages, 1);
        assert!(!opts.prune_dominated);
        assert_eq!(opts.scratch_prefix, "skyline_scratch");
        assert_eq!(opts.preferences.len(), 2);
    }
}
