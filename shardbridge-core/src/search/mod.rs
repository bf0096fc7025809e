//! Search-path response building
//!
//! Hits come back from the search executor as `"<blockno>-<offno>"` document
//! ids with an optional score. They are packed into a tuple buffer and sorted
//! into heap order so the row store can fetch rows sequentially.

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::structures::{ItemPointer, LocationTuple, TupleBuffer, TupleWriter};

/// Accumulates search hits into a tuple response
pub struct TupleResponseBuilder {
    writer: TupleWriter,
    sort: bool,
}

impl TupleResponseBuilder {
    pub fn new(has_scores: bool, sort: bool) -> Self {
        Self::with_capacity(has_scores, sort, 0)
    }

    /// `expected_hits` is usually the total reported by the search
    pub fn with_capacity(has_scores: bool, sort: bool, expected_hits: usize) -> Self {
        Self {
            writer: TupleWriter::with_capacity(has_scores, expected_hits),
            sort,
        }
    }

    pub fn from_config(config: &BridgeConfig, has_scores: bool, expected_hits: usize) -> Self {
        Self::with_capacity(has_scores, config.sort_results, expected_hits)
    }

    /// Add a hit by its document id
    pub fn push_hit(&mut self, doc_id: &str, score: Option<f32>) -> Result<()> {
        let pointer = ItemPointer::parse(doc_id)?;
        self.push(pointer, score)
    }

    pub fn push(&mut self, pointer: ItemPointer, score: Option<f32>) -> Result<()> {
        self.writer.push(LocationTuple::new(pointer, score))
    }

    pub fn len(&self) -> usize {
        self.writer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writer.is_empty()
    }

    /// Finished buffer, sorted if requested
    pub fn build(self) -> TupleBuffer {
        let mut buffer = self.writer.finish();
        if self.sort {
            buffer.sort();
        }
        buffer
    }

    /// Wire bytes for the response
    pub fn finish(self) -> Vec<u8> {
        self.build().into_bytes()
    }
}
