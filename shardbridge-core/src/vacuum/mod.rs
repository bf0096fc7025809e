//! Vacuum candidate collection
//!
//! Every aborted or in-flight transaction leaves a marker document carrying
//! its xid. Vacuum needs the full distinct set, which can run to hundreds of
//! thousands of values, so the collector scrolls the marker category batch by
//! batch into a [`SparseLongBitmap`] until it has visited as many documents as
//! the opening query reported.
//!
//! The cursor is always released once collection ends, whether it succeeded
//! or not. Scroll failures propagate unchanged; retry policy belongs to the
//! caller.

mod scroll;

pub use scroll::{ScrollBatch, ScrollCursor, ScrollHit, ScrollQuery, ScrollSource, ScrollStart};

use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::structures::{SparseLongBitmap, encode_bitmap_xids};

/// Distinct xids gathered from one collection run
#[derive(Debug, Clone, Default)]
pub struct CollectedXids {
    pub xids: SparseLongBitmap,
    /// Documents visited across all batches
    pub visited: u64,
    /// Total reported by the opening query
    pub total_hits: u64,
    /// Non-empty batches consumed
    pub batches: usize,
}

impl CollectedXids {
    /// Number of distinct xids
    pub fn len(&self) -> usize {
        self.xids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xids.is_empty()
    }

    /// False when the cursor ran dry before `total_hits` documents were seen
    pub fn is_complete(&self) -> bool {
        self.visited >= self.total_hits
    }

    /// Xid-set wire bytes
    pub fn encode(&self) -> Vec<u8> {
        encode_bitmap_xids(&self.xids)
    }

    fn absorb(&mut self, field: &str, hits: Vec<ScrollHit>) -> Result<()> {
        let count = hits.len();
        for hit in hits {
            let xid = hit.value.ok_or_else(|| Error::MissingField {
                doc_id: hit.doc_id,
                field: field.to_string(),
            })?;
            self.xids.insert(xid as i64);
        }
        self.visited += count as u64;
        self.batches += 1;
        log::debug!(
            "Vacuum batch {}: {} docs, {}/{} visited, {} distinct xids",
            self.batches,
            count,
            self.visited,
            self.total_hits,
            self.xids.len()
        );
        Ok(())
    }
}

/// Scrolls marker documents into a distinct xid set
pub struct VacuumCollector<S> {
    source: S,
    config: BridgeConfig,
}

impl<S: ScrollSource> VacuumCollector<S> {
    pub fn new(source: S, config: BridgeConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    fn query(&self, index: &str, category: &str) -> ScrollQuery {
        ScrollQuery {
            index: index.to_string(),
            category: category.to_string(),
            field: self.config.xid_field.clone(),
            batch_size: self.config.scroll_batch_size,
            keep_alive: self.config.scroll_keep_alive(),
        }
    }

    /// Visit every document of `category` in `index` and collect its xid
    pub async fn collect(&self, index: &str, category: &str) -> Result<CollectedXids> {
        let query = self.query(index, category);
        let start = self.source.open_scroll(&query).await?;
        let mut cursor = start.batch.cursor.clone();

        let result = self.drain(&query, start, &mut cursor).await;

        if let Some(cursor) = cursor
            && let Err(e) = self.source.clear_scroll(&cursor).await
        {
            log::warn!("Failed to release scroll cursor for {}: {}", index, e);
        }

        let collected = result?;
        log::info!(
            "Collected {} distinct xids from {} {} documents in {} batches",
            collected.len(),
            collected.visited,
            category,
            collected.batches
        );
        Ok(collected)
    }

    /// [`collect`](Self::collect) and encode as an xid-set response
    pub async fn collect_encoded(&self, index: &str, category: &str) -> Result<Vec<u8>> {
        Ok(self.collect(index, category).await?.encode())
    }

    async fn drain(
        &self,
        query: &ScrollQuery,
        start: ScrollStart,
        cursor: &mut Option<ScrollCursor>,
    ) -> Result<CollectedXids> {
        let mut collected = CollectedXids {
            total_hits: start.total_hits,
            ..Default::default()
        };
        if !start.batch.hits.is_empty() {
            collected.absorb(&query.field, start.batch.hits)?;
        }

        while collected.visited < collected.total_hits {
            let Some(current) = cursor.as_ref() else {
                log::warn!(
                    "Scroll over {} ended after {} of {} documents",
                    query.index,
                    collected.visited,
                    collected.total_hits
                );
                break;
            };

            let batch = self.source.next_batch(current, query.keep_alive).await?;
            *cursor = batch.cursor;
            if batch.hits.is_empty() {
                log::warn!(
                    "Scroll over {} returned an empty batch after {} of {} documents",
                    query.index,
                    collected.visited,
                    collected.total_hits
                );
                break;
            }
            collected.absorb(&query.field, batch.hits)?;
        }

        Ok(collected)
    }
}
