//! Cursor-based scrolling over the search cluster

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// What to scroll over and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollQuery {
    pub index: String,
    /// Marker category (document type) holding the candidates
    pub category: String,
    /// Integer field extracted from every document
    pub field: String,
    pub batch_size: usize,
    /// Lease on the cursor for each fetch
    pub keep_alive: Duration,
}

/// Opaque server-side cursor handle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScrollCursor(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollHit {
    pub doc_id: String,
    /// Value of [`ScrollQuery::field`], if the document has one
    pub value: Option<u64>,
}

/// One page of results and the cursor for the next page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollBatch {
    pub hits: Vec<ScrollHit>,
    /// `None` once the cluster reports the cursor exhausted
    pub cursor: Option<ScrollCursor>,
}

/// First page plus the total hit count reported by the opening query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollStart {
    pub batch: ScrollBatch,
    pub total_hits: u64,
}

/// The cluster's scroll API
#[async_trait]
pub trait ScrollSource: Send + Sync {
    async fn open_scroll(&self, query: &ScrollQuery) -> Result<ScrollStart>;

    /// Fetch the next page. The returned cursor replaces `cursor`.
    async fn next_batch(&self, cursor: &ScrollCursor, keep_alive: Duration)
    -> Result<ScrollBatch>;

    /// Release server-side cursor state
    async fn clear_scroll(&self, cursor: &ScrollCursor) -> Result<()>;
}
