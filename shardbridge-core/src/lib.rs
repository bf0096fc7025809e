//! Shardbridge - binary plumbing between a row store and a sharded search cluster
//!
//! This library provides:
//! - Packed `(blockno, offno, score)` tuple buffers and an in-place quicksort
//!   that orders them by physical row location
//! - A sparse bitmap over 64-bit integers and the xid-set wire format
//! - A compact, serializable set of string identifiers
//! - A lazy k-way merge over per-shard sorted term lists
//! - Cached resolution of logical shards to routing tokens
//! - Vacuum candidate collection over a scroll cursor
//!
//! Cluster access (routing resolution, scrolling) is injected through the
//! [`ShardResolver`] and [`ScrollSource`] traits; nothing here does network IO.

pub mod config;
pub mod consts;
pub mod error;
pub mod merge;
pub mod routing;
pub mod search;
pub mod structures;
pub mod vacuum;

pub use config::BridgeConfig;
pub use error::{Error, Result};
pub use merge::{KWayMerge, merge_sorted};
pub use routing::{InMemoryRoutingCache, RoutingCache, RoutingTable, ShardResolver, ShardRouter};
pub use search::TupleResponseBuilder;
pub use structures::{
    CompactIdentifierSet, ItemPointer, LocationTuple, SparseLongBitmap, TupleBuffer, TupleWriter,
    decode_tuples, decode_xid_set, encode_tuples, encode_xid_set,
};
pub use vacuum::{
    CollectedXids, ScrollBatch, ScrollCursor, ScrollHit, ScrollQuery, ScrollSource, ScrollStart,
    VacuumCollector,
};

/// Transaction id as stored on marker documents
pub type Xid = u64;
/// Relevance score carried in tuple buffers
pub type Score = f32;
