//! Merging of per-shard sorted streams

mod kway;

pub use kway::{KWayMerge, merge_sorted};
