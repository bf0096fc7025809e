//! Tuning constants
//!
//! Defaults for [`BridgeConfig`](crate::config::BridgeConfig) and the limits
//! the collectors fall back to.

/// Documents fetched per scroll round trip on the vacuum path.
pub const DEFAULT_SCROLL_BATCH_SIZE: usize = 10_000;

/// Lease on the server-side cursor for each batch fetch. A cursor that is
/// never cleared expires after this long.
pub const DEFAULT_SCROLL_KEEP_ALIVE_SECS: u64 = 300;

/// Candidate tokens tried per logical shard before routing gives up.
/// Any sane hash routes one of the first few dozen candidates to each shard;
/// hitting this bound means the cluster's routing function never covers it.
pub const DEFAULT_MAX_PROBES_PER_SHARD: u64 = 100_000;

/// Field holding the transaction id on vacuum marker documents.
pub const DEFAULT_XID_FIELD: &str = "_xid";
