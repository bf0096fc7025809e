//! Logical shard -> routing token resolution
//!
//! Bulk writes for logical shard `i` must land on physical shard `i`. The
//! cluster only offers `resolve(index, routing) -> shard`, whose hash function
//! is not reproducible here, so each token is found by probing: try `"i"`,
//! `"i+1"`, `"i+2"`, ... until the cluster answers `i`.
//!
//! Results are cached per `(index, shard_count)` through an injected
//! [`RoutingCache`]. Two callers racing on the same key both probe and both
//! arrive at the same table, so the cache needs no cross-call locking.

mod cache;

pub use cache::{InMemoryRoutingCache, RoutingCache};

use std::sync::Arc;

use crate::config::BridgeConfig;
use crate::consts::DEFAULT_MAX_PROBES_PER_SHARD;
use crate::error::{Error, Result};

/// The cluster's deterministic routing primitive
pub trait ShardResolver: Send + Sync {
    /// Physical shard that `routing` maps to in `index`
    fn resolve(&self, index: &str, routing: &str) -> Result<u32>;
}

impl<R: ShardResolver + ?Sized> ShardResolver for Arc<R> {
    fn resolve(&self, index: &str, routing: &str) -> Result<u32> {
        (**self).resolve(index, routing)
    }
}

/// Routing token per logical shard; position `i` routes to physical shard `i`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    tokens: Arc<[String]>,
}

impl RoutingTable {
    pub fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens: tokens.into(),
        }
    }

    pub fn token(&self, shard: u32) -> Option<&str> {
        self.tokens.get(shard as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.tokens.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }
}

/// Resolves and caches routing tables
pub struct ShardRouter<R, C = InMemoryRoutingCache> {
    resolver: R,
    cache: Arc<C>,
    max_probes_per_shard: u64,
}

impl<R: ShardResolver, C: RoutingCache> ShardRouter<R, C> {
    pub fn new(resolver: R, cache: Arc<C>) -> Self {
        Self {
            resolver,
            cache,
            max_probes_per_shard: DEFAULT_MAX_PROBES_PER_SHARD,
        }
    }

    pub fn from_config(resolver: R, cache: Arc<C>, config: &BridgeConfig) -> Self {
        Self::new(resolver, cache).with_max_probes(config.max_probes_per_shard)
    }

    /// Bound on candidate tokens tried for a single logical shard
    pub fn with_max_probes(mut self, max_probes_per_shard: u64) -> Self {
        self.max_probes_per_shard = max_probes_per_shard.max(1);
        self
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// Routing table for `index` split into `shard_count` shards
    pub fn routing_table(&self, index: &str, shard_count: u32) -> Result<RoutingTable> {
        if let Some(table) = self.cache.get(index, shard_count) {
            log::trace!("Routing cache hit for {}/{}", index, shard_count);
            return Ok(table);
        }

        let mut tokens = Vec::with_capacity(shard_count as usize);
        let mut total_probes = 0u64;
        for shard in 0..shard_count {
            let (token, probes) = self.probe(index, shard)?;
            total_probes += probes;
            tokens.push(token);
        }

        log::debug!(
            "Computed routing table for {} with {} shards in {} probes",
            index,
            shard_count,
            total_probes
        );
        Ok(self
            .cache
            .insert(index, shard_count, RoutingTable::new(tokens)))
    }

    /// Token that routes to logical shard `shard`
    pub fn token_for(&self, index: &str, shard_count: u32, shard: u32) -> Result<String> {
        if shard >= shard_count {
            return Err(Error::Config(format!(
                "shard {} out of range for {} shards",
                shard, shard_count
            )));
        }
        let table = self.routing_table(index, shard_count)?;
        Ok(table.token(shard).unwrap_or_default().to_string())
    }

    fn probe(&self, index: &str, shard: u32) -> Result<(String, u64)> {
        let mut candidate = shard as u64;
        for attempt in 1..=self.max_probes_per_shard {
            let token = candidate.to_string();
            if self.resolver.resolve(index, &token)? == shard {
                return Ok((token, attempt));
            }
            candidate += 1;
        }

        log::error!(
            "Routing probe for shard {} of {} gave up after {} candidates; \
             the cluster routing function is not covering this shard",
            shard,
            index,
            self.max_probes_per_shard
        );
        Err(Error::RoutingProbeExhausted {
            index: index.to_string(),
            shard,
            probes: self.max_probes_per_shard,
        })
    }
}
