//! Bridge configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_MAX_PROBES_PER_SHARD, DEFAULT_SCROLL_BATCH_SIZE, DEFAULT_SCROLL_KEEP_ALIVE_SECS,
    DEFAULT_XID_FIELD,
};
use crate::error::{Error, Result};

/// Runtime settings for the search and vacuum paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Documents per scroll batch when collecting vacuum candidates
    pub scroll_batch_size: usize,
    /// Cursor lease per batch fetch, in seconds
    pub scroll_keep_alive_secs: u64,
    /// Field read from each vacuum marker document
    pub xid_field: String,
    /// Routing probe bound per logical shard
    pub max_probes_per_shard: u64,
    /// Sort tuple responses into heap order before returning them
    pub sort_results: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            scroll_batch_size: DEFAULT_SCROLL_BATCH_SIZE,
            scroll_keep_alive_secs: DEFAULT_SCROLL_KEEP_ALIVE_SECS,
            xid_field: DEFAULT_XID_FIELD.to_string(),
            max_probes_per_shard: DEFAULT_MAX_PROBES_PER_SHARD,
            sort_results: true,
        }
    }
}

impl BridgeConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scroll_batch_size == 0 {
            return Err(Error::Config("scroll_batch_size must be positive".into()));
        }
        if self.scroll_keep_alive_secs == 0 {
            return Err(Error::Config(
                "scroll_keep_alive_secs must be positive".into(),
            ));
        }
        if self.max_probes_per_shard == 0 {
            return Err(Error::Config(
                "max_probes_per_shard must be positive".into(),
            ));
        }
        if self.xid_field.is_empty() {
            return Err(Error::Config("xid_field must not be empty".into()));
        }
        Ok(())
    }

    pub fn scroll_keep_alive(&self) -> Duration {
        Duration::from_secs(self.scroll_keep_alive_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.scroll_batch_size, 10_000);
        assert_eq!(config.scroll_keep_alive(), Duration::from_secs(300));
        assert!(config.sort_results);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = BridgeConfig::from_json(r#"{"scroll_batch_size": 500}"#).unwrap();
        assert_eq!(config.scroll_batch_size, 500);
        assert_eq!(config.max_probes_per_shard, DEFAULT_MAX_PROBES_PER_SHARD);
        assert_eq!(config.xid_field, "_xid");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            BridgeConfig::from_json(r#"{"scroll_batch_size": 0}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            BridgeConfig::from_json("not json"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            BridgeConfig::from_json(r#"{"xid_field": ""}"#),
            Err(Error::Config(_))
        ));
    }
}
