use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Answer cache tuning. The threshold and buffer size have no derivation
/// behind them; they are kept configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_recent_capacity")]
    pub recent_capacity: usize,
}

fn default_ttl_secs() -> u64 {
    600
}

fn default_similarity_threshold() -> f64 {
    0.9
}

fn default_recent_capacity() -> usize {
    50
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            similarity_threshold: default_similarity_threshold(),
            recent_capacity: default_recent_capacity(),
        }
    }
}
