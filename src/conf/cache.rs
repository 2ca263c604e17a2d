use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of tables whose metadata is kept.
    #[serde(default = "CacheConfig::default_capacity")]
    pub capacity: u64,
}

impl CacheConfig {
    fn default_capacity() -> u64 {
        32
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: Self::default_capacity(),
        }
    }
}
