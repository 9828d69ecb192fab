use crate::error::{FilterError, Result};
use crate::hash::{
    HashFunction, default_hash_function, optimal_bit_vector_size,
    optimal_num_hashes,
};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sizing of a single filter generation.
#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned")]
pub struct BloomConfig {
    /// Expected number of elements added during one generation's lifetime
    #[builder(default = "1_000_000")]
    pub capacity: usize,

    /// Desired false positive rate (between 0 and 1)
    #[builder(default = "0.01")]
    pub false_positive_rate: f64,

    /// Hash function used to locate bits
    #[builder(default = "default_hash_function")]
    pub hash_function: HashFunction,
}

impl BloomConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(FilterError::InvalidConfig(
                "Capacity must be > 0".into(),
            ));
        }
        if self.false_positive_rate <= 0.0 || self.false_positive_rate >= 1.0 {
            return Err(FilterError::InvalidConfig(
                "FPR must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}

/// Derived parameters calculated from BloomConfig
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BloomParams {
    /// `m`
    pub bit_vector_size: usize,
    /// `k`
    pub num_hashes: usize,
}

impl From<&BloomConfig> for BloomParams {
    fn from(config: &BloomConfig) -> Self {
        let bit_vector_size =
            optimal_bit_vector_size(config.capacity, config.false_positive_rate);
        let num_hashes = optimal_num_hashes(config.capacity, bit_vector_size);

        Self {
            bit_vector_size,
            num_hashes,
        }
    }
}

/// Rotation settings consumed by [`crate::Rotator`].
#[derive(Clone, Debug, Builder, Serialize, Deserialize)]
#[builder(pattern = "owned")]
pub struct RotatorConfig {
    /// Whether the background rotation task runs at all
    #[builder(default = "true")]
    pub enabled: bool,

    /// Rotation cadence
    #[builder(default = "Duration::from_secs(60)")]
    pub period: Duration,
}

impl RotatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.period.is_zero() {
            return Err(FilterError::InvalidConfig(
                "Rotation period must be > 0 when rotation is enabled".into(),
            ));
        }
        Ok(())
    }

    /// Expiry for backend state that outlives the process (Redis keys).
    ///
    /// A generation is created up to one period before it is promoted and is
    /// displaced one period after that, plus the time to build its
    /// replacement, so three periods always outlast it. `None` when nothing
    /// rotates: manually rotated generations must never expire on their own.
    pub fn generation_ttl(&self) -> Option<Duration> {
        (self.enabled && !self.period.is_zero()).then(|| self.period * 3)
    }
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period: Duration::from_secs(60),
        }
    }
}
