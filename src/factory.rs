//! Ready-made [`FilterFactory`] implementations.
use crate::bloom::BloomFilter;
use crate::config::{BloomConfig, BloomParams};
use crate::error::Result;
use crate::hash::{HashFunction, default_hash_function};
use crate::rotator::FilterFactory;
use crate::storage::InMemoryStorage;

/// Builds filters backed by [`InMemoryStorage`].
#[derive(Debug, Clone)]
pub struct InMemoryFilterFactory {
    params: BloomParams,
    hash_function: HashFunction,
}

impl InMemoryFilterFactory {
    /// Sizes every generation from `config`.
    pub fn new(config: &BloomConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            params: BloomParams::from(config),
            hash_function: config.hash_function,
        })
    }

    /// Uses `m` and `k` as given.
    pub fn with_params(bit_vector_size: usize, num_hashes: usize) -> Self {
        Self {
            params: BloomParams {
                bit_vector_size,
                num_hashes,
            },
            hash_function: default_hash_function,
        }
    }

    pub fn params(&self) -> BloomParams {
        self.params
    }
}

impl FilterFactory for InMemoryFilterFactory {
    fn create(&self) -> Result<BloomFilter> {
        BloomFilter::with_hash_function(
            InMemoryStorage::new(self.params.bit_vector_size)?,
            self.params.bit_vector_size,
            self.params.num_hashes,
            self.hash_function,
        )
    }
}

#[cfg(feature = "redis")]
pub use self::redis_factory::RedisFilterFactory;

#[cfg(feature = "redis")]
mod redis_factory {
    use super::*;
    use crate::redis_storage::RedisStorage;
    use crate::storage::BitStorage;
    use std::time::Duration;

    /// Builds filters backed by [`RedisStorage`], one bitmap per generation.
    ///
    /// With a TTL set, each fresh bitmap gets an expiry so that generations
    /// dropped by rotation are eventually removed server-side.
    #[derive(Debug, Clone)]
    pub struct RedisFilterFactory {
        client: redis::Client,
        key_prefix: String,
        params: BloomParams,
        ttl: Option<Duration>,
    }

    impl RedisFilterFactory {
        pub fn new(
            client: redis::Client,
            key_prefix: impl Into<String>,
            params: BloomParams,
        ) -> Self {
            Self {
                client,
                key_prefix: key_prefix.into(),
                params,
                ttl: None,
            }
        }

        pub fn with_ttl(mut self, ttl: Duration) -> Self {
            self.ttl = Some(ttl);
            self
        }
    }

    impl FilterFactory for RedisFilterFactory {
        fn create(&self) -> Result<BloomFilter> {
            let storage = RedisStorage::new(
                &self.client,
                &self.key_prefix,
                self.params.bit_vector_size,
            )?;
            if let Some(ttl) = self.ttl {
                storage.set_expire_ttl(ttl)?;
            }
            BloomFilter::new(
                storage,
                self.params.bit_vector_size,
                self.params.num_hashes,
            )
        }
    }

}
