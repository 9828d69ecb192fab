//! Standard Bloom filter over a pluggable [`BitStorage`].
use crate::config::{BloomConfig, BloomParams};
use crate::error::{FilterError, Result};
use crate::hash::{HashFunction, default_hash_function};
use crate::storage::BitStorage;

pub struct BloomFilter {
    storage: Box<dyn BitStorage>,
    bit_vector_size: usize,
    num_hashes: usize,
    hash_function: HashFunction,
}

impl BloomFilter {
    /// Creates a filter of `bit_vector_size` bits (`m`) probed by
    /// `num_hashes` locations (`k`) per element.
    pub fn new(
        storage: impl BitStorage + 'static,
        bit_vector_size: usize,
        num_hashes: usize,
    ) -> Result<Self> {
        Self::with_hash_function(
            storage,
            bit_vector_size,
            num_hashes,
            default_hash_function,
        )
    }

    pub fn with_hash_function(
        storage: impl BitStorage + 'static,
        bit_vector_size: usize,
        num_hashes: usize,
        hash_function: HashFunction,
    ) -> Result<Self> {
        if bit_vector_size == 0 {
            return Err(FilterError::InvalidConfig(
                "Bit vector size must be > 0".into(),
            ));
        }
        // locations are u32
        if bit_vector_size > u32::MAX as usize {
            return Err(FilterError::InvalidConfig(format!(
                "Bit vector size must be <= {}",
                u32::MAX
            )));
        }
        if num_hashes == 0 {
            return Err(FilterError::InvalidConfig(
                "Number of hashes must be > 0".into(),
            ));
        }

        Ok(Self {
            storage: Box::new(storage),
            bit_vector_size,
            num_hashes,
            hash_function,
        })
    }

    /// Creates a filter sized for `config.capacity` elements at
    /// `config.false_positive_rate`.
    pub fn from_config(
        storage: impl BitStorage + 'static,
        config: &BloomConfig,
    ) -> Result<Self> {
        config.validate()?;
        let params = BloomParams::from(config);
        Self::with_hash_function(
            storage,
            params.bit_vector_size,
            params.num_hashes,
            config.hash_function,
        )
    }

    pub fn add(&self, item: impl AsRef<[u8]>) -> Result<()> {
        let indices = self.locations(item.as_ref());
        self.storage.set_bits(&indices)
    }

    pub fn exist(&self, item: impl AsRef<[u8]>) -> Result<bool> {
        let indices = self.locations(item.as_ref());
        self.storage.check_bits(&indices)
    }

    /// Forwards an expiry to the underlying storage.
    pub fn set_expire_ttl(&self, ttl: std::time::Duration) -> Result<()> {
        self.storage.set_expire_ttl(ttl)
    }

    pub fn bit_vector_size(&self) -> usize {
        self.bit_vector_size
    }

    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    fn locations(&self, item: &[u8]) -> Vec<usize> {
        (self.hash_function)(item, self.num_hashes, self.bit_vector_size)
            .into_iter()
            .map(|h| h as usize % self.bit_vector_size)
            .collect()
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BloomFilter {{ bit_vector_size: {}, num_hashes: {} }}",
            self.bit_vector_size, self.num_hashes
        )
    }
}
