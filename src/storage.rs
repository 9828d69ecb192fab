use crate::error::{FilterError, Result};
use bitvec::{bitvec, order::Lsb0, vec::BitVec};
use std::sync::RwLock;
use std::time::Duration;
use tracing::trace;

/// Bit array backing a single bloom filter generation.
///
/// Implementations use interior mutability: a filter generation is shared
/// between concurrent writers through `&self`.
pub trait BitStorage: Send + Sync {
    /// Sets every listed bit to 1. Setting an already set bit is a no-op.
    fn set_bits(&self, indices: &[usize]) -> Result<()>;
    /// Returns true iff all listed bits are set.
    fn check_bits(&self, indices: &[usize]) -> Result<bool>;
    /// Sets or refreshes an expiry on the whole structure.
    ///
    /// Backends without expiry support keep the default no-op.
    fn set_expire_ttl(&self, _ttl: Duration) -> Result<()> {
        Ok(())
    }
}

// In-memory storage implementation
pub struct InMemoryStorage {
    bits: RwLock<BitVec<usize, Lsb0>>,
    capacity: usize,
}

impl InMemoryStorage {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(FilterError::InvalidConfig(
                "Bit storage capacity must be > 0".into(),
            ));
        }
        Ok(Self {
            bits: RwLock::new(bitvec![usize, Lsb0; 0; capacity]),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bits currently set.
    pub fn count_ones(&self) -> Result<usize> {
        let bits = self
            .bits
            .read()
            .map_err(|e| FilterError::LockError(e.to_string()))?;
        Ok(bits.count_ones())
    }

    fn check_bounds(&self, indices: &[usize]) -> Result<()> {
        if let Some(&max_index) = indices.iter().max() {
            if max_index >= self.capacity {
                return Err(FilterError::IndexOutOfBounds {
                    index: max_index,
                    capacity: self.capacity,
                });
            }
        }
        Ok(())
    }
}

impl BitStorage for InMemoryStorage {
    fn set_bits(&self, indices: &[usize]) -> Result<()> {
        // Check all indices first
        self.check_bounds(indices)?;

        let mut bits = self
            .bits
            .write()
            .map_err(|e| FilterError::LockError(e.to_string()))?;
        for &index in indices {
            bits.set(index, true);
        }
        Ok(())
    }

    fn check_bits(&self, indices: &[usize]) -> Result<bool> {
        self.check_bounds(indices)?;

        let bits = self
            .bits
            .read()
            .map_err(|e| FilterError::LockError(e.to_string()))?;
        Ok(indices.iter().all(|&index| bits[index]))
    }

    fn set_expire_ttl(&self, ttl: Duration) -> Result<()> {
        trace!(?ttl, "in-memory storage ignores expiry");
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InMemoryStorage {{ capacity: {} }}", self.capacity)
    }
}
