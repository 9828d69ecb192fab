//! Time-windowed Bloom filter with two rotating generations.
//!
//! This crate provides an approximate "have I seen this element recently?"
//! test. Elements expire on their own after one to two rotation periods.
//!
//! HowTo:
//!    * Generations: a [`Rotator`] holds a pair of Bloom filters, `current`
//!      and `next`, each with its own bit storage.
//!    * Rotation: every period `next` becomes `current` and a fresh, empty
//!      filter becomes `next`. The old `current` is dropped.
//!
//! Insertion:
//!     * The element is added to both `current` and `next` of the same pair
//!       snapshot, so it survives the next rotation.
//! Query:
//!     * Only `current` is consulted.
//! Expiration:
//!     * An element that is not re-added disappears after two rotations.
//!
//! Concurrency:
//!     * The active pair is published through an atomic pointer swap; adds
//!       and lookups never wait on rotation and rotation never waits on them.
//!     * The two writes of an add are not atomic together. A failed add may
//!       leave the element in one generation only.
//!
//! Storage backends implement [`BitStorage`]: [`InMemoryStorage`] is always
//! available, `RedisStorage` comes with the `redis` feature.

#[cfg(feature = "server")]
pub mod api;
mod bloom;
mod config;
mod error;
mod factory;
mod hash;
#[cfg(feature = "redis")]
mod redis_storage;
mod rotator;
mod storage;
#[cfg(feature = "server")]
pub mod types;

pub use bloom::BloomFilter;
pub use config::{
    BloomConfig, BloomConfigBuilder, BloomConfigBuilderError, BloomParams,
    RotatorConfig, RotatorConfigBuilder, RotatorConfigBuilderError,
};
pub use error::{FilterError, Result};
#[cfg(feature = "redis")]
pub use factory::RedisFilterFactory;
pub use factory::InMemoryFilterFactory;
pub use hash::{
    HashFunction, default_hash_function, optimal_bit_vector_size,
    optimal_num_hashes,
};
#[cfg(feature = "redis")]
pub use redis_storage::RedisStorage;
pub use rotator::{FilterFactory, FilterPair, Rotator};
pub use storage::{BitStorage, InMemoryStorage};
pub use tokio_util::sync::CancellationToken;
#[cfg(feature = "server")]
pub use types::{
    AppState, ServerConfig, ServerConfigBuilder, ServerConfigBuilderError,
};
