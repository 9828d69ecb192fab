use fnv::FnvHasher;
use murmur3::murmur3_32;
use std::hash::Hasher;
use std::io::Cursor;

/// A type alias for the hash function used to locate bits in the filter.
///
/// **Parameters:**
///
/// - `item: &[u8]`
///   - A byte slice representing the item to be hashed.
/// - `num_hashes: usize`
///   - The number of bit locations to derive (`k`).
/// - `capacity: usize`
///   - The size of the bit vector (`m`). Every returned location must be
///     inside `[0, capacity)`.
///
/// **Returns:**
///
/// - `Vec<u32>`
///   - `num_hashes` bit locations. The same input always yields the same
///     locations for a given `(num_hashes, capacity)` pair.
pub type HashFunction = fn(&[u8], usize, usize) -> Vec<u32>;

pub(crate) fn hash_murmur32(key: &[u8]) -> u32 {
    let mut cursor = Cursor::new(key);
    // Reading from an in-memory cursor cannot fail.
    murmur3_32(&mut cursor, 0).unwrap_or_default()
}

pub(crate) fn hash_fnv32(key: &[u8]) -> u32 {
    let mut hasher = FnvHasher::default();
    hasher.write(key);
    hasher.finish() as u32
}

/// Double hashing: `h1 + i * h2 (mod capacity)` for `i in 0..num_hashes`.
///
/// Returns no locations for a zero `capacity`. Capacities above `u32::MAX`
/// are not truncated; locations then cover only the first 2^32 bits.
pub fn default_hash_function(
    item: &[u8],
    num_hashes: usize,
    capacity: usize,
) -> Vec<u32> {
    if capacity == 0 {
        return Vec::new();
    }
    let m = capacity as u64;
    let h1 = hash_murmur32(item);
    let h2 = hash_fnv32(item);
    (0..num_hashes)
        .map(|i| {
            let h = h1.wrapping_add((i as u32).wrapping_mul(h2));
            // h < 2^32, so the remainder fits back into u32
            (h as u64 % m) as u32
        })
        .collect()
}

pub fn optimal_bit_vector_size(n: usize, fpr: f64) -> usize {
    let ln2 = std::f64::consts::LN_2;
    ((-(n as f64) * fpr.ln()) / (ln2 * ln2)).ceil() as usize
}

pub fn optimal_num_hashes(n: usize, m: usize) -> usize {
    (((m as f64 / n as f64) * std::f64::consts::LN_2).round() as usize).max(1)
}
