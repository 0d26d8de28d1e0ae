//! Bloom filter for cheap "definitely absent" answers on short codes.
//!
//! A Bloom filter is a space-efficient probabilistic data structure that can
//! tell you with certainty if an item is NOT in a set, or that it MIGHT be
//! in the set (with a configurable false positive rate).
//!
//! # Sizing
//!
//! For `n` expected items and a target false positive rate `p`:
//!
//! - bit array length `m = ceil(-n * ln(p) / (ln 2)^2)`
//! - hash rounds `k = max(1, round(m / n * ln 2))`
//!
//! Both are fixed at construction. Inserting more than `n` items degrades the
//! false positive rate but never introduces false negatives.
//!
//! # Hashing
//!
//! Round `i` hashes the key bytes followed by the decimal digits of `i` with
//! XXH64 (seed 0), reduced modulo `m`.
//!
//! # Limitations
//!
//! Bloom filters do not support deletion, and this one is never resized or
//! persisted. It is advisory only; the repository remains the source of
//! truth.

use crate::error::{CacheError, Result};
use parking_lot::RwLock;
use std::f64::consts::LN_2;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;
use typed_builder::TypedBuilder;
use xxhash_rust::xxh64::xxh64;

const WORD_BITS: u64 = u64::BITS as u64;

/// Largest bit array a filter may allocate (4 GiB).
pub const MAX_BIT_LEN: u64 = 1 << 35;

/// Configuration for the Bloom filter.
///
/// The Bloom filter is a probabilistic data structure that trades a small
/// false positive rate for significant memory savings.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct BloomFilterConfig {
    /// Expected number of items to be inserted into the filter.
    ///
    /// Setting this too low will increase the false positive rate.
    #[builder(default = 1_000_000)]
    pub expected_items: usize,

    /// Desired false positive rate as a probability between 0.0 and 1.0.
    ///
    /// For example, a value of 0.01 means approximately 1% false positive rate.
    /// Lower values use more memory but reduce false positives.
    #[builder(default = 0.01)]
    pub false_positive_rate: f64,
}

/// A fixed-size, thread-safe Bloom filter.
///
/// Reads take a shared lock and writes an exclusive one, so concurrent
/// lookups never block each other.
pub struct BloomFilter {
    bit_len: u64,
    hash_rounds: u32,
    words: RwLock<Vec<u64>>,
    inserted: AtomicUsize,
}

impl BloomFilter {
    /// Creates an empty filter sized for `config`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Initialization` if the expected item count is
    /// zero, the false positive rate is not strictly between 0 and 1, or the
    /// bit array would be longer than [`MAX_BIT_LEN`].
    pub fn new(config: BloomFilterConfig) -> Result<Self> {
        if config.expected_items == 0 {
            return Err(CacheError::Initialization(
                "expected items must be greater than zero".to_string(),
            ));
        }
        let p = config.false_positive_rate;
        if !(p > 0.0 && p < 1.0) {
            return Err(CacheError::Initialization(format!(
                "false positive rate must be in (0, 1), got {p}"
            )));
        }

        let bit_len = optimal_bit_len(config.expected_items, p).ok_or_else(|| {
            CacheError::Initialization(format!(
                "{} items at false positive rate {p} need more than {MAX_BIT_LEN} bits",
                config.expected_items
            ))
        })?;
        let hash_rounds = optimal_hash_rounds(config.expected_items, bit_len);
        let word_len = bit_len.div_ceil(WORD_BITS) as usize;

        debug!(
            expected_items = config.expected_items,
            false_positive_rate = p,
            bit_len,
            hash_rounds,
            "bloom filter allocated"
        );

        Ok(Self {
            bit_len,
            hash_rounds,
            words: RwLock::new(vec![0; word_len]),
            inserted: AtomicUsize::new(0),
        })
    }

    /// Length of the bit array (`m`).
    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    /// Number of hash rounds per key (`k`).
    pub fn hash_rounds(&self) -> u32 {
        self.hash_rounds
    }

    /// Number of `add` calls so far, duplicates included.
    pub fn len(&self) -> usize {
        self.inserted.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records `key` as present.
    pub fn add(&self, key: impl AsRef<[u8]>) {
        // Hash before locking so the exclusive section only flips bits.
        let positions = self.positions(key.as_ref());
        {
            let mut words = self.words.write();
            for position in positions {
                let (word, mask) = locate(position);
                words[word] |= mask;
            }
        }
        self.inserted.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns `false` if `key` was definitely never added, `true` if it
    /// might have been.
    pub fn might_contain(&self, key: impl AsRef<[u8]>) -> bool {
        let key = key.as_ref();
        let mut buf = Vec::with_capacity(key.len() + 10);
        let words = self.words.read();
        (0..self.hash_rounds).all(|round| {
            let (word, mask) = locate(self.position(key, round, &mut buf));
            words[word] & mask != 0
        })
    }

    fn positions(&self, key: &[u8]) -> Vec<u64> {
        let mut buf = Vec::with_capacity(key.len() + 10);
        (0..self.hash_rounds)
            .map(|round| self.position(key, round, &mut buf))
            .collect()
    }

    fn position(&self, key: &[u8], round: u32, buf: &mut Vec<u8>) -> u64 {
        buf.clear();
        buf.extend_from_slice(key);
        push_decimal(buf, round);
        xxh64(buf, 0) % self.bit_len
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("bit_len", &self.bit_len)
            .field("hash_rounds", &self.hash_rounds)
            .field("inserted", &self.len())
            .finish()
    }
}

/// `m = ceil(-n * ln(p) / (ln 2)^2)`
///
/// `None` if `m` exceeds [`MAX_BIT_LEN`].
fn optimal_bit_len(expected_items: usize, false_positive_rate: f64) -> Option<u64> {
    let n = expected_items as f64;
    let m = (-n * false_positive_rate.ln() / (LN_2 * LN_2)).ceil();
    if !m.is_finite() || m > MAX_BIT_LEN as f64 {
        return None;
    }
    Some((m as u64).max(1))
}

/// `k = max(1, round(m / n * ln 2))`
fn optimal_hash_rounds(expected_items: usize, bit_len: u64) -> u32 {
    let k = (bit_len as f64 / expected_items as f64 * LN_2).round();
    (k as u32).max(1)
}

fn locate(position: u64) -> (usize, u64) {
    ((position / WORD_BITS) as usize, 1 << (position % WORD_BITS))
}

fn push_decimal(buf: &mut Vec<u8>, mut value: u32) {
    let start = buf.len();
    loop {
        buf.push(b'0' + (value % 10) as u8);
        value /= 10;
        if value == 0 {
            break;
        }
    }
    buf[start..].reverse();
}
