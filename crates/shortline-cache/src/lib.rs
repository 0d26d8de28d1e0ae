//! Probabilistic membership filters used to screen short codes.

pub mod bloom_filter;
pub mod error;

pub use bloom_filter::{BloomFilter, BloomFilterConfig, MAX_BIT_LEN};
pub use error::{CacheError, Result};
