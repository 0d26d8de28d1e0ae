use thiserror::Error;

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CacheError {
    #[error("cache initialization failed: {0}")]
    Initialization(String),
}
