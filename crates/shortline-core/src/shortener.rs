use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::time::Instant;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    pub original_url: String,
    /// Latest point at which the mapping may still be queued for storage.
    pub deadline: Instant,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Creates a shortened URL and returns the generated short code.
    ///
    /// The mapping is queued for storage before this returns; it becomes
    /// visible to [`resolve`](Shortener::resolve) once a writer applies it.
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode>;

    /// Resolves a short code to its stored target URL.
    /// Returns `NotFound` if the code does not exist.
    async fn resolve(&self, code: &ShortCode) -> Result<String>;
}
