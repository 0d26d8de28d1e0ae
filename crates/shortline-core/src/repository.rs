use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, StorageError>;

/// The authoritative mapping from short code to target URL.
///
/// Implementations must allow many concurrent readers and must never expose
/// a partially written entry. Entries live until the process exits.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Stores `target` under `code`, replacing any previous target.
    ///
    /// Storing the same pair twice is a no-op.
    async fn store(&self, code: &ShortCode, target: &str) -> Result<()>;

    /// Retrieves the target for a given short code.
    /// Returns `None` if the code does not exist.
    async fn get(&self, code: &ShortCode) -> Result<Option<String>>;

    /// Checks whether a short code already exists in the repository.
    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.get(code).await?.is_some())
    }

    /// Number of stored entries.
    async fn len(&self) -> Result<usize>;
}
