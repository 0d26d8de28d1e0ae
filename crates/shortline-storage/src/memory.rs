use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shortline_core::repository::{Repository, Result};
use shortline_core::ShortCode;
use tracing::warn;

/// In-memory implementation of the Repository trait using DashMap.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// buckets without blocking. Each entry is replaced as a whole under its
/// shard's write lock, so readers never see a half-written value.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    storage: DashMap<ShortCode, String>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: DashMap::with_capacity(capacity),
        }
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn store(&self, code: &ShortCode, target: &str) -> Result<()> {
        match self.storage.entry(code.clone()) {
            Entry::Occupied(mut entry) => {
                if entry.get() != target {
                    warn!(
                        code = %code,
                        previous = %entry.get(),
                        replacement = %target,
                        "overwriting existing short code"
                    );
                    entry.insert(target.to_owned());
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(target.to_owned());
            }
        }
        Ok(())
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<String>> {
        Ok(self.storage.get(code).map(|entry| entry.value().clone()))
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.storage.contains_key(code))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.storage.len())
    }
}
