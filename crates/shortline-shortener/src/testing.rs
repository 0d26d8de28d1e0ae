//! Test doubles shared by the pipeline and service tests.

use crate::pipeline::Task;
use async_trait::async_trait;
use parking_lot::Mutex;
use shortline_cache::{BloomFilter, BloomFilterConfig};
use shortline_core::repository::Result;
use shortline_core::{Repository, ShortCode, StorageError};
use shortline_generator::{Generator, GeneratorError};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub(crate) fn filter() -> Arc<BloomFilter> {
    Arc::new(
        BloomFilter::new(
            BloomFilterConfig::builder()
                .expected_items(1_000)
                .false_positive_rate(0.01)
                .build(),
        )
        .unwrap(),
    )
}

pub(crate) fn task(id: u64, target: &str) -> Task {
    Task {
        code: ShortCode::generated(id),
        target: target.to_string(),
    }
}

/// A repository whose writes block until [`open`](GatedRepository::open) is
/// called, and which counts writes per code.
pub(crate) struct GatedRepository {
    gate: Semaphore,
    entered: AtomicUsize,
    fail: bool,
    entries: Mutex<HashMap<ShortCode, String>>,
    calls: Mutex<HashMap<ShortCode, usize>>,
}

impl GatedRepository {
    pub(crate) fn new() -> Self {
        Self {
            gate: Semaphore::new(0),
            entered: AtomicUsize::new(0),
            fail: false,
            entries: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// An open gate whose writes always fail.
    pub(crate) fn failing() -> Self {
        let repo = Self {
            fail: true,
            ..Self::new()
        };
        repo.open();
        repo
    }

    pub(crate) fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 4);
    }

    /// Number of writes that have started, blocked or not.
    pub(crate) fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        self.entries.lock().contains_key(&ShortCode::generated(id))
    }

    pub(crate) fn store_calls(&self, id: u64) -> usize {
        self.calls
            .lock()
            .get(&ShortCode::generated(id))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Repository for GatedRepository {
    async fn store(&self, code: &ShortCode, target: &str) -> Result<()> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        *self.calls.lock().entry(code.clone()).or_default() += 1;
        if self.fail {
            return Err(StorageError::Unavailable("gated repository".to_string()));
        }
        self.entries.lock().insert(code.clone(), target.to_string());
        Ok(())
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<String>> {
        Ok(self.entries.lock().get(code).cloned())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.lock().len())
    }
}

/// Replays a fixed list of ids, then repeats the last one.
pub(crate) struct ScriptedGenerator {
    ids: Mutex<VecDeque<u64>>,
    last: u64,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub(crate) fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        let ids: VecDeque<u64> = ids.into_iter().collect();
        let last = ids.back().copied().unwrap_or_default();
        Self {
            ids: Mutex::new(ids),
            last,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Generator for ScriptedGenerator {
    type Output = ShortCode;

    fn generate(&self) -> std::result::Result<ShortCode, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let id = self.ids.lock().pop_front().unwrap_or(self.last);
        Ok(ShortCode::generated(id))
    }
}
