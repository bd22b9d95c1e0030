#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tailor_common::error::StoreError;
use tailor_engine::store::{KeyedStore, MemoryStore};
use tokio::sync::Barrier;

/// Store whose operations can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyedStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("read rejected".into()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write rejected".into()));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write rejected".into()));
        }
        self.inner.remove(key).await
    }
}

/// Store that holds its first `parties` reads until all of them are in
/// flight, forcing concurrent read-modify-write cycles to observe the same
/// value. Later reads pass straight through.
pub struct LockstepStore {
    inner: MemoryStore,
    barrier: Barrier,
    gated_reads: AtomicUsize,
}

impl LockstepStore {
    pub fn new(parties: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            barrier: Barrier::new(parties),
            gated_reads: AtomicUsize::new(parties),
        })
    }
}

#[async_trait]
impl KeyedStore for LockstepStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let value = self.inner.get(key).await?;
        let gated = self
            .gated_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if gated {
            self.barrier.wait().await;
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key).await
    }
}
