use crate::store::{KeyedStore, read_json, write_json};
use std::sync::Arc;
use tailor_common::error::StoreError;
use tailor_common::protocol::USED_CREDITS_KEY;
use tokio::sync::Mutex;
use tracing::debug;

/// Single entry point for the shared usage counter.
///
/// Increments through one `UsageCounter` (and its clones) are serialized:
/// the read and the write happen under the same async lock. Writers that
/// bypass this service are not coordinated, so two increments racing
/// across services may collapse into one. The count is for display only.
#[derive(Clone)]
pub struct UsageCounter {
    store: Arc<dyn KeyedStore>,
    key: &'static str,
    lock: Arc<Mutex<()>>,
}

impl UsageCounter {
    pub fn new(store: Arc<dyn KeyedStore>) -> Self {
        Self {
            store,
            key: USED_CREDITS_KEY,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Current count, 0 when the key is absent.
    pub async fn current(&self) -> Result<u64, StoreError> {
        Ok(read_json::<u64>(self.store.as_ref(), self.key)
            .await?
            .unwrap_or(0))
    }

    /// Add one to the counter and return the new value. No retry on failure.
    pub async fn increment(&self) -> Result<u64, StoreError> {
        let _guard = self.lock.lock().await;
        let current = self.current().await?;
        let next = current.checked_add(1).ok_or_else(|| StoreError::Corrupt {
            key: self.key.to_string(),
            reason: "counter overflow".to_string(),
        })?;
        write_json(self.store.as_ref(), self.key, &next).await?;
        debug!("Usage counter {} -> {}", current, next);
        Ok(next)
    }
}
