use crate::store::{KeyedStore, read_json, write_json};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use tailor_common::TabId;
use tailor_common::error::StoreError;
use tailor_common::model::{Artifact, SuggestionSnapshot};
use tailor_common::protocol::{ANSWERED_QUESTIONS_KEY, TAB_SUGGESTIONS_KEY};
use uuid::Uuid;

/// A mapping from tab to `T`, persisted as one JSON object under one key.
///
/// Every mutation is a single read-modify-write of the whole mapping.
#[derive(Debug)]
pub struct TabMap<T> {
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for TabMap<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TabMap<T> {}

/// Answered question history, most recent first.
pub const ANSWERED_QUESTIONS: TabMap<Vec<Artifact>> = TabMap::new(ANSWERED_QUESTIONS_KEY);

/// Last suggestion shown per tab.
pub const TAB_SUGGESTIONS: TabMap<SuggestionSnapshot> = TabMap::new(TAB_SUGGESTIONS_KEY);

impl<T> TabMap<T> {
    pub const fn new(key: &'static str) -> Self {
        Self {
            key,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }
}

impl<T: Serialize + DeserializeOwned> TabMap<T> {
    pub async fn load(&self, store: &dyn KeyedStore) -> Result<BTreeMap<TabId, T>, StoreError> {
        Ok(read_json(store, self.key).await?.unwrap_or_default())
    }

    pub async fn get(&self, store: &dyn KeyedStore, tab: TabId) -> Result<Option<T>, StoreError> {
        Ok(self.load(store).await?.remove(&tab))
    }

    pub async fn insert(
        &self,
        store: &dyn KeyedStore,
        tab: TabId,
        value: T,
    ) -> Result<(), StoreError> {
        self.update(store, tab, |_| Some(value)).await
    }

    /// Read-modify-write of one tab's entry. Returning `None` deletes it.
    pub async fn update<F>(&self, store: &dyn KeyedStore, tab: TabId, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(Option<T>) -> Option<T>,
    {
        let mut map = self.load(store).await?;
        if let Some(value) = f(map.remove(&tab)) {
            map.insert(tab, value);
        }
        write_json(store, self.key, &map).await
    }

    /// Delete the tab's entry. Returns whether an entry existed; the
    /// mapping is only rewritten when it did.
    ///
    /// Works on the raw JSON object so entries written by other consumers
    /// in a shape this crate cannot decode are still removed.
    pub async fn remove_tab(&self, store: &dyn KeyedStore, tab: TabId) -> Result<bool, StoreError> {
        let mut map = match store.get(self.key).await? {
            None | Some(Value::Null) => return Ok(false),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(StoreError::Corrupt {
                    key: self.key.to_string(),
                    reason: "expected a JSON object keyed by tab id".to_string(),
                });
            }
        };
        if map.remove(&tab.to_string()).is_none() {
            return Ok(false);
        }
        store.set(self.key, Value::Object(map)).await?;
        Ok(true)
    }
}

impl TabMap<Vec<Artifact>> {
    /// Prepend an artifact to the tab's history.
    pub async fn record(
        &self,
        store: &dyn KeyedStore,
        tab: TabId,
        artifact: Artifact,
    ) -> Result<(), StoreError> {
        self.update(store, tab, |existing| {
            let mut history = existing.unwrap_or_default();
            history.insert(0, artifact);
            Some(history)
        })
        .await
    }

    /// Delete one artifact. The tab's entry disappears with its last artifact.
    pub async fn forget(
        &self,
        store: &dyn KeyedStore,
        tab: TabId,
        id: Uuid,
    ) -> Result<(), StoreError> {
        self.update(store, tab, |existing| {
            let mut history = existing?;
            history.retain(|a| a.id != id);
            (!history.is_empty()).then_some(history)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn record_keeps_most_recent_first() {
        let store = MemoryStore::new();
        let tab = TabId(3);
        ANSWERED_QUESTIONS
            .record(&store, tab, Artifact::new("first", None, "a"))
            .await
            .unwrap();
        ANSWERED_QUESTIONS
            .record(&store, tab, Artifact::new("second", None, "b"))
            .await
            .unwrap();

        let history = ANSWERED_QUESTIONS.get(&store, tab).await.unwrap().unwrap();
        let questions: Vec<_> = history.iter().map(|a| a.question.as_str()).collect();
        assert_eq!(questions, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn forgetting_last_artifact_removes_entry() {
        let store = MemoryStore::new();
        let tab = TabId(9);
        let artifact = Artifact::new("q", None, "a");
        let id = artifact.id;
        ANSWERED_QUESTIONS.record(&store, tab, artifact).await.unwrap();
        ANSWERED_QUESTIONS.forget(&store, tab, id).await.unwrap();

        let map = ANSWERED_QUESTIONS.load(&store).await.unwrap();
        assert!(!map.contains_key(&tab));
    }

    #[tokio::test]
    async fn remove_tab_ignores_entry_shapes() {
        let store = MemoryStore::new();
        store
            .set(
                ANSWERED_QUESTIONS_KEY,
                serde_json::json!({
                    "7": [{ "id": "1700000000000", "question": "q", "answer": "a", "timestamp": 1700000000000u64 }],
                    "8": "not even a list"
                }),
            )
            .await
            .unwrap();

        assert!(ANSWERED_QUESTIONS.remove_tab(&store, TabId(7)).await.unwrap());

        let raw = store.get(ANSWERED_QUESTIONS_KEY).await.unwrap().unwrap();
        assert_eq!(raw, serde_json::json!({ "8": "not even a list" }));
    }

    #[tokio::test]
    async fn remove_tab_rejects_non_object_mapping() {
        let store = MemoryStore::new();
        store
            .set(TAB_SUGGESTIONS_KEY, serde_json::json!([1, 2]))
            .await
            .unwrap();
        assert!(TAB_SUGGESTIONS.remove_tab(&store, TabId(1)).await.is_err());
    }

    #[tokio::test]
    async fn remove_tab_reports_absence_without_writing() {
        let store = MemoryStore::new();
        let removed = TAB_SUGGESTIONS.remove_tab(&store, TabId(1)).await.unwrap();
        assert!(!removed);
        assert!(store.is_empty().await);
    }
}
