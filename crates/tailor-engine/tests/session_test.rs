mod common;

use async_trait::async_trait;
use common::FlakyStore;
use std::sync::Arc;
use std::time::Duration;
use tailor_common::TabId;
use tailor_common::model::Artifact;
use tailor_common::protocol::{MessageResponse, RuntimeMessage};
use tailor_engine::config::schema::TailorConfig;
use tailor_engine::controller::BackgroundController;
use tailor_engine::host::MemoryHost;
use tailor_engine::session::{Messenger, PanelSession};
use tailor_engine::store::{KeyedStore, MemoryStore};
use tailor_engine::tab_map::{ANSWERED_QUESTIONS, TAB_SUGGESTIONS};

/// Background that never answers, as after the host unloaded it.
struct SilentBackground;

#[async_trait]
impl Messenger for SilentBackground {
    async fn send(&self, _message: RuntimeMessage) -> Option<MessageResponse> {
        std::future::pending().await
    }
}

/// Background whose channel is gone.
struct ClosedBackground;

#[async_trait]
impl Messenger for ClosedBackground {
    async fn send(&self, _message: RuntimeMessage) -> Option<MessageResponse> {
        None
    }
}

fn session_over(store: Arc<dyn KeyedStore>) -> PanelSession {
    let controller = BackgroundController::new(store.clone(), Arc::new(MemoryHost::new()), "sidepanel.html");
    PanelSession::new(store, Arc::new(controller), Duration::from_secs(1))
}

#[tokio::test]
async fn test_no_tab_is_a_silent_noop() {
    let store = Arc::new(MemoryStore::new());
    let mut session = session_over(store.clone());

    session.refresh().await;
    let stored = session.complete_generation("q", None, "a").await;

    assert!(stored.is_none());
    assert!(session.error().is_none());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_complete_generation_records_and_counts() {
    let store = Arc::new(MemoryStore::new());
    let mut session = session_over(store.clone());
    session.attach(TabId(7)).await;

    session
        .complete_generation("Why us?", Some("under 100 words"), "Because.")
        .await
        .unwrap();
    session
        .complete_generation("Strengths?", None, "Rust.")
        .await
        .unwrap();

    assert_eq!(session.used_credits(), Some(2));
    let questions: Vec<_> = session.answers().iter().map(|a| a.question.clone()).collect();
    assert_eq!(questions, vec!["Strengths?", "Why us?"]);
    assert_eq!(session.suggestion().unwrap().suggestion, "Rust.");

    let stored = ANSWERED_QUESTIONS
        .get(store.as_ref(), TabId(7))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].extra_requirements.as_deref(), Some("under 100 words"));
    assert!(TAB_SUGGESTIONS.get(store.as_ref(), TabId(7)).await.unwrap().is_some());
}

#[tokio::test]
async fn test_attach_loads_existing_history() {
    let store = Arc::new(MemoryStore::new());
    ANSWERED_QUESTIONS
        .record(store.as_ref(), TabId(3), Artifact::new("old", None, "answer"))
        .await
        .unwrap();

    let mut session = session_over(store.clone());
    session.attach(TabId(3)).await;
    assert_eq!(session.answers().len(), 1);

    session.attach(TabId(4)).await;
    assert!(session.answers().is_empty());
}

#[tokio::test]
async fn test_forget_answer() {
    let store = Arc::new(MemoryStore::new());
    let mut session = session_over(store.clone());
    session.attach(TabId(1)).await;
    let artifact = session.complete_generation("q", None, "a").await.unwrap();

    session.forget_answer(artifact.id).await;

    assert!(session.answers().is_empty());
    let map = ANSWERED_QUESTIONS.load(store.as_ref()).await.unwrap();
    assert!(!map.contains_key(&TabId(1)));
}

#[tokio::test]
async fn test_unanswered_request_is_a_failure() {
    let store: Arc<dyn KeyedStore> = Arc::new(MemoryStore::new());
    let mut session = PanelSession::new(
        store,
        Arc::new(SilentBackground),
        Duration::from_millis(20),
    );

    assert_eq!(session.increment_credits().await, None);
    assert!(session.error().unwrap().contains("No response"));
}

#[tokio::test]
async fn test_configured_timeout_bounds_requests() {
    let store: Arc<dyn KeyedStore> = Arc::new(MemoryStore::new());
    let mut config = TailorConfig::default();
    config.messaging.response_timeout_ms = 30;
    let mut session = PanelSession::from_config(store, Arc::new(SilentBackground), &config);

    let result = tokio::time::timeout(Duration::from_secs(2), session.load_used_credits())
        .await
        .expect("configured timeout was not applied");

    assert_eq!(result, None);
    assert!(session.error().unwrap().contains("getUsedCredits"));
}

#[tokio::test]
async fn test_closed_channel_is_a_failure() {
    let store: Arc<dyn KeyedStore> = Arc::new(MemoryStore::new());
    let mut session = PanelSession::new(store, Arc::new(ClosedBackground), Duration::from_secs(1));

    assert_eq!(session.load_used_credits().await, None);
    assert!(session.error().is_some());
}

#[tokio::test]
async fn test_load_failure_keeps_stale_list() {
    let store = Arc::new(FlakyStore::new());
    let mut session = session_over(store.clone());
    session.attach(TabId(2)).await;
    session.complete_generation("q", None, "a").await.unwrap();

    store.fail_reads(true);
    session.refresh().await;

    assert_eq!(session.answers().len(), 1);
    assert!(session.error().unwrap().contains("Failed to load"));

    store.fail_reads(false);
    session.clear_error();
    session.refresh().await;
    assert!(session.error().is_none());
}

#[tokio::test]
async fn test_counter_failure_is_captured() {
    let store = Arc::new(FlakyStore::new());
    let mut session = session_over(store.clone());
    session.attach(TabId(2)).await;

    store.fail_writes(true);
    let stored = session.complete_generation("q", None, "a").await;

    assert!(stored.is_none());
    assert!(session.error().is_some());
    assert_eq!(session.used_credits(), None);
}
