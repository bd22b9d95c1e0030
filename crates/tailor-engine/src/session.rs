//! Panel-side consumer state.
//!
//! A panel reads and writes the per-tab maps in the store directly and talks
//! to the controller only through runtime messages. Failures end up in
//! [`PanelSession::error`] for display; lists keep their last good contents.

use crate::config::schema::TailorConfig;
use crate::controller::BackgroundController;
use crate::store::KeyedStore;
use crate::tab_map::{ANSWERED_QUESTIONS, TAB_SUGGESTIONS};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tailor_common::TabId;
use tailor_common::model::{Artifact, SuggestionSnapshot};
use tailor_common::protocol::{MessageResponse, Reply, RuntimeMessage};
use tracing::warn;
use uuid::Uuid;

/// Asynchronous request/response channel to the background controller.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// `None` means no response arrived (controller unloaded, channel closed).
    async fn send(&self, message: RuntimeMessage) -> Option<MessageResponse>;
}

#[async_trait]
impl Messenger for BackgroundController {
    async fn send(&self, message: RuntimeMessage) -> Option<MessageResponse> {
        Some(self.handle_message(message).await)
    }
}

pub struct PanelSession {
    store: Arc<dyn KeyedStore>,
    messenger: Arc<dyn Messenger>,
    timeout: Duration,
    tab_id: Option<TabId>,
    answers: Vec<Artifact>,
    suggestion: Option<SuggestionSnapshot>,
    used_credits: Option<u64>,
    error: Option<String>,
}

impl PanelSession {
    pub fn new(store: Arc<dyn KeyedStore>, messenger: Arc<dyn Messenger>, timeout: Duration) -> Self {
        Self {
            store,
            messenger,
            timeout,
            tab_id: None,
            answers: Vec::new(),
            suggestion: None,
            used_credits: None,
            error: None,
        }
    }

    /// Session waiting `messaging.response_timeout_ms` for each reply.
    pub fn from_config(
        store: Arc<dyn KeyedStore>,
        messenger: Arc<dyn Messenger>,
        config: &TailorConfig,
    ) -> Self {
        Self::new(store, messenger, config.messaging.response_timeout())
    }

    pub fn tab_id(&self) -> Option<TabId> {
        self.tab_id
    }

    pub fn answers(&self) -> &[Artifact] {
        &self.answers
    }

    pub fn suggestion(&self) -> Option<&SuggestionSnapshot> {
        self.suggestion.as_ref()
    }

    pub fn used_credits(&self) -> Option<u64> {
        self.used_credits
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Bind the session to a tab and load its stored state.
    pub async fn attach(&mut self, tab_id: TabId) {
        if self.tab_id != Some(tab_id) {
            self.answers.clear();
            self.suggestion = None;
        }
        self.tab_id = Some(tab_id);
        self.refresh().await;
    }

    /// Reload the tab's history and last suggestion. No-op without a tab.
    pub async fn refresh(&mut self) {
        let Some(tab_id) = self.tab_id else {
            return;
        };
        match ANSWERED_QUESTIONS.get(self.store.as_ref(), tab_id).await {
            Ok(answers) => self.answers = answers.unwrap_or_default(),
            Err(e) => self.fail(format!("Failed to load answered questions: {}", e)),
        }
        match TAB_SUGGESTIONS.get(self.store.as_ref(), tab_id).await {
            Ok(suggestion) => self.suggestion = suggestion,
            Err(e) => self.fail(format!("Failed to load last suggestion: {}", e)),
        }
    }

    /// Persist a finished generation and count it.
    ///
    /// Returns the stored artifact, or `None` when no tab is attached or the
    /// history could not be saved.
    pub async fn complete_generation(
        &mut self,
        question: &str,
        extra_requirements: Option<&str>,
        answer: &str,
    ) -> Option<Artifact> {
        let tab_id = self.tab_id?;
        let extra = extra_requirements.map(str::to_string);

        let snapshot = SuggestionSnapshot::new(question, extra.clone(), answer);
        match TAB_SUGGESTIONS
            .insert(self.store.as_ref(), tab_id, snapshot.clone())
            .await
        {
            Ok(()) => self.suggestion = Some(snapshot),
            Err(e) => self.fail(format!("Failed to save suggestion: {}", e)),
        }

        let artifact = Artifact::new(question, extra, answer);
        if let Err(e) = ANSWERED_QUESTIONS
            .record(self.store.as_ref(), tab_id, artifact.clone())
            .await
        {
            self.fail(format!("Failed to save answer: {}", e));
            return None;
        }
        self.answers.insert(0, artifact.clone());

        self.increment_credits().await;
        Some(artifact)
    }

    /// Delete one answer from the tab's history.
    pub async fn forget_answer(&mut self, id: Uuid) {
        let Some(tab_id) = self.tab_id else {
            return;
        };
        match ANSWERED_QUESTIONS.forget(self.store.as_ref(), tab_id, id).await {
            Ok(()) => self.answers.retain(|a| a.id != id),
            Err(e) => self.fail(format!("Failed to delete answer: {}", e)),
        }
    }

    /// Ask the controller to count one generation.
    pub async fn increment_credits(&mut self) -> Option<u64> {
        match self.request(RuntimeMessage::IncrementCredits).await? {
            Reply::Incremented { new_count } => {
                self.used_credits = Some(new_count);
                Some(new_count)
            }
            other => {
                self.fail(format!("Unexpected reply to incrementCredits: {:?}", other));
                None
            }
        }
    }

    pub async fn load_used_credits(&mut self) -> Option<u64> {
        match self.request(RuntimeMessage::GetUsedCredits).await? {
            Reply::Count { count } => {
                self.used_credits = Some(count);
                Some(count)
            }
            other => {
                self.fail(format!("Unexpected reply to getUsedCredits: {:?}", other));
                None
            }
        }
    }

    async fn request(&mut self, message: RuntimeMessage) -> Option<Reply> {
        let name = message.name();
        let response = tokio::time::timeout(self.timeout, self.messenger.send(message))
            .await
            .ok()
            .flatten();
        match response {
            Some(MessageResponse::Success(reply)) => Some(reply),
            Some(MessageResponse::Failure { error }) => {
                self.fail(error);
                None
            }
            None => {
                self.fail(format!("No response from background for {}", name));
                None
            }
        }
    }

    fn fail(&mut self, message: String) {
        warn!("{}", message);
        self.error = Some(message);
    }
}
