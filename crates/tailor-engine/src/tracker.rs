use crate::enablement::PanelStateMachine;
use crate::store::KeyedStore;
use crate::tab_map::{ANSWERED_QUESTIONS, TAB_SUGGESTIONS};
use std::sync::Arc;
use tailor_common::TabId;
use tracing::{debug, info, warn};

/// Keeps per-tab state in line with the tabs that actually exist.
///
/// Tab removal is the only path that deletes per-tab artifacts, so stored
/// state does not grow as tabs come and go. Failures are logged, never
/// returned: the controller keeps running on a transiently stale view.
#[derive(Clone)]
pub struct TabTracker {
    store: Arc<dyn KeyedStore>,
    panels: PanelStateMachine,
}

impl TabTracker {
    pub fn new(store: Arc<dyn KeyedStore>, panels: PanelStateMachine) -> Self {
        Self { store, panels }
    }

    pub async fn on_tab_created(&self, tab_id: TabId) {
        match self.panels.reset_tab(tab_id).await {
            Ok(()) => debug!("Tab {} created with panel disabled", tab_id),
            Err(e) => warn!("Failed to disable panel for new tab {}: {}", tab_id, e),
        }
    }

    /// Returns whether the tab had a panel this session and was cleaned up.
    pub async fn on_tab_removed(&self, tab_id: TabId) -> bool {
        if !self.panels.active_tabs().needs_cleanup(tab_id) {
            debug!("Tab {} removed without an active panel", tab_id);
            return false;
        }

        let answers = ANSWERED_QUESTIONS.remove_tab(self.store.as_ref(), tab_id).await;
        let suggestions = TAB_SUGGESTIONS.remove_tab(self.store.as_ref(), tab_id).await;
        for (key, result) in [
            (ANSWERED_QUESTIONS.key(), answers),
            (TAB_SUGGESTIONS.key(), suggestions),
        ] {
            match result {
                Ok(true) => debug!("Removed {} entry for tab {}", key, tab_id),
                Ok(false) => {}
                Err(e) => warn!("Failed to remove {} entry for tab {}: {}", key, tab_id, e),
            }
        }

        self.panels.forget(tab_id);
        info!("Cleaned up closed tab {}", tab_id);
        true
    }
}
