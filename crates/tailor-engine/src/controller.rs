use crate::active::ActivePanelTabs;
use crate::config::schema::TailorConfig;
use crate::counter::UsageCounter;
use crate::enablement::PanelStateMachine;
use crate::host::PanelHost;
use crate::store::KeyedStore;
use crate::tracker::TabTracker;
use std::sync::Arc;
use tailor_common::TabId;
use tailor_common::error::ControllerError;
use tailor_common::model::PanelState;
use tailor_common::protocol::{
    HostEvent, Inbound, MessageResponse, Reply, ReplyEnvelope, RuntimeMessage,
};
use tracing::{debug, error, info, warn};

/// The single background entry point.
///
/// Durable state lives in the store; only the set of active panel tabs is
/// held here, so a controller rebuilt over the same store resumes where the
/// previous one stopped (minus that set). Cloning is cheap and clones share
/// all state.
#[derive(Clone)]
pub struct BackgroundController {
    panels: PanelStateMachine,
    tracker: TabTracker,
    counter: UsageCounter,
}

impl BackgroundController {
    pub fn new(
        store: Arc<dyn KeyedStore>,
        host: Arc<dyn PanelHost>,
        panel_path: impl Into<String>,
    ) -> Self {
        let panels = PanelStateMachine::new(host, ActivePanelTabs::new(), panel_path);
        let tracker = TabTracker::new(store.clone(), panels.clone());
        let counter = UsageCounter::new(store);
        Self {
            panels,
            tracker,
            counter,
        }
    }

    pub fn from_config(
        store: Arc<dyn KeyedStore>,
        host: Arc<dyn PanelHost>,
        config: &TailorConfig,
    ) -> Self {
        Self::new(store, host, config.panel.path.clone())
    }

    pub fn active_tabs(&self) -> Vec<TabId> {
        self.panels.active_tabs().snapshot()
    }

    pub fn panel_state(&self, tab_id: TabId) -> PanelState {
        self.panels.state(tab_id)
    }

    /// Route any inbound frame. Messages produce a reply, events do not.
    pub async fn dispatch(&self, inbound: Inbound) -> Option<ReplyEnvelope> {
        match inbound {
            Inbound::Event(event) => {
                self.handle_event(event).await;
                None
            }
            Inbound::Message(envelope) => Some(ReplyEnvelope {
                id: envelope.id,
                response: self.handle_message(envelope.message).await,
            }),
        }
    }

    pub async fn handle_event(&self, event: HostEvent) {
        match event {
            HostEvent::Installed { reason } => {
                info!("Extension installed ({:?})", reason);
                if let Err(e) = self.panels.apply_install_defaults().await {
                    warn!("Failed to set default panel options: {}", e);
                }
            }
            HostEvent::TabCreated { tab_id } => self.tracker.on_tab_created(tab_id).await,
            HostEvent::TabRemoved { tab_id } => {
                self.tracker.on_tab_removed(tab_id).await;
            }
            HostEvent::ActionClicked { tab_id: None } => {
                debug!("Toolbar click without a tab, ignoring");
            }
            HostEvent::ActionClicked {
                tab_id: Some(tab_id),
            } => {
                if let Err(e) = self.panels.activate(tab_id).await {
                    warn!("Failed to enable panel for tab {}: {}", tab_id, e);
                }
            }
        }
    }

    /// Handle a runtime message. Never fails: errors become a failure reply.
    pub async fn handle_message(&self, message: RuntimeMessage) -> MessageResponse {
        let name = message.name();
        match self.run_message(message).await {
            Ok(reply) => MessageResponse::Success(reply),
            Err(e) => {
                error!("{} failed: {}", name, e);
                MessageResponse::failure(e.user_message())
            }
        }
    }

    async fn run_message(&self, message: RuntimeMessage) -> Result<Reply, ControllerError> {
        match message {
            RuntimeMessage::IncrementCredits => {
                let new_count = self.counter.increment().await?;
                Ok(Reply::Incremented { new_count })
            }
            RuntimeMessage::GetUsedCredits => Ok(Reply::Count {
                count: self.counter.current().await?,
            }),
            RuntimeMessage::DisablePanel { tab_id } => {
                self.panels.deactivate(tab_id).await?;
                Ok(Reply::Done)
            }
        }
    }
}
