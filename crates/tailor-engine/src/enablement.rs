use crate::active::ActivePanelTabs;
use crate::host::PanelHost;
use std::sync::Arc;
use tailor_common::TabId;
use tailor_common::error::HostError;
use tailor_common::model::{PanelOptions, PanelState};
use tracing::{debug, info};

/// Per-tab panel enablement: `disabled` until a user gesture enables it.
///
/// This is the only component that changes a tab's enablement. Transitions
/// are mirrored into [`ActivePanelTabs`] once the host accepted them.
#[derive(Clone)]
pub struct PanelStateMachine {
    host: Arc<dyn PanelHost>,
    active: ActivePanelTabs,
    panel_path: String,
}

impl PanelStateMachine {
    pub fn new(host: Arc<dyn PanelHost>, active: ActivePanelTabs, panel_path: impl Into<String>) -> Self {
        Self {
            host,
            active,
            panel_path: panel_path.into(),
        }
    }

    pub fn active_tabs(&self) -> &ActivePanelTabs {
        &self.active
    }

    /// Controller's view of the tab's state.
    pub fn state(&self, tab_id: TabId) -> PanelState {
        PanelState::from(self.active.contains(tab_id))
    }

    /// Install/update: the global default becomes `disabled`.
    ///
    /// Tabs enabled in a previous session keep their options.
    pub async fn apply_install_defaults(&self) -> Result<(), HostError> {
        self.host
            .set_panel_options(PanelOptions::global(&self.panel_path, false))
            .await?;
        info!("Panel disabled by default");
        Ok(())
    }

    /// A new tab never inherits another tab's panel.
    pub async fn reset_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        self.host
            .set_panel_options(PanelOptions::for_tab(tab_id, &self.panel_path, false))
            .await
    }

    /// `disabled -> enabled` on a user gesture. Re-enabling re-asserts the
    /// options and reopens the panel.
    pub async fn activate(&self, tab_id: TabId) -> Result<(), HostError> {
        self.host
            .set_panel_options(PanelOptions::for_tab(tab_id, &self.panel_path, true))
            .await?;
        if self.active.insert(tab_id) {
            info!("Panel enabled for tab {}", tab_id);
        } else {
            debug!("Panel already enabled for tab {}", tab_id);
        }
        self.host.open_panel(tab_id).await
    }

    /// Explicit `enabled -> disabled`. The tab stays eligible for artifact
    /// cleanup when it later closes.
    pub async fn deactivate(&self, tab_id: TabId) -> Result<(), HostError> {
        self.host
            .set_panel_options(PanelOptions::for_tab(tab_id, &self.panel_path, false))
            .await?;
        if self.active.retire(tab_id) {
            info!("Panel disabled for tab {}", tab_id);
        }
        Ok(())
    }

    /// `enabled -> disabled` for a tab the host already closed. No host
    /// command is needed; returns whether the tab was enabled or retired.
    pub fn forget(&self, tab_id: TabId) -> bool {
        self.active.remove(tab_id)
    }
}
