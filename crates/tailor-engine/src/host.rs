use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tailor_common::TabId;
use tailor_common::error::HostError;
use tailor_common::model::{PanelOptions, PanelState};
use tailor_common::protocol::HostCommand;

/// Commands the controller can issue to the browser hosting it.
#[async_trait]
pub trait PanelHost: Send + Sync {
    /// Set per-tab panel options, or the global default when `tab_id` is `None`.
    async fn set_panel_options(&self, options: PanelOptions) -> Result<(), HostError>;

    /// Show the panel in the given tab.
    async fn open_panel(&self, tab_id: TabId) -> Result<(), HostError>;
}

/// In-process host model.
///
/// Applies commands the way the browser does (per-tab options override the
/// global default) and keeps a log of everything it received.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<HostState>,
    failing: AtomicBool,
}

#[derive(Debug, Default)]
struct HostState {
    default_options: Option<PanelOptions>,
    tab_options: HashMap<TabId, PanelOptions>,
    open_panels: Vec<TabId>,
    log: Vec<HostCommand>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following command fail with [`HostError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Effective enablement of a tab as the browser would report it.
    pub fn panel_state(&self, tab_id: TabId) -> PanelState {
        let state = self.lock();
        state
            .tab_options
            .get(&tab_id)
            .or(state.default_options.as_ref())
            .map(|o| PanelState::from(o.enabled))
            .unwrap_or_default()
    }

    pub fn tab_options(&self, tab_id: TabId) -> Option<PanelOptions> {
        self.lock().tab_options.get(&tab_id).cloned()
    }

    pub fn default_options(&self) -> Option<PanelOptions> {
        self.lock().default_options.clone()
    }

    /// Tabs the panel was opened in, in order.
    pub fn opened(&self) -> Vec<TabId> {
        self.lock().open_panels.clone()
    }

    pub fn commands(&self) -> Vec<HostCommand> {
        self.lock().log.clone()
    }

    /// Forget per-tab options, as the browser does when a tab closes.
    pub fn close_tab(&self, tab_id: TabId) {
        self.lock().tab_options.remove(&tab_id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> Result<(), HostError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HostError::Unavailable("simulated host failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PanelHost for MemoryHost {
    async fn set_panel_options(&self, options: PanelOptions) -> Result<(), HostError> {
        self.check()?;
        let mut state = self.lock();
        state.log.push(HostCommand::SetPanelOptions(options.clone()));
        match options.tab_id {
            Some(tab_id) => {
                state.tab_options.insert(tab_id, options);
            }
            None => state.default_options = Some(options),
        }
        Ok(())
    }

    async fn open_panel(&self, tab_id: TabId) -> Result<(), HostError> {
        self.check()?;
        let mut state = self.lock();
        state.log.push(HostCommand::OpenPanel { tab_id });
        state.open_panels.push(tab_id);
        Ok(())
    }
}
