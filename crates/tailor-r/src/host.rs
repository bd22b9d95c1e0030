use async_trait::async_trait;
use tailor_common::TabId;
use tailor_common::error::HostError;
use tailor_common::model::PanelOptions;
use tailor_common::protocol::HostCommand;
use tailor_engine::host::PanelHost;
use tokio::sync::broadcast;
use tracing::debug;

/// Forwards host commands to the connected browser extension.
///
/// Commands are fire-and-forget: the extension applies them in the order
/// received and reports nothing back.
#[derive(Clone)]
pub struct RemoteHost {
    command_tx: broadcast::Sender<HostCommand>,
}

impl RemoteHost {
    pub fn new(command_tx: broadcast::Sender<HostCommand>) -> Self {
        Self { command_tx }
    }

    pub fn is_connected(&self) -> bool {
        self.command_tx.receiver_count() > 0
    }

    fn send(&self, command: HostCommand) -> Result<(), HostError> {
        debug!("Host command: {:?}", command);
        self.command_tx
            .send(command)
            .map(|_| ())
            .map_err(|_| HostError::NotConnected)
    }
}

#[async_trait]
impl PanelHost for RemoteHost {
    async fn set_panel_options(&self, options: PanelOptions) -> Result<(), HostError> {
        self.send(HostCommand::SetPanelOptions(options))
    }

    async fn open_panel(&self, tab_id: TabId) -> Result<(), HostError> {
        self.send(HostCommand::OpenPanel { tab_id })
    }
}
