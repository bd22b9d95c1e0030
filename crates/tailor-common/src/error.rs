use thiserror::Error;

/// Failures of the persistent keyed store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode value for key '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stored value for key '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Failures of host commands (panel options, opening the panel).
#[derive(Debug, Clone, Error)]
pub enum HostError {
    #[error("Browser extension is not connected")]
    NotConnected,

    #[error("Host unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Host(#[from] HostError),
}

impl ControllerError {
    /// Short message suitable for display in the panel.
    pub fn user_message(&self) -> String {
        match self {
            ControllerError::Store(_) => format!("Could not access saved data: {}", self),
            ControllerError::Host(HostError::NotConnected) => {
                "The browser is not connected. Try reopening the panel.".to_string()
            }
            ControllerError::Host(e) => format!("Browser request failed: {}", e),
        }
    }
}
