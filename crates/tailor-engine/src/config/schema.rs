use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TailorConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub panel: PanelConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub messaging: MessagingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    9001
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Extension-relative page shown in the side panel.
    #[serde(default = "default_panel_path")]
    pub path: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            path: default_panel_path(),
        }
    }
}

fn default_panel_path() -> String {
    "sidepanel.html".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".tailor").join("store.json"),
        None => PathBuf::from("./tailor-store.json"),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// How long a panel waits for a reply before treating it as a failure.
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

impl MessagingConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}

fn default_response_timeout_ms() -> u64 {
    5000
}
