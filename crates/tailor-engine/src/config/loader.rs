use super::schema::TailorConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Files searched when no explicit path is given, in priority order.
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./tailor.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".tailor").join("config.yaml"));
        }
        paths
    }

    /// An explicit path must exist. Otherwise the first existing candidate
    /// wins, and with none present the defaults apply.
    pub async fn load(explicit: Option<&Path>) -> Result<TailorConfig, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path).await;
        }
        for path in Self::candidate_paths() {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Self::load_from(&path).await;
            }
        }
        debug!("No config file found, using defaults");
        Ok(TailorConfig::default())
    }

    /// An empty file yields the defaults. A relative store path is taken
    /// relative to the file's own directory.
    pub async fn load_from(path: &Path) -> Result<TailorConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if content.trim().is_empty() {
            return Ok(TailorConfig::default());
        }
        let mut config: TailorConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if config.store.path.is_relative() {
            if let Some(dir) = path.parent() {
                config.store.path = dir.join(&config.store.path);
            }
        }
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}
