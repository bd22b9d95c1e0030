use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Host-assigned tab identifier.
///
/// Serialized as a plain integer on the wire. When used as a map key in the
/// keyed store, serde_json writes it as a decimal string (`"7"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Enablement of the side panel for one tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelState {
    #[default]
    Disabled,
    Enabled,
}

impl From<bool> for PanelState {
    fn from(enabled: bool) -> Self {
        if enabled {
            PanelState::Enabled
        } else {
            PanelState::Disabled
        }
    }
}

/// Per-tab panel options as managed by the host.
///
/// `tab_id: None` addresses the global default applied to tabs with no
/// options of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelOptions {
    pub tab_id: Option<TabId>,
    pub path: String,
    pub enabled: bool,
}

impl PanelOptions {
    pub fn for_tab(tab_id: TabId, path: impl Into<String>, enabled: bool) -> Self {
        Self {
            tab_id: Some(tab_id),
            path: path.into(),
            enabled,
        }
    }

    pub fn global(path: impl Into<String>, enabled: bool) -> Self {
        Self {
            tab_id: None,
            path: path.into(),
            enabled,
        }
    }
}

/// One generated answer retained in a tab's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: Uuid,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_requirements: Option<String>,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(
        question: impl Into<String>,
        extra_requirements: Option<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            extra_requirements: extra_requirements.filter(|s| !s.trim().is_empty()),
            answer: answer.into(),
            created_at: Utc::now(),
        }
    }
}

/// The most recent suggestion shown in a tab's panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionSnapshot {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_requirements: Option<String>,
    pub suggestion: String,
    pub created_at: DateTime<Utc>,
}

impl SuggestionSnapshot {
    pub fn new(
        question: impl Into<String>,
        extra_requirements: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            extra_requirements: extra_requirements.filter(|s| !s.trim().is_empty()),
            suggestion: suggestion.into(),
            created_at: Utc::now(),
        }
    }
}
