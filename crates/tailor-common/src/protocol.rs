use crate::model::{PanelOptions, TabId};
use serde::{Deserialize, Serialize};

/// Store key of the shared usage counter.
pub const USED_CREDITS_KEY: &str = "usedSuggestionCreditsCount";
/// Store key of the per-tab last suggestion map.
pub const TAB_SUGGESTIONS_KEY: &str = "tabSuggestions";
/// Store key of the per-tab answered question history.
pub const ANSWERED_QUESTIONS_KEY: &str = "allAnsweredQuestions";

/// Anything the extension may send to the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    Event(HostEvent),
    Message(MessageEnvelope),
}

/// Anything the controller may send to the extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outbound {
    Command(HostCommand),
    Reply(ReplyEnvelope),
}

/// Lifecycle events emitted by the host browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostEvent {
    Installed {
        #[serde(default)]
        reason: InstallReason,
    },
    TabCreated {
        tab_id: TabId,
    },
    TabRemoved {
        tab_id: TabId,
    },
    /// User clicked the toolbar icon. The tab may be unknown during startup.
    ActionClicked {
        #[serde(default)]
        tab_id: Option<TabId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallReason {
    #[default]
    Install,
    Update,
    ChromeUpdate,
    SharedModuleUpdate,
    #[serde(other)]
    Other,
}

/// Commands the controller issues to the host browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostCommand {
    SetPanelOptions(PanelOptions),
    OpenPanel { tab_id: TabId },
}

/// Runtime messages from panel-side consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RuntimeMessage {
    IncrementCredits,
    GetUsedCredits,
    DisablePanel { tab_id: TabId },
}

impl RuntimeMessage {
    pub fn name(&self) -> &'static str {
        match self {
            RuntimeMessage::IncrementCredits => "incrementCredits",
            RuntimeMessage::GetUsedCredits => "getUsedCredits",
            RuntimeMessage::DisablePanel { .. } => "disablePanel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub id: u64,
    pub message: RuntimeMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub id: u64,
    pub response: MessageResponse,
}

/// Successful payloads of a [`MessageResponse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Incremented { new_count: u64 },
    Count { count: u64 },
    Done,
}

/// Reply to a runtime message.
///
/// On the wire this is `{ "success": true, ... }` or
/// `{ "success": false, "error": "..." }`; never a bare value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawResponse", into = "RawResponse")]
pub enum MessageResponse {
    Success(Reply),
    Failure { error: String },
}

impl MessageResponse {
    pub fn incremented(new_count: u64) -> Self {
        MessageResponse::Success(Reply::Incremented { new_count })
    }

    pub fn failure(error: impl Into<String>) -> Self {
        MessageResponse::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MessageResponse::Success(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<serde_json::Value>,
}

impl From<MessageResponse> for RawResponse {
    fn from(resp: MessageResponse) -> Self {
        let mut raw = RawResponse {
            success: resp.is_success(),
            new_count: None,
            count: None,
            error: None,
        };
        match resp {
            MessageResponse::Success(Reply::Incremented { new_count }) => {
                raw.new_count = Some(new_count)
            }
            MessageResponse::Success(Reply::Count { count }) => raw.count = Some(count),
            MessageResponse::Success(Reply::Done) => {}
            MessageResponse::Failure { error } => raw.error = Some(error.into()),
        }
        raw
    }
}

impl TryFrom<RawResponse> for MessageResponse {
    type Error = String;

    fn try_from(raw: RawResponse) -> Result<Self, Self::Error> {
        if !raw.success {
            // The error payload may be a string or an arbitrary object.
            let error = match raw.error {
                Some(serde_json::Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => "Unknown error".to_string(),
            };
            return Ok(MessageResponse::Failure { error });
        }
        match (raw.new_count, raw.count) {
            (Some(_), Some(_)) => Err("response carries both newCount and count".to_string()),
            (Some(new_count), None) => Ok(MessageResponse::Success(Reply::Incremented { new_count })),
            (None, Some(count)) => Ok(MessageResponse::Success(Reply::Count { count })),
            (None, None) => Ok(MessageResponse::Success(Reply::Done)),
        }
    }
}
