//! Request and reply shapes for the chat pipeline.

use serde::{Deserialize, Serialize};

use nimbus_geo::ResolvedLocation;
use nimbus_llm::{ChatMessage, Usage};
use nimbus_weather::Coordinates;

use crate::context::OrchestrationContext;

fn default_include_images() -> bool {
    true
}

/// An inbound chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    /// Device coordinates, when the client shared them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conversation_history: Vec<ChatMessage>,
    /// Whether the caller wants imagery attached to the reply. Carried
    /// through for the rendering layer; the pipeline itself ignores it.
    #[serde(default = "default_include_images")]
    pub include_images: bool,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            conversation_history: Vec::new(),
            include_images: true,
        }
    }
}

/// A completed chat turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response: String,
    /// The full orchestration context, mirrored back to the client.
    pub weather_data: OrchestrationContext,
    /// The place the weather data describes, when one was resolved.
    pub location_found: Option<ResolvedLocation>,
    /// What the user literally asked for, when a place was extracted.
    pub searched_for: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

/// Every way a chat turn can end.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ChatOutcome {
    Reply(ChatReply),
    /// The request itself was unusable.
    BadRequest { error: String },
    /// Every generation model failed; `fallback` is safe to show as-is.
    BackendUnavailable { error: String, fallback: String },
}

impl ChatOutcome {
    /// HTTP-style status for transports that need one.
    pub fn status(&self) -> u16 {
        match self {
            ChatOutcome::Reply(_) => 200,
            ChatOutcome::BadRequest { .. } => 400,
            ChatOutcome::BackendUnavailable { .. } => 502,
        }
    }
}
