use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a chat transcript, in the wire shape the completion API
/// expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Token accounting reported by the completion API, passed through to
/// callers unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A single completion request against one model.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A successful completion.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    /// Model that actually answered.
    pub model: String,
    pub usage: Option<Usage>,
}

/// Record of one failed model attempt in a fallback chain.
#[derive(Debug, Clone, Serialize)]
pub struct FailedAttempt {
    pub model: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_roles_serialize_lowercase() {
        let msg = ChatMessage::assistant("hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn test_usage_round_trips_wire_names() {
        let json = serde_json::json!({
            "prompt_tokens": 120,
            "completion_tokens": 45,
            "total_tokens": 165
        });
        let usage: Usage = serde_json::from_value(json).unwrap();
        assert_eq!(usage.total_tokens, 165);
    }
}
