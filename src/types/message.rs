use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
}

impl MessageRole {
    pub fn as_str(&self) -> &str {
        match self {
            MessageRole::User => "user",
            MessageRole::Agent => "agent",
        }
    }
}

/// One content blob inside a message. Exactly one of `content` or
/// `content_url` is expected to be set; `content_type` declares how to
/// interpret it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl MessagePart {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            name: None,
            content_type: "text/plain".to_string(),
            content: Some(content.into()),
            content_encoding: None,
            content_url: None,
            metadata: None,
        }
    }
}

/// Role-tagged ordered sequence of parts. Immutable once attached to a
/// run's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: MessageRole,
    pub parts: Vec<MessagePart>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, parts: Vec<MessagePart>) -> Self {
        Self {
            role,
            parts,
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, vec![MessagePart::text(text)])
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Agent, vec![MessagePart::text(text)])
    }

    /// Inline text of all parts that carry it, newline-joined.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| p.content.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
