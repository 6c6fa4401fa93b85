use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Completion API error: {0}")]
    Completion(String),

    #[error("Gateway API error: {0}")]
    Gateway(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type RelayResult<T> = Result<T, RelayError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}
impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Serialize)]
pub struct GatewaySendRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<&'a str>,

    pub message: &'a str,
    pub numbers: &'a str,
}

/// Fast2SMS-style send acknowledgment: `{"return": bool, "message": [..]}`.
#[derive(Debug, Deserialize)]
pub struct GatewaySendResponse {
    #[serde(rename = "return", default)]
    pub success: bool,

    #[serde(default)]
    pub message: Option<serde_json::Value>,
}
