use serde::{Deserialize, Serialize};

/// Client -> relay: one user message per submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantChatRequest {
    pub message: String,
}

/// Relay -> client: the generated reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantChatResponse {
    pub reply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Relay -> upstream chat completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<PromptMessage>,
}

/// Upstream success body. Every field is optional on the wire; a body that
/// deserializes but carries no `choices[0].message.content` is treated as
/// malformed by the relay, never as a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

impl ChatCompletionResponse {
    pub fn reply_text(&self) -> Option<&str> {
        self.choices
            .first()?
            .message
            .as_ref()?
            .content
            .as_deref()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}
