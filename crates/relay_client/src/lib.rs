//! HTTP client for the assistant relay. One operation, one attempt per
//! call: no retries, no timeout override, no cancellation.

use reqwest::Client;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{AssistantChatRequest, AssistantChatResponse},
};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum RelayError {
    /// The request never produced a usable response (connect/send failure).
    #[error("failed to reach the assistant relay: {0}")]
    Transport(#[from] reqwest::Error),
    /// The relay answered, but without a usable reply payload.
    #[error("assistant reply was malformed")]
    MalformedReply,
    /// The relay reported an upstream or validation failure.
    #[error("assistant relay error: {0}")]
    Relay(String),
}

impl RelayError {
    /// Distinguishes "the service answered garbage" from "the request
    /// failed"; callers surface different fallback copy for each.
    pub fn is_malformed_reply(&self) -> bool {
        matches!(self, RelayError::MalformedReply)
    }
}

pub struct AssistantClient {
    http: Client,
    relay_url: String,
}

impl AssistantClient {
    pub fn new(relay_url: impl Into<String>) -> Self {
        let relay_url = relay_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            relay_url,
        }
    }

    pub fn relay_url(&self) -> &str {
        &self.relay_url
    }

    /// Sends one user message and returns the generated reply.
    pub async fn send_chat(&self, message: &str) -> Result<String, RelayError> {
        let response = self
            .http
            .post(format!("{}/chat", self.relay_url))
            .json(&AssistantChatRequest {
                message: message.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let api_error = response.json::<ApiError>().await.ok();
            return Err(match api_error {
                Some(err) if matches!(err.code, ErrorCode::UpstreamMalformed) => {
                    warn!(%status, message = %err.message, "relay reported a malformed upstream reply");
                    RelayError::MalformedReply
                }
                Some(err) => RelayError::Relay(format!("{status}: {}", err.message)),
                None => RelayError::Relay(status.to_string()),
            });
        }

        let body: AssistantChatResponse = response.json().await.map_err(|err| {
            warn!(%err, "relay success body did not match the expected shape");
            RelayError::MalformedReply
        })?;
        Ok(body.reply)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
