//! Fallback transport.
//!
//! One-shot request/response chat call used while the realtime channel is
//! down. Stateless: one HTTP POST per user message, no retries — retry
//! policy, if any, belongs to the dispatcher.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FallbackError;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

/// Client for the backend's `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct FallbackClient {
    http: reqwest::Client,
    chat_url: String,
    timeout: Duration,
}

impl FallbackClient {
    pub fn new(chat_url: String, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            chat_url,
            timeout,
        }
    }

    /// Deliver one user message and return the assistant's reply.
    ///
    /// `text` must be non-empty; the dispatcher filters empty input before
    /// it gets here.
    pub async fn call_chat(&self, text: &str) -> Result<String, FallbackError> {
        debug_assert!(!text.trim().is_empty());
        debug!("fallback chat call to {}", self.chat_url);

        let res = self
            .http
            .post(&self.chat_url)
            .timeout(self.timeout)
            .json(&ChatRequest { message: text })
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(FallbackError::Status(res.status()));
        }

        let body: ChatResponse = res.json().await?;
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_shape() {
        let json = serde_json::to_value(ChatRequest { message: "list pods" }).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "list pods" }));
    }

    #[test]
    fn chat_response_parses() {
        let body: ChatResponse =
            serde_json::from_str(r#"{"response":"3 pods running","timestamp":"x","status":"success"}"#)
                .unwrap();
        assert_eq!(body.response, "3 pods running");
    }
}
