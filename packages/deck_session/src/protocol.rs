//! Wire frames for the realtime chat channel.
//!
//! Outbound frames mirror what the backend's `/ws` endpoint expects. Inbound
//! frames can be any JSON object: `type == "response"` with a `message` field
//! is an assistant reply, `type == "error"` is a backend-reported error, and
//! everything else is passed through untouched as a system event.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages sent FROM the console TO the backend over the realtime channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundFrame {
    /// A user utterance for the agent.
    Chat { message: String, timestamp: String },
    /// Ask the backend for an agent status report.
    Status { timestamp: String },
}

impl OutboundFrame {
    /// Build a chat frame stamped with the current time (RFC3339).
    pub fn chat(message: impl Into<String>) -> Self {
        Self::Chat {
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Build a status request frame.
    pub fn status() -> Self {
        Self::Status {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// A parsed inbound frame from the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// An assistant reply; resolves the oldest pending turn.
    Response { text: String },
    /// Backend-reported error, e.g. the agent failed to initialize.
    /// Never resolves a turn.
    Error { text: String },
    /// Any other frame the backend sends (status reports and the like).
    System { raw: Value },
}

impl InboundEvent {
    /// Parse a raw text frame.
    ///
    /// Returns `None` when the payload is not a JSON object; the caller
    /// drops the frame and keeps the connection up.
    pub fn parse(payload: &str) -> Option<Self> {
        let raw: Value = serde_json::from_str(payload).ok()?;
        if !raw.is_object() {
            return None;
        }

        let event = match raw.get("type").and_then(Value::as_str) {
            Some("response") => match raw.get("message").and_then(Value::as_str) {
                Some(text) => Self::Response {
                    text: text.to_string(),
                },
                // A response without message text carries nothing a turn
                // could be resolved with; treat it as a system event.
                None => Self::System { raw },
            },
            Some("error") => {
                let text = raw
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown backend error")
                    .to_string();
                Self::Error { text }
            }
            _ => Self::System { raw },
        };
        Some(event)
    }
}
