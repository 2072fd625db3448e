//! Session configuration.
//!
//! Two equivalent ways to configure:
//!
//!   env var:    DECK_SERVER_URL=http://ops-backend:8000
//!   builder:    SessionConfig::default().with_server_url("http://ops-backend:8000")
//!
//! Figment layers struct defaults under `DECK_*` env vars.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for one console session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Base address of the agent backend. The realtime channel lives at
    /// `/ws` on this server, the fallback chat endpoint at `/api/chat`.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Fixed delay between reconnect attempts of the realtime channel.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Per-request timeout for the fallback chat call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_server_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl SessionConfig {
    /// Layer defaults under `DECK_*` env vars.
    pub fn load() -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Env, Serialized},
        };

        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed("DECK_"))
            .extract()
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay_ms = delay.as_millis() as u64;
        self
    }

    /// The realtime channel endpoint: the configured server with the scheme
    /// mapped to WebSocket and a fixed `/ws` path.
    pub fn ws_url(&self) -> String {
        let base = self.server_url.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        format!("{base}/ws")
    }

    /// The fallback chat endpoint.
    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.server_url.trim_end_matches('/'))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
