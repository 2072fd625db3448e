//! Error types for the session layer.
//!
//! Nothing here is fatal to the process: transport errors are absorbed by the
//! reconnect loop, and fallback errors surface as an `Error` status on the
//! one assistant turn they belong to.

/// Errors from the realtime transport channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The channel is not currently connected. Frames are never queued;
    /// the caller should use the fallback transport instead.
    #[error("realtime channel is not connected")]
    NotConnected,

    /// The connection dropped while the frame was in flight, or the
    /// transport task is gone.
    #[error("realtime channel closed while sending")]
    ChannelClosed,

    /// The outbound frame could not be encoded as JSON.
    #[error("failed to encode outbound frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors from the one-shot request/response chat call.
#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
    /// The HTTP request itself failed (connect, timeout, decode).
    #[error("chat request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The chat endpoint answered with a non-success status.
    #[error("chat endpoint returned {0}")]
    Status(reqwest::StatusCode),
}
