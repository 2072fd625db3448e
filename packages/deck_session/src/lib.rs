//! # deck_session
//!
//! Realtime chat session layer for the kube_deck operator console.
//!
//! One [`Session`] owns a single logical conversation channel to the agent
//! backend:
//! - a reconnecting WebSocket transport (`/ws`) that absorbs connection
//!   churn behind a [`ConnectionState`] snapshot,
//! - a one-shot HTTP fallback (`/api/chat`) used while the channel is down,
//! - an ordered, append-only [`ConversationLog`] that reconciles inbound
//!   replies against pending turns in FIFO order.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use deck_session::{Session, SessionConfig};
//!
//! # async fn run() {
//! let config = SessionConfig::default().with_server_url("http://127.0.0.1:8000");
//! let session = Session::spawn(config);
//!
//! session.submit("Scale webapp to 3").await;
//!
//! for turn in session.turns().await {
//!     println!("{:?}: {}", turn.role, turn.content);
//! }
//! session.shutdown();
//! # }
//! ```
//!
//! Connection status and the most recent inbound event are readable through
//! [`Session::store`]; log changes are broadcast via [`Session::subscribe`].

pub mod config;
pub mod conversation;
pub mod error;
pub mod fallback;
pub mod protocol;
pub mod session;
pub mod store;
pub mod transport;

pub use config::SessionConfig;
pub use conversation::{ConversationLog, ExchangeIds, Role, Turn, TurnStatus};
pub use error::{FallbackError, TransportError};
pub use fallback::FallbackClient;
pub use protocol::{InboundEvent, OutboundFrame};
pub use session::{FALLBACK_APOLOGY, LogEvent, Session};
pub use store::{ConnectionState, SessionSnapshot, SessionStore};
pub use transport::TransportHandle;
