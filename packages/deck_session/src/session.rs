//! Session and dispatcher.
//!
//! One [`Session`] per console lifetime. It owns the transport channel, the
//! fallback client, and the conversation log, and is the single entry point
//! for outgoing user text: realtime when the channel is up, one-shot HTTP
//! fallback otherwise. Inbound replies are applied to the log by a
//! reconciler task that consumes the transport's event stream.

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::conversation::{ConversationLog, ExchangeIds, Turn, TurnStatus};
use crate::error::TransportError;
use crate::fallback::FallbackClient;
use crate::protocol::{InboundEvent, OutboundFrame};
use crate::store::SessionStore;
use crate::transport::{self, TransportHandle};

/// Shown in place of an assistant reply when the fallback call fails.
pub const FALLBACK_APOLOGY: &str =
    "Sorry, I couldn't reach the agent backend. Please try again.";

/// Conversation log change notifications, for UI re-render.
#[derive(Debug, Clone)]
pub enum LogEvent {
    /// A user/assistant turn pair was appended.
    Appended { user: u64, assistant: u64 },
    /// An assistant turn reached a terminal status.
    Resolved { assistant: u64, status: TurnStatus },
}

/// A live conversation channel to the agent backend.
///
/// Exactly one instance should exist per UI; a second one would open a
/// second realtime connection. Teardown happens on [`Session::shutdown`]
/// or drop, closing the channel and cancelling any pending reconnect timer.
pub struct Session {
    transport: TransportHandle,
    fallback: FallbackClient,
    log: Arc<RwLock<ConversationLog>>,
    updates: broadcast::Sender<LogEvent>,
    cancel: CancellationToken,
}

impl Session {
    /// Start a session. The transport task begins dialing immediately and
    /// keeps retrying in the background, so this never fails: worst case is
    /// a session that stays disconnected and serves the fallback path.
    pub fn spawn(config: SessionConfig) -> Self {
        let cancel = CancellationToken::new();
        let (event_tx, event_rx) = mpsc::channel(64);

        let transport = transport::spawn(
            config.ws_url(),
            config.reconnect_delay(),
            event_tx,
            cancel.clone(),
        );
        let fallback = FallbackClient::new(config.chat_url(), config.request_timeout());
        let log = Arc::new(RwLock::new(ConversationLog::new()));
        let (updates, _) = broadcast::channel(64);

        tokio::spawn(reconcile(
            event_rx,
            log.clone(),
            updates.clone(),
            cancel.clone(),
        ));

        Self {
            transport,
            fallback,
            log,
            updates,
            cancel,
        }
    }

    /// Submit user text.
    ///
    /// Empty or whitespace-only input is dropped without creating a turn.
    /// Otherwise the turn pair is appended (the user turn is optimistically
    /// delivered at submission time) and the text goes out over the
    /// realtime channel when connected, the fallback call otherwise. The
    /// future completes once the fallback path (if taken) has resolved the
    /// assistant turn; on the realtime path resolution arrives later via
    /// the reconciler.
    pub async fn submit(&self, text: &str) -> Option<ExchangeIds> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let ids = {
            let mut log = self.log.write().await;
            log.append_exchange(text)
        };
        let _ = self.updates.send(LogEvent::Appended {
            user: ids.user,
            assistant: ids.assistant,
        });

        if self.store().connection_state().is_connected() {
            match self.transport.send(OutboundFrame::chat(text)).await {
                Ok(()) => return Some(ids),
                // Rare: the connection dropped between the state check and
                // the send. Fall through to the fallback call.
                Err(e) => debug!("realtime send rejected, using fallback: {e}"),
            }
        }

        match self.fallback.call_chat(text).await {
            Ok(reply) => {
                self.resolve_assistant(ids.assistant, TurnStatus::Delivered, &reply)
                    .await;
            }
            Err(e) => {
                warn!("fallback chat call failed: {e}");
                self.resolve_assistant(ids.assistant, TurnStatus::Error, FALLBACK_APOLOGY)
                    .await;
            }
        }
        Some(ids)
    }

    async fn resolve_assistant(&self, id: u64, status: TurnStatus, content: &str) {
        // A fallback call that resolves after teardown must not touch the log.
        if self.cancel.is_cancelled() {
            debug!("discarding fallback result for turn {id}: session closed");
            return;
        }
        let resolved = {
            let mut log = self.log.write().await;
            log.resolve(id, status, content)
        };
        if resolved {
            let _ = self.updates.send(LogEvent::Resolved {
                assistant: id,
                status,
            });
        }
    }

    /// Ask the backend for a status report over the realtime channel.
    /// The answer arrives as a `System` event in the store snapshot.
    pub async fn request_status(&self) -> Result<(), TransportError> {
        self.transport.send(OutboundFrame::status()).await
    }

    /// Request a dial now. Reconnection is otherwise automatic; this is a
    /// no-op while the channel is already up or mid-dial.
    pub async fn connect(&self) {
        self.transport.connect().await;
    }

    /// Read half of the session store: connection state plus last event.
    pub fn store(&self) -> SessionStore {
        self.transport.store()
    }

    /// Subscribe to conversation log changes.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.updates.subscribe()
    }

    /// Snapshot of the conversation so far, in creation order.
    pub async fn turns(&self) -> Vec<Turn> {
        self.log.read().await.turns().to_vec()
    }

    /// Tear down: close the realtime channel, cancel any pending reconnect
    /// timer, and stop the reconciler. In-flight fallback calls resolve
    /// into the void.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Apply inbound events to the conversation log.
///
/// `Response` events resolve the oldest pending assistant turn (FIFO —
/// assumes the backend replies in request order over the realtime channel).
/// A response with nothing pending is an orphan: logged and dropped. This
/// legitimately happens when a reply arrives late after a reconnect for a
/// turn already resolved by the fallback path.
async fn reconcile(
    mut events: mpsc::Receiver<InboundEvent>,
    log: Arc<RwLock<ConversationLog>>,
    updates: broadcast::Sender<LogEvent>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match event {
            InboundEvent::Response { text } => {
                let resolved = {
                    let mut log = log.write().await;
                    log.resolve_oldest_pending(&text)
                };
                match resolved {
                    Some(id) => {
                        let _ = updates.send(LogEvent::Resolved {
                            assistant: id,
                            status: TurnStatus::Delivered,
                        });
                    }
                    None => debug!("orphan response with no pending turn; dropped"),
                }
            }
            InboundEvent::Error { text } => warn!("backend error event: {text}"),
            InboundEvent::System { raw } => debug!("system event from backend: {raw}"),
        }
    }
    debug!("reconciler stopped");
}
