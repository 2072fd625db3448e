//! Transport channel.
//!
//! Owns the single realtime WebSocket connection to the backend and absorbs
//! connection churn: on unexpected close it waits a fixed delay and dials
//! again, forever, until the session is torn down. Callers never see raw
//! socket errors — connection health is only visible as `ConnectionState`
//! in the session store.
//!
//! The connection is driven by a spawned task; [`TransportHandle`] talks to
//! it over an mpsc command channel. Frames are never queued while the
//! channel is down: `send` is rejected with `NotConnected` and the caller
//! falls back to the one-shot HTTP transport.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::protocol::{InboundEvent, OutboundFrame};
use crate::store::{self, ConnectionState, SessionStore, StoreWriter};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum TransportCommand {
    /// Dial now if waiting out the retry delay; no-op while connected.
    Connect,
    Send {
        frame: OutboundFrame,
        ack: oneshot::Sender<Result<(), TransportError>>,
    },
}

/// Handle to the transport task. Cloneable; all clones drive the same
/// underlying connection.
#[derive(Clone)]
pub struct TransportHandle {
    commands: mpsc::Sender<TransportCommand>,
    store: SessionStore,
}

impl TransportHandle {
    /// Request a dial. Idempotent: while already connecting or connected
    /// this produces no new connection attempt and no state transition.
    pub async fn connect(&self) {
        let _ = self.commands.send(TransportCommand::Connect).await;
    }

    /// Send a frame over the live connection. Rejected with
    /// [`TransportError::NotConnected`] while the channel is down.
    pub async fn send(&self, frame: OutboundFrame) -> Result<(), TransportError> {
        if !self.store.connection_state().is_connected() {
            return Err(TransportError::NotConnected);
        }
        let (ack, done) = oneshot::channel();
        self.commands
            .send(TransportCommand::Send { frame, ack })
            .await
            .map_err(|_| TransportError::ChannelClosed)?;
        done.await.map_err(|_| TransportError::ChannelClosed)?
    }

    /// Read half of the session store this transport publishes into.
    pub fn store(&self) -> SessionStore {
        self.store.clone()
    }
}

/// Spawn the transport task. Every inbound event is forwarded on `events`
/// in arrival order and mirrored into the store snapshot.
pub(crate) fn spawn(
    ws_url: String,
    reconnect_delay: Duration,
    events: mpsc::Sender<InboundEvent>,
    cancel: CancellationToken,
) -> TransportHandle {
    let (writer, store) = store::channel();
    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(run(ws_url, reconnect_delay, writer, events, rx, cancel));
    TransportHandle {
        commands: tx,
        store,
    }
}

async fn run(
    ws_url: String,
    reconnect_delay: Duration,
    writer: StoreWriter,
    events: mpsc::Sender<InboundEvent>,
    mut commands: mpsc::Receiver<TransportCommand>,
    cancel: CancellationToken,
) {
    let mut ever_connected = false;

    'reconnect: loop {
        // Dial phase.
        writer.set_state(if ever_connected {
            ConnectionState::Reconnecting
        } else {
            ConnectionState::Connecting
        });

        let stream = tokio::select! {
            _ = cancel.cancelled() => break 'reconnect,
            dialed = tokio_tungstenite::connect_async(ws_url.as_str()) => match dialed {
                Ok((stream, _)) => Some(stream),
                Err(e) => {
                    warn!("realtime channel dial failed: {e}");
                    None
                }
            },
        };

        // Connected phase.
        if let Some(stream) = stream {
            ever_connected = true;
            writer.set_state(ConnectionState::Connected);
            debug!("realtime channel connected to {ws_url}");
            match serve_connection(stream, &writer, &events, &mut commands, &cancel).await {
                ConnectionEnd::Dropped => {}
                ConnectionEnd::Teardown => break 'reconnect,
            }
        }
        writer.set_state(ConnectionState::Disconnected);

        // Fixed-delay retry, no cap. A Connect command short-circuits the
        // wait; Send commands racing the disconnect are rejected here.
        let deadline = tokio::time::Instant::now() + reconnect_delay;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break 'reconnect,
                _ = tokio::time::sleep_until(deadline) => break,
                cmd = commands.recv() => match cmd {
                    Some(TransportCommand::Connect) => break,
                    Some(TransportCommand::Send { ack, .. }) => {
                        let _ = ack.send(Err(TransportError::NotConnected));
                    }
                    None => break 'reconnect,
                },
            }
        }
    }

    writer.set_state(ConnectionState::Disconnected);
    debug!("transport task stopped");
}

enum ConnectionEnd {
    /// The connection closed or errored; the caller schedules a reconnect.
    Dropped,
    /// The session was torn down or every handle is gone.
    Teardown,
}

async fn serve_connection(
    stream: WsStream,
    writer: &StoreWriter,
    events: &mpsc::Sender<InboundEvent>,
    commands: &mut mpsc::Receiver<TransportCommand>,
    cancel: &CancellationToken,
) -> ConnectionEnd {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(tungstenite::Message::Close(None)).await;
                return ConnectionEnd::Teardown;
            }

            cmd = commands.recv() => match cmd {
                Some(TransportCommand::Connect) => {
                    debug!("connect requested while already connected; ignoring");
                }
                Some(TransportCommand::Send { frame, ack }) => {
                    match serde_json::to_string(&frame) {
                        Ok(json) => {
                            if sink.send(tungstenite::Message::Text(json.into())).await.is_err() {
                                let _ = ack.send(Err(TransportError::ChannelClosed));
                                return ConnectionEnd::Dropped;
                            }
                            let _ = ack.send(Ok(()));
                        }
                        Err(e) => {
                            let _ = ack.send(Err(TransportError::Encode(e)));
                        }
                    }
                }
                None => return ConnectionEnd::Teardown,
            },

            msg = source.next() => match msg {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    match InboundEvent::parse(text.as_str()) {
                        Some(event) => {
                            writer.record_event(event.clone());
                            if events.send(event).await.is_err() {
                                debug!("event consumer gone; dropping inbound event");
                            }
                        }
                        None => {
                            warn!("dropping malformed frame from backend: {}", text.as_str());
                        }
                    }
                }
                Some(Ok(tungstenite::Message::Close(_))) | None => {
                    warn!("realtime channel closed by backend");
                    return ConnectionEnd::Dropped;
                }
                Some(Ok(_)) => {
                    // Ping/pong handled by tungstenite; binary frames are
                    // not part of the protocol.
                }
                Some(Err(e)) => {
                    warn!("realtime channel error: {e}");
                    return ConnectionEnd::Dropped;
                }
            },
        }
    }
}
