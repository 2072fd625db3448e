//! Session store.
//!
//! A single readable snapshot of connection status and the most recent
//! inbound event. One writer (the transport channel), many readers. A reader
//! that misses an intermediate snapshot only ever sees the latest one —
//! `last_event` is last-write-wins by construction. The conversation log
//! does not read from here: it consumes the transport's event stream
//! directly, so it observes every inbound event.

use tokio::sync::watch;

use crate::protocol::InboundEvent;

/// Connection status of the realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Dialing again after a previously established connection dropped.
    Reconnecting,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

/// The published snapshot.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub connection_state: ConnectionState,
    pub last_event: Option<InboundEvent>,
}

/// Writer half, held exclusively by the transport task.
#[derive(Debug)]
pub(crate) struct StoreWriter {
    tx: watch::Sender<SessionSnapshot>,
}

impl StoreWriter {
    /// Publish a state transition. Re-publishing the current state is a
    /// no-op, so idempotent connect requests produce no snapshot change.
    pub fn set_state(&self, state: ConnectionState) {
        self.tx.send_if_modified(|snap| {
            if snap.connection_state == state {
                false
            } else {
                snap.connection_state = state;
                true
            }
        });
    }

    /// Record the most recent inbound event (last-write-wins).
    pub fn record_event(&self, event: InboundEvent) {
        self.tx.send_modify(|snap| snap.last_event = Some(event));
    }
}

/// Read half handed to the dispatcher and to UIs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    rx: watch::Receiver<SessionSnapshot>,
}

impl SessionStore {
    /// Current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.rx.borrow().clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.rx.borrow().connection_state
    }

    /// Wait for the next snapshot change. Returns false once the session
    /// has been torn down and no further updates will arrive.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

pub(crate) fn channel() -> (StoreWriter, SessionStore) {
    let (tx, rx) = watch::channel(SessionSnapshot {
        connection_state: ConnectionState::Disconnected,
        last_event: None,
    });
    (StoreWriter { tx }, SessionStore { rx })
}
