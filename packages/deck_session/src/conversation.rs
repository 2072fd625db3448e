//! Conversation log.
//!
//! An ordered, append-only sequence of turns. Submitting user text appends a
//! user turn (delivered immediately — submission is the act of handing the
//! text to the transport layer, not backend confirmation) paired with a
//! pending assistant turn. Inbound replies resolve the oldest pending
//! assistant turn: the wire protocol carries no request ids, so correlation
//! is strictly FIFO in submission order. A backend that replies out of order
//! will misattribute replies; that is a documented protocol limitation, not
//! something this log papers over.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Lifecycle of an assistant turn: `Pending` until resolved, then terminally
/// `Delivered` or `Error`. User turns are created `Delivered` and never move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    Pending,
    Delivered,
    Error,
}

/// One message in the conversation. Ids are monotonically increasing in
/// creation order; creation order is the ordering key, not arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub status: TurnStatus,
    pub created_at: DateTime<Utc>,
}

/// Ids of the turn pair appended by one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeIds {
    pub user: u64,
    pub assistant: u64,
}

/// The ordered log. Entries are never reordered or deleted; the only
/// permitted mutation is a pending turn's status/content transition.
#[derive(Debug, Default)]
pub struct ConversationLog {
    turns: Vec<Turn>,
    next_id: u64,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delivered user turn and its pending assistant turn.
    pub fn append_exchange(&mut self, text: &str) -> ExchangeIds {
        let now = Utc::now();
        let user = self.push(Role::User, text.to_string(), TurnStatus::Delivered, now);
        let assistant = self.push(Role::Assistant, String::new(), TurnStatus::Pending, now);
        ExchangeIds { user, assistant }
    }

    fn push(&mut self, role: Role, content: String, status: TurnStatus, at: DateTime<Utc>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.turns.push(Turn {
            id,
            role,
            content,
            status,
            created_at: at,
        });
        id
    }

    /// FIFO correlation: deliver `text` to the oldest assistant turn still
    /// pending. Returns the resolved turn's id, or `None` for an orphan
    /// reply (nothing pending) — the caller logs and drops those.
    pub fn resolve_oldest_pending(&mut self, text: &str) -> Option<u64> {
        let turn = self
            .turns
            .iter_mut()
            .find(|t| t.role == Role::Assistant && t.status == TurnStatus::Pending)?;
        turn.content = text.to_string();
        turn.status = TurnStatus::Delivered;
        Some(turn.id)
    }

    /// Resolve a specific assistant turn (the fallback path is 1:1 with its
    /// turn, so there is no FIFO ambiguity). Terminal states are never
    /// overwritten: resolving a turn twice returns false.
    pub fn resolve(&mut self, id: u64, status: TurnStatus, content: &str) -> bool {
        let Some(turn) = self.turns.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if turn.status != TurnStatus::Pending {
            return false;
        }
        turn.content = content.to_string();
        turn.status = status;
        true
    }

    /// Number of assistant turns still awaiting a reply.
    pub fn pending_count(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| t.role == Role::Assistant && t.status == TurnStatus::Pending)
            .count()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_grows_by_two_in_call_order() {
        let mut log = ConversationLog::new();
        let a = log.append_exchange("first");
        let b = log.append_exchange("second");
        let c = log.append_exchange("third");

        assert_eq!(log.len(), 6);
        assert!(a.user < a.assistant);
        assert!(a.assistant < b.user);
        assert!(b.assistant < c.user);

        let ids: Vec<u64> = log.turns().iter().map(|t| t.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn user_turn_delivered_assistant_pending() {
        let mut log = ConversationLog::new();
        let ids = log.append_exchange("hello");
        let user = &log.turns()[ids.user as usize];
        let assistant = &log.turns()[ids.assistant as usize];
        assert_eq!(user.role, Role::User);
        assert_eq!(user.status, TurnStatus::Delivered);
        assert_eq!(user.content, "hello");
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(assistant.status, TurnStatus::Pending);
        assert!(assistant.content.is_empty());
    }

    #[test]
    fn fifo_correlation_resolves_in_submission_order() {
        let mut log = ConversationLog::new();
        let a = log.append_exchange("A");
        let b = log.append_exchange("B");
        let c = log.append_exchange("C");

        assert_eq!(log.resolve_oldest_pending("r1"), Some(a.assistant));
        assert_eq!(log.resolve_oldest_pending("r2"), Some(b.assistant));
        assert_eq!(log.resolve_oldest_pending("r3"), Some(c.assistant));

        let contents: Vec<&str> = log
            .turns()
            .iter()
            .filter(|t| t.role == Role::Assistant)
            .map(|t| t.content.as_str())
            .collect();
        assert_eq!(contents, vec!["r1", "r2", "r3"]);
        assert_eq!(log.pending_count(), 0);
    }

    #[test]
    fn orphan_reply_is_a_no_op() {
        let mut log = ConversationLog::new();
        assert_eq!(log.resolve_oldest_pending("late reply"), None);
        assert!(log.is_empty());

        let ids = log.append_exchange("hi");
        log.resolve(ids.assistant, TurnStatus::Delivered, "ok");
        assert_eq!(log.resolve_oldest_pending("second reply"), None);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn resolve_by_id_marks_error() {
        let mut log = ConversationLog::new();
        let ids = log.append_exchange("hi");
        assert!(log.resolve(ids.assistant, TurnStatus::Error, "sorry"));
        let assistant = &log.turns()[1];
        assert_eq!(assistant.status, TurnStatus::Error);
        assert_eq!(assistant.content, "sorry");
    }

    #[test]
    fn terminal_status_is_not_overwritten() {
        let mut log = ConversationLog::new();
        let ids = log.append_exchange("hi");
        assert!(log.resolve(ids.assistant, TurnStatus::Delivered, "done"));
        assert!(!log.resolve(ids.assistant, TurnStatus::Error, "oops"));
        let assistant = &log.turns()[1];
        assert_eq!(assistant.status, TurnStatus::Delivered);
        assert_eq!(assistant.content, "done");
    }

    #[test]
    fn resolving_a_user_turn_is_rejected() {
        let mut log = ConversationLog::new();
        let ids = log.append_exchange("hi");
        // The user turn is already Delivered; it never transitions again.
        assert!(!log.resolve(ids.user, TurnStatus::Error, "nope"));
        assert_eq!(log.turns()[0].content, "hi");
    }

    #[test]
    fn resolve_unknown_id_is_rejected() {
        let mut log = ConversationLog::new();
        assert!(!log.resolve(42, TurnStatus::Delivered, "ghost"));
    }
}
