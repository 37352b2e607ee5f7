//! UI-agnostic chat state types
//!
//! These types are shared between the core state machines and whatever front
//! end hosts the session, and don't depend on any UI framework.

use serde::{Deserialize, Serialize};

/// Who produced a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One entry in the chat log. Immutable once created; the log itself is
/// append-only apart from a full clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    pub intent: Option<String>,
    pub confidence: Option<f64>,
    pub timestamp: String,
}

impl Message {
    pub fn user(text: &str) -> Self {
        Self {
            text: text.to_string(),
            sender: Sender::User,
            intent: None,
            confidence: None,
            timestamp: now_timestamp(),
        }
    }

    pub fn assistant(text: &str, intent: Option<String>, confidence: Option<f64>) -> Self {
        Self {
            text: text.to_string(),
            sender: Sender::Assistant,
            intent,
            confidence,
            timestamp: now_timestamp(),
        }
    }
}

fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Per-turn state of the chat session. At most one turn may be away from
/// `Idle` at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Sending,
    Awaiting,
    Rendering,
}

/// Connectivity as last observed by the connection monitor. `Unknown` until
/// the first probe completes; `Degraded` means only the fallback endpoint
/// answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unknown,
    Connected,
    Degraded,
    Offline,
}

impl ConnectionState {
    /// Whether the backend is worth talking to at all.
    pub fn is_reachable(&self) -> bool {
        matches!(self, ConnectionState::Connected | ConnectionState::Degraded)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Unknown => "Connecting...",
            ConnectionState::Connected => "Online",
            ConnectionState::Degraded => "Online (fallback)",
            ConnectionState::Offline => "Offline",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_serializes_lowercase() {
        let json = serde_json::to_string(&Sender::User).unwrap();
        assert_eq!(json, "\"user\"");
        let json = serde_json::to_string(&Sender::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn test_user_message_has_no_intent() {
        let msg = Message::user("hello");
        assert_eq!(msg.sender, Sender::User);
        assert!(msg.intent.is_none());
        assert!(msg.confidence.is_none());
        assert!(!msg.timestamp.is_empty());
    }

    #[test]
    fn test_assistant_message_carries_classification() {
        let msg = Message::assistant("hi", Some("greet".to_string()), Some(0.93));
        assert_eq!(msg.sender, Sender::Assistant);
        assert_eq!(msg.intent.as_deref(), Some("greet"));
        assert_eq!(msg.confidence, Some(0.93));
    }

    #[test]
    fn test_reachability() {
        assert!(ConnectionState::Connected.is_reachable());
        assert!(ConnectionState::Degraded.is_reachable());
        assert!(!ConnectionState::Offline.is_reachable());
        assert!(!ConnectionState::Unknown.is_reachable());
    }
}
