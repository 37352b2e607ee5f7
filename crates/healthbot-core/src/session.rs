use anyhow::Result;
use tracing::{debug, warn};

use crate::client::{ApiClient, ChatReply};
use crate::connection::ConnectionMonitor;
use crate::format::{format, FormattedContent};
use crate::history::{HistoryStore, Snapshot};
use crate::state::{ConnectionState, ExchangeState, Message};

/// Fixed reply shown when a turn fails for any reason. Not a retry trigger;
/// the user resends manually.
const ERROR_REPLY: &str =
    "I'm sorry, I'm having trouble processing your request right now. Please try again in a moment.";

/// Outcome of a submission attempt.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The guard rejected the text; nothing changed and no request was made.
    Rejected,
    /// The turn ran to completion (success or error reply), with the
    /// assistant's formatted content.
    Completed { reply: FormattedContent },
}

/// An accepted turn's network half, detached from the session so a host can
/// run it on a background task while the session stays renderable.
pub struct TurnRequest {
    client: ApiClient,
    text: String,
}

impl TurnRequest {
    /// Full network round trip for this turn.
    pub async fn exchange(self) -> Result<ChatReply> {
        self.client.send_chat(&self.text).await
    }
}

/// Orchestrates one chat turn at a time: guards submissions, echoes the
/// user's message, exchanges it with the backend, formats the reply, and
/// persists the log write-through.
pub struct ChatSession {
    client: ApiClient,
    monitor: ConnectionMonitor,
    history: HistoryStore,
    log: Vec<Message>,
    state: ExchangeState,
}

impl ChatSession {
    /// Build a session, restoring any previously persisted chat log.
    pub fn new(client: ApiClient, history: HistoryStore) -> Self {
        let log = history.load();
        let monitor = ConnectionMonitor::new(client.clone());
        Self {
            client,
            monitor,
            history,
            log,
            state: ExchangeState::Idle,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.log
    }

    pub fn exchange_state(&self) -> ExchangeState {
        self.state
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.monitor.state()
    }

    /// Re-check backend reachability (at most two network attempts).
    pub async fn probe_connection(&mut self) -> ConnectionState {
        self.monitor.probe().await
    }

    /// Try to start a turn. Rejected (returning `None`, with no side
    /// effects) when the trimmed text is empty, a turn is already in
    /// flight, or the backend is known to be offline. On acceptance the
    /// user's message is echoed into the log immediately; it is never
    /// rolled back even if the exchange later fails.
    pub fn try_begin(&mut self, text: &str) -> Option<TurnRequest> {
        let text = text.trim();
        if text.is_empty()
            || self.state != ExchangeState::Idle
            || self.monitor.state() == ConnectionState::Offline
        {
            return None;
        }

        self.log.push(Message::user(text));
        self.state = ExchangeState::Sending;
        debug!(len = text.len(), "turn accepted");

        Some(TurnRequest {
            client: self.client.clone(),
            text: text.to_string(),
        })
    }

    /// Finish the turn begun by [`try_begin`]: append the assistant's reply
    /// (or the fixed error reply), persist the log, and return to idle.
    /// Returns the formatted content for the appended message.
    pub fn conclude_turn(&mut self, outcome: Result<ChatReply>) -> FormattedContent {
        self.state = ExchangeState::Rendering;

        let message = match outcome {
            Ok(reply) => Message::assistant(&reply.response, reply.intent, reply.confidence),
            Err(err) => {
                warn!(error = %err, "chat exchange failed");
                Message::assistant(ERROR_REPLY, Some("error".to_string()), None)
            }
        };

        let rendered = format(&message.text);
        self.log.push(message);

        // Write-through; a failed save must not fail the turn
        if let Err(err) = self.history.save(&self.log) {
            warn!(error = %err, "failed to persist chat history");
        }

        self.state = ExchangeState::Idle;
        rendered
    }

    /// Run a whole turn in place. Library callers get the granular state
    /// transitions; hosts that need a responsive UI use `try_begin` +
    /// `TurnRequest::exchange` + `conclude_turn` instead.
    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        let Some(turn) = self.try_begin(text) else {
            return SubmitOutcome::Rejected;
        };

        let outcome = match turn.client.dispatch_chat(&turn.text).await {
            Ok(response) => {
                self.state = ExchangeState::Awaiting;
                ApiClient::read_chat_reply(response).await
            }
            Err(err) => Err(err),
        };

        SubmitOutcome::Completed {
            reply: self.conclude_turn(outcome),
        }
    }

    /// Drop the whole conversation, in memory and in the store. The only
    /// non-append mutation of the log.
    pub fn clear(&mut self) -> Result<()> {
        self.log.clear();
        self.history.clear()
    }

    /// Snapshot the current log for download.
    pub fn export(&self) -> Snapshot {
        self.history.export(&self.log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{KeyValueStore, MemoryStore};
    use crate::state::Sender;

    fn session() -> ChatSession {
        let client = ApiClient::new("http://localhost:8000/api/health");
        ChatSession::new(client, HistoryStore::new(Box::new(MemoryStore::new())))
    }

    #[test]
    fn test_empty_text_is_rejected() {
        let mut session = session();
        assert!(session.try_begin("").is_none());
        assert!(session.try_begin("   \n").is_none());
        assert!(session.messages().is_empty());
        assert_eq!(session.exchange_state(), ExchangeState::Idle);
    }

    #[test]
    fn test_offline_gating() {
        let mut session = session();
        session.monitor.set_state(ConnectionState::Offline);

        assert!(session.try_begin("hello").is_none());
        assert!(session.messages().is_empty());
    }

    #[test]
    fn test_degraded_connection_still_accepts() {
        let mut session = session();
        session.monitor.set_state(ConnectionState::Degraded);

        assert!(session.try_begin("hello").is_some());
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn test_at_most_one_in_flight() {
        let mut session = session();
        let first = session.try_begin("first");
        assert!(first.is_some());
        assert_eq!(session.exchange_state(), ExchangeState::Sending);

        // Second submission while the first is in flight: no-op
        assert!(session.try_begin("second").is_none());
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].text, "first");
    }

    #[test]
    fn test_optimistic_echo_survives_failure() {
        let mut session = session();
        let _turn = session.try_begin("I feel sick").unwrap();

        let rendered = session.conclude_turn(Err(anyhow::anyhow!("connection refused")));
        assert!(!rendered.is_empty());

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].text, "I feel sick");
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert_eq!(messages[1].intent.as_deref(), Some("error"));
        assert!(messages[1].confidence.is_none());
        assert_eq!(session.exchange_state(), ExchangeState::Idle);
    }

    #[test]
    fn test_successful_turn_appends_and_persists() {
        let mut session = session();
        let _turn = session.try_begin("I have a fever").unwrap();

        let reply = ChatReply {
            response: "Rest and hydrate.\n\nCall 108 if it worsens.".to_string(),
            intent: Some("ask_symptom".to_string()),
            confidence: Some(0.91),
        };
        session.conclude_turn(Ok(reply));

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].intent.as_deref(), Some("ask_symptom"));
        assert_eq!(messages[1].confidence, Some(0.91));

        // The persisted log matches the session's
        assert_eq!(session.history.load(), session.log);
    }

    #[test]
    fn test_new_session_restores_history() {
        let mut store = MemoryStore::new();
        let log = vec![Message::user("hi")];
        store
            .set("healthbot_history", &serde_json::to_string(&log).unwrap())
            .unwrap();

        let client = ApiClient::new("http://localhost:8000/api/health");
        let session = ChatSession::new(client, HistoryStore::new(Box::new(store)));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].text, "hi");
    }

    #[test]
    fn test_clear_empties_log_and_store() {
        let mut session = session();
        let _turn = session.try_begin("hello").unwrap();
        session.conclude_turn(Err(anyhow::anyhow!("down")));
        assert_eq!(session.messages().len(), 2);

        session.clear().unwrap();
        assert!(session.messages().is_empty());
        assert!(session.history.load().is_empty());
    }

    #[test]
    fn test_export_carries_full_log() {
        let mut session = session();
        let _turn = session.try_begin("hello").unwrap();
        session.conclude_turn(Err(anyhow::anyhow!("down")));

        let snapshot = session.export();
        assert_eq!(snapshot.messages.len(), 2);
        assert!(snapshot.file_name().starts_with("healthbot-chat-"));
    }
}
