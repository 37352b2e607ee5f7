pub mod client;
pub mod config;
pub mod connection;
pub mod format;
pub mod history;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use client::{ApiClient, ChatReply};
pub use config::Config;
pub use connection::ConnectionMonitor;
pub use format::{format, Block, FormattedContent, Span};
pub use history::{FileStore, HistoryStore, KeyValueStore, MemoryStore, Snapshot};
pub use session::{ChatSession, SubmitOutcome, TurnRequest};
pub use state::{ConnectionState, ExchangeState, Message, Sender};
