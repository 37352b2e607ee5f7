use anyhow::Result;
use tokio::task::JoinHandle;

use healthbot_core::{
    ApiClient, ChatReply, ChatSession, Config, FileStore, HistoryStore, KeyValueStore, MemoryStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Re-probe the backend every this many ticks (300ms each, so ~30s).
const REPROBE_TICKS: u64 = 100;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub session: ChatSession,

    // Input state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Chat view state
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of chat area, set during render
    pub chat_width: u16,  // inner width of chat area, set during render

    // In-flight turn, if any
    pub turn_task: Option<JoinHandle<Result<ChatReply>>>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Transient notice shown in the footer (export path, errors)
    pub status_note: Option<String>,

    ticks: u64,
}

impl App {
    pub async fn new() -> Result<Self> {
        let config = Config::load().unwrap_or_else(|_| Config::new());
        let client = ApiClient::new(&config.base_url());

        // Fall back to an in-memory log when no config directory exists
        let store: Box<dyn KeyValueStore> = match FileStore::default_dir() {
            Ok(store) => Box::new(store),
            Err(_) => Box::new(MemoryStore::new()),
        };

        let mut session = ChatSession::new(client, HistoryStore::new(store));
        session.probe_connection().await;

        let mut app = Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            session,
            input: String::new(),
            cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            turn_task: None,
            animation_frame: 0,
            status_note: None,
            ticks: 0,
        };
        app.scroll_to_bottom();
        Ok(app)
    }

    pub fn loading(&self) -> bool {
        self.turn_task.is_some()
    }

    /// Submit the current input as one chat turn. The session's guard
    /// decides whether anything happens; on acceptance the exchange runs on
    /// a background task so rendering stays live.
    pub fn submit_input(&mut self) {
        if self.turn_task.is_some() {
            return;
        }
        if let Some(turn) = self.session.try_begin(&self.input) {
            self.input.clear();
            self.cursor = 0;
            self.status_note = None;
            self.turn_task = Some(tokio::spawn(turn.exchange()));
            self.scroll_to_bottom();
        }
    }

    /// Collect a finished exchange, if any, and conclude the turn.
    pub async fn poll_turn(&mut self) {
        let finished = self
            .turn_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.turn_task.take() {
            let outcome = match task.await {
                Ok(result) => result,
                Err(err) => Err(anyhow::anyhow!("exchange task failed: {}", err)),
            };
            self.session.conclude_turn(outcome);
            self.scroll_to_bottom();
        }
    }

    /// Periodic connectivity refresh so the indicator recovers without a
    /// restart. Skipped while a turn is in flight.
    pub async fn on_tick(&mut self) {
        self.tick_animation();
        self.poll_turn().await;

        self.ticks += 1;
        if self.ticks % REPROBE_TICKS == 0 && !self.loading() {
            self.session.probe_connection().await;
        }
    }

    /// Tick animation frame (called by Tick event)
    fn tick_animation(&mut self) {
        if self.loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Scroll the chat so the newest message (and the "Thinking..." line) is
    /// visible.
    pub fn scroll_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.session.messages() {
            total_lines += 1; // Role line ("You:" or "HealthBot:")
            for line in msg.text.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        // Room for the "Thinking..." indicator
        total_lines += 2;

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.chat_scroll = 0;
        }
    }
}
