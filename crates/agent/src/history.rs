//! Rolling per-channel history — the short-term conversational cache.
//!
//! Each channel gets a bounded window of recent turn strings, oldest
//! evicted first. Windows are created on first use, reset by an explicit
//! wipe, and never persisted: a restart forgets them by design.
//!
//! Locking: the outer map lock is held only long enough to fetch or create
//! a window handle; each window then has its own lock, so unrelated
//! channels never contend. All operations here are synchronous — no lock
//! ever spans a suspension point. Appending the (user, agent) pair under a
//! single acquisition keeps same-channel completions from interleaving
//! half-pairs, and orders windows by reply finalization.

use banter_core::channel::ChannelId;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Default window size: how many turn strings a channel retains.
pub const DEFAULT_WINDOW: usize = 5;

/// A bounded window of recent turn strings for one channel.
#[derive(Debug)]
struct HistoryWindow {
    turns: VecDeque<String>,
    capacity: usize,
}

impl HistoryWindow {
    fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, turn: String) {
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    fn render(&self) -> String {
        self.turns.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}

/// The per-channel history map.
pub struct HistoryCache {
    capacity: usize,
    windows: Mutex<HashMap<String, Arc<Mutex<HistoryWindow>>>>,
}

impl HistoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch or create the window handle for a channel.
    fn window(&self, channel_id: &ChannelId) -> Arc<Mutex<HistoryWindow>> {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        windows
            .entry(channel_id.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(HistoryWindow::new(self.capacity))))
            .clone()
    }

    /// Render a channel's recent turns in chronological order.
    ///
    /// Reading never creates a window; an untouched channel renders empty.
    pub fn render(&self, channel_id: &ChannelId) -> String {
        let handle = {
            let windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
            windows.get(channel_id.as_str()).cloned()
        };
        match handle {
            Some(window) => window.lock().unwrap_or_else(|e| e.into_inner()).render(),
            None => String::new(),
        }
    }

    /// Append one finalized exchange: the user turn, then the agent turn.
    ///
    /// Both turns land under one lock acquisition so the pair is atomic
    /// with respect to concurrent completions on the same channel.
    pub fn append_exchange(&self, channel_id: &ChannelId, user_text: &str, agent_text: &str) {
        let window = self.window(channel_id);
        let mut window = window.lock().unwrap_or_else(|e| e.into_inner());
        window.push(format!("User: {user_text}"));
        window.push(format!("AI: {agent_text}"));
    }

    /// Empty one channel's window. Other channels are untouched.
    pub fn wipe(&self, channel_id: &ChannelId) {
        let handle = {
            let windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
            windows.get(channel_id.as_str()).cloned()
        };
        if let Some(window) = handle {
            window
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .turns
                .clear();
        }
    }

    /// Current turn count for a channel (0 if untouched).
    pub fn len(&self, channel_id: &ChannelId) -> usize {
        let windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        windows
            .get(channel_id.as_str())
            .map(|w| w.lock().unwrap_or_else(|e| e.into_inner()).turns.len())
            .unwrap_or(0)
    }
}

impl Default for HistoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
