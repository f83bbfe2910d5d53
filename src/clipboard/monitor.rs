use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::{interval, Interval, MissedTickBehavior};

use super::provider::ClipboardProvider;
use crate::error::Result;
use crate::history::session::SessionState;
use crate::storage::database::Database;

pub const POLL_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Paused,
    /// Clipboard could not be read this tick.
    Skipped,
    Unchanged,
    Captured {
        id: i64,
        replaced: usize,
        expired: u32,
    },
}

/// Samples the clipboard and reconciles new text into the store.
pub struct ClipboardMonitor<'a> {
    db: &'a Database,
    clipboard: &'a dyn ClipboardProvider,
}

impl<'a> ClipboardMonitor<'a> {
    pub fn new(db: &'a Database, clipboard: &'a dyn ClipboardProvider) -> Self {
        Self { db, clipboard }
    }

    /// One poll. Clipboard failures skip the tick; store failures are
    /// returned with the session untouched so the next tick retries.
    pub fn tick(&self, state: &mut SessionState) -> Result<TickOutcome> {
        if state.monitoring_paused {
            return Ok(TickOutcome::Paused);
        }

        let text = match self.clipboard.read_text() {
            Ok(t) => t,
            Err(e) => {
                if state.clipboard_unreadable {
                    debug!("Clipboard still unreadable: {}", e);
                } else {
                    warn!("Clipboard unreadable, skipping ticks until it recovers: {}", e);
                    state.clipboard_unreadable = true;
                }
                return Ok(TickOutcome::Skipped);
            }
        };
        if std::mem::take(&mut state.clipboard_unreadable) {
            info!("Clipboard readable again");
        }

        if text.is_empty() || text == state.last_observed_text {
            return Ok(TickOutcome::Unchanged);
        }

        let capture = self.db.move_to_front(&text)?;
        let expired = match self.db.enforce_history_limit() {
            Ok(n) => n,
            Err(e) => {
                warn!("Failed to enforce history limit: {}", e);
                0
            }
        };

        state.clipboard_item_count = (state.clipboard_item_count + 1)
            .saturating_sub(capture.replaced as u32)
            .saturating_sub(expired);

        debug!(
            "Captured: id={} len={} replaced={} expired={}",
            capture.entry.id,
            text.chars().count(),
            capture.replaced,
            expired
        );

        state.push_front(&text);
        if expired > 0 && state.main.page == 0 {
            // Expired entries only reach the first page when all history fits on it.
            state.main.items.truncate(state.clipboard_item_count as usize);
            if state.cursor.is_some_and(|i| i >= state.main.items.len()) {
                state.cursor = None;
            }
        }
        state.last_observed_text = text;

        Ok(TickOutcome::Captured {
            id: capture.entry.id,
            replaced: capture.replaced,
            expired,
        })
    }
}

/// Fixed-rate ticker. Late ticks are delayed, never bunched up.
pub fn ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
