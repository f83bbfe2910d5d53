use log::{info, warn};

use crate::clipboard::provider::ClipboardProvider;
use crate::error::Result;
use crate::shell::{Shell, ShellEvent};
use crate::storage::database::Database;

use super::export::{export_history, ExportFormat};
use super::paginator::{can_advance, can_retreat, PAGE_SIZE};
use super::search::SearchView;
use super::session::SessionState;

/// Every user-triggered operation on the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SelectNext,
    SelectPrevious,
    PageForward,
    PageBackward,
    /// Put the selected entry on the clipboard and hide the window.
    Promote,
    Delete,
    SetQuery(String),
    ClearHistory,
    HideWindow,
    PauseMonitoring,
    ResumeMonitoring,
    Export(ExportFormat),
}

/// What a command produced beyond its state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Done,
    Exported(String),
}

/// Translates commands into store operations and view refreshes.
///
/// Store work always happens before the session is touched, so a failing
/// store leaves the visible state as it was.
pub struct SelectionController<'a> {
    db: &'a Database,
    clipboard: &'a dyn ClipboardProvider,
    shell: &'a dyn Shell,
}

impl<'a> SelectionController<'a> {
    pub fn new(db: &'a Database, clipboard: &'a dyn ClipboardProvider, shell: &'a dyn Shell) -> Self {
        Self {
            db,
            clipboard,
            shell,
        }
    }

    pub fn apply(&self, state: &mut SessionState, command: Command) -> Result<Response> {
        match command {
            Command::SelectNext => self.select_next(state),
            Command::SelectPrevious => self.select_previous(state),
            Command::PageForward => self.page_forward(state)?,
            Command::PageBackward => self.page_backward(state)?,
            Command::Promote => self.promote(state)?,
            Command::Delete => self.delete(state)?,
            Command::SetQuery(query) => self.set_query(state, &query)?,
            Command::ClearHistory => self.clear_history(state)?,
            Command::HideWindow => self.shell.hide_window(),
            Command::PauseMonitoring => set_paused(state, true),
            Command::ResumeMonitoring => set_paused(state, false),
            Command::Export(format) => return self.export(format).map(Response::Exported),
        }
        Ok(Response::Done)
    }

    // ── Cursor ──────────────────────────────────────────────────────────

    pub fn select_next(&self, state: &mut SessionState) {
        let len = state.active_items().len();
        if len == 0 {
            return;
        }
        state.cursor = Some(match state.cursor {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        });
    }

    pub fn select_previous(&self, state: &mut SessionState) {
        let len = state.active_items().len();
        if len == 0 {
            return;
        }
        state.cursor = Some(match state.cursor {
            Some(i) if i > 0 && i < len => i - 1,
            _ => len - 1,
        });
    }

    // ── Paging ──────────────────────────────────────────────────────────

    pub fn page_forward(&self, state: &mut SessionState) -> Result<()> {
        if let Some(search) = state.search.as_mut() {
            if !can_advance(search.page(), search.total(), PAGE_SIZE) {
                return Ok(());
            }
            let next = search.page() + 1;
            search.open_page(self.db, next)?;
        } else {
            if !can_advance(state.main.page, state.clipboard_item_count, PAGE_SIZE) {
                return Ok(());
            }
            let next = state.main.page + 1;
            state.open_main_page(self.db, next)?;
        }
        state.cursor = None;
        Ok(())
    }

    pub fn page_backward(&self, state: &mut SessionState) -> Result<()> {
        if let Some(search) = state.search.as_mut() {
            if !can_retreat(search.page()) {
                return Ok(());
            }
            let prev = search.page() - 1;
            search.open_page(self.db, prev)?;
        } else {
            if !can_retreat(state.main.page) {
                return Ok(());
            }
            let prev = state.main.page - 1;
            state.open_main_page(self.db, prev)?;
        }
        state.cursor = None;
        Ok(())
    }

    // ── Mutations ───────────────────────────────────────────────────────

    /// Move the selected entry out of history and onto the clipboard.
    ///
    /// The clipboard is written before the entry is deleted so a failed
    /// write never loses the text. `last_observed_text` is set to the
    /// written value, which keeps the watcher from capturing it again.
    pub fn promote(&self, state: &mut SessionState) -> Result<()> {
        let Some(text) = state.selected_text().map(str::to_string) else {
            return Ok(());
        };

        self.clipboard.write_text(&text)?;
        let removed = self.db.delete_by_text(&text)?;
        state.clipboard_item_count = state.clipboard_item_count.saturating_sub(removed as u32);
        state.last_observed_text = text;

        state.search = None;
        state.cursor = None;
        if let Err(e) = state.open_main_page(self.db, 0) {
            warn!("Promote: failed to reload first page: {}", e);
            state.main.page = 0;
            state.main.items.clear();
        }

        info!("Promoted entry to clipboard ({} chars)", state.last_observed_text.chars().count());
        self.shell.hide_window();
        Ok(())
    }

    /// Remove the selected entry without touching the clipboard.
    pub fn delete(&self, state: &mut SessionState) -> Result<()> {
        let Some(text) = state.selected_text().map(str::to_string) else {
            return Ok(());
        };

        let removed = self.db.delete_by_text(&text)?;
        state.clipboard_item_count = state.clipboard_item_count.saturating_sub(removed as u32);
        state.cursor = None;

        // The row is gone either way; a failed reload only drops it from memory.
        if let Err(e) = state.open_main_page(self.db, 0) {
            warn!("Delete: failed to reload first page: {}", e);
            state.main.items.retain(|t| *t != text);
        }
        if let Some(search) = state.search.as_mut() {
            match SearchView::start(self.db, search.query()) {
                Ok(fresh) => *search = fresh,
                Err(e) => {
                    warn!("Delete: failed to re-run search: {}", e);
                    search.forget(&text);
                }
            }
        }
        Ok(())
    }

    /// Empty query leaves search mode; anything else starts a fresh search.
    pub fn set_query(&self, state: &mut SessionState, query: &str) -> Result<()> {
        if query.is_empty() {
            state.search = None;
        } else {
            state.search = Some(SearchView::start(self.db, query)?);
        }
        state.cursor = None;
        Ok(())
    }

    pub fn clear_history(&self, state: &mut SessionState) -> Result<()> {
        let removed = self.db.clear()?;
        let paused = state.monitoring_paused;
        *state = SessionState {
            monitoring_paused: paused,
            ..SessionState::default()
        };
        info!("Cleared clipboard history ({} entries)", removed);
        self.shell.notify(ShellEvent::HistoryCleared);
        Ok(())
    }

    pub fn export(&self, format: ExportFormat) -> Result<String> {
        let (payload, entries) = export_history(self.db, format)?;
        self.shell
            .notify(ShellEvent::ExportRequested { format, entries });
        Ok(payload)
    }
}

fn set_paused(state: &mut SessionState, paused: bool) {
    if state.monitoring_paused != paused {
        info!("Monitoring {}", if paused { "PAUSED" } else { "RESUMED" });
    }
    state.monitoring_paused = paused;
}
