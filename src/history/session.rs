use serde::Serialize;

use crate::error::Result;
use crate::storage::database::Database;

use super::paginator::{page_count, PAGE_SIZE};
use super::search::SearchView;

/// Which state the selection machine is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode<'a> {
    Idle { page: u32 },
    Searching { query: &'a str, page: u32 },
}

/// The main history page currently materialized in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MainView {
    pub page: u32,
    pub items: Vec<String>,
}

/// Everything the presentation layer and the command handlers share.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub main: MainView,
    pub search: Option<SearchView>,
    /// Index into the active view's current page. `None` means no selection.
    pub cursor: Option<usize>,
    /// Number of non-favorite entries in the store.
    pub clipboard_item_count: u32,
    /// Last clipboard text seen by the watcher or written by a promote.
    pub last_observed_text: String,
    pub monitoring_paused: bool,
    /// Set while clipboard reads keep failing.
    pub clipboard_unreadable: bool,
}

/// Serializable picture of the active view, handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub query: Option<String>,
    pub page: u32,
    pub page_count: u32,
    pub total: u32,
    pub items: Vec<String>,
    pub cursor: Option<usize>,
}

impl SessionState {
    /// Initial state: page 0 loaded, newest entry taken as the last observed text
    /// so content already at the front of history is not captured again.
    pub fn load(db: &Database) -> Result<Self> {
        let clipboard_item_count = db.count_by_favorite(false)?;
        let items: Vec<String> = db
            .page(false, 0, PAGE_SIZE)?
            .into_iter()
            .map(|e| e.text)
            .collect();
        let last_observed_text = items.first().cloned().unwrap_or_default();

        Ok(Self {
            main: MainView { page: 0, items },
            search: None,
            cursor: None,
            clipboard_item_count,
            last_observed_text,
            monitoring_paused: false,
            clipboard_unreadable: false,
        })
    }

    pub fn mode(&self) -> Mode<'_> {
        match &self.search {
            Some(view) => Mode::Searching {
                query: view.query(),
                page: view.page(),
            },
            None => Mode::Idle {
                page: self.main.page,
            },
        }
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    /// Items on the active view's current page.
    pub fn active_items(&self) -> &[String] {
        match &self.search {
            Some(view) => view.results(),
            None => &self.main.items,
        }
    }

    pub fn selected_text(&self) -> Option<&str> {
        self.cursor
            .and_then(|i| self.active_items().get(i))
            .map(String::as_str)
    }

    /// Load `page` of the main view. State is untouched if the store fails.
    pub fn open_main_page(&mut self, db: &Database, page: u32) -> Result<()> {
        let items = db
            .page(false, page, PAGE_SIZE)?
            .into_iter()
            .map(|e| e.text)
            .collect();
        self.main = MainView { page, items };
        Ok(())
    }

    /// Put a freshly captured text at the front of the in-memory first page.
    /// Other pages are left alone until they are next opened.
    pub fn push_front(&mut self, text: &str) {
        if self.main.page != 0 {
            return;
        }

        let selected = if self.is_searching() {
            None
        } else {
            self.cursor.and_then(|i| self.main.items.get(i).cloned())
        };

        let items = &mut self.main.items;
        if let Some(pos) = items.iter().position(|t| t == text) {
            items.remove(pos);
        } else if items.len() >= PAGE_SIZE as usize {
            items.pop();
        }
        items.insert(0, text.to_string());

        // Keep the highlight on the same text; drop it if it fell off the page.
        if let Some(selected) = selected {
            self.cursor = self.main.items.iter().position(|t| *t == selected);
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let (query, page) = match self.mode() {
            Mode::Idle { page } => (None, page),
            Mode::Searching { query, page } => (Some(query.to_string()), page),
        };
        let total = self
            .search
            .as_ref()
            .map_or(self.clipboard_item_count, SearchView::total);

        ViewSnapshot {
            query,
            page,
            page_count: page_count(total, PAGE_SIZE),
            total,
            items: self.active_items().to_vec(),
            cursor: self.cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(texts: &[&str]) -> (Database, SessionState) {
        let db = Database::open_in_memory().unwrap();
        for text in texts {
            db.insert(text).unwrap();
        }
        let state = SessionState::load(&db).unwrap();
        (db, state)
    }

    #[test]
    fn load_takes_newest_entry_as_last_observed() {
        let (_db, state) = session_with(&["A", "B"]);
        assert_eq!(state.last_observed_text, "B");
        assert_eq!(state.clipboard_item_count, 2);
        assert_eq!(state.main.items, ["B", "A"]);
        assert_eq!(state.mode(), Mode::Idle { page: 0 });
    }

    #[test]
    fn load_of_empty_store_is_initial_state() {
        let (_db, state) = session_with(&[]);
        assert_eq!(state.last_observed_text, "");
        assert_eq!(state.cursor, None);
        assert!(state.active_items().is_empty());
    }

    #[test]
    fn push_front_moves_existing_text_up() {
        let (_db, mut state) = session_with(&["A", "B", "C"]);
        state.push_front("A");
        assert_eq!(state.main.items, ["A", "C", "B"]);
    }

    #[test]
    fn push_front_keeps_page_bounded() {
        let texts: Vec<String> = (0..9).map(|i| format!("t{}", i)).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let (_db, mut state) = session_with(&refs);

        state.push_front("new");
        assert_eq!(state.main.items.len(), PAGE_SIZE as usize);
        assert_eq!(state.main.items[0], "new");
        assert!(!state.main.items.contains(&"t0".to_string()));
    }

    #[test]
    fn push_front_follows_selected_text() {
        let (_db, mut state) = session_with(&["A", "B", "C"]);
        state.cursor = Some(1);
        state.push_front("D");
        assert_eq!(state.selected_text(), Some("B"));
        assert_eq!(state.cursor, Some(2));
    }

    #[test]
    fn push_front_ignores_later_pages() {
        let (db, mut state) = session_with(&["A"]);
        state.open_main_page(&db, 1).unwrap();
        state.push_front("B");
        assert!(state.main.items.is_empty());
    }

    #[test]
    fn snapshot_reflects_search_view() {
        let (db, mut state) = session_with(&["Item 1", "Other"]);
        state.search = Some(SearchView::start(&db, "item").unwrap());
        let snap = state.snapshot();
        assert_eq!(snap.query.as_deref(), Some("item"));
        assert_eq!(snap.items, ["Item 1"]);
        assert_eq!(snap.total, 1);
        assert_eq!(snap.page_count, 1);
    }
}
