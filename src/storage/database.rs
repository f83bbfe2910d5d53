use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use log::{debug, info};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use crate::clipboard::item::Entry;
use crate::error::{ClipdeckError, Result};

pub const SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_HISTORY_LIMIT: u32 = 500;
const DB_FILE: &str = "clipdeck.db";

const ENTRY_COLUMNS: &str = "id, text, favorite";

/// Result of moving a text to the front of history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub entry: Entry,
    /// Prior copies removed before the insert (0 or 1).
    pub replaced: usize,
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join(DB_FILE);
        let db = Self::from_connection(Connection::open(&db_path)?)?;

        let version = db.schema_version()?.unwrap_or(SCHEMA_VERSION);
        info!("Database: {} (schema v{})", db_path.display(), version);
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        register_functions(&conn)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ClipdeckError::StoreUnavailable(format!("connection lock poisoned: {}", e)))
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL UNIQUE,
                favorite INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_items_favorite ON items(favorite, id DESC);

            CREATE TABLE IF NOT EXISTS app_config (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM app_config WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match stored.map(|v| v.parse::<u32>()) {
            None => {
                conn.execute(
                    "INSERT INTO app_config (key, value) VALUES ('schema_version', ?1)",
                    params![SCHEMA_VERSION.to_string()],
                )?;
            }
            Some(Ok(version)) if version <= SCHEMA_VERSION => {}
            Some(Ok(version)) => {
                return Err(ClipdeckError::StoreUnavailable(format!(
                    "database schema version {} is newer than supported version {}",
                    version, SCHEMA_VERSION
                )));
            }
            Some(Err(e)) => {
                return Err(ClipdeckError::StoreUnavailable(format!(
                    "unreadable schema version: {}",
                    e
                )));
            }
        }

        conn.execute(
            "INSERT OR IGNORE INTO app_config (key, value) VALUES ('history_limit', ?1)",
            params![DEFAULT_HISTORY_LIMIT.to_string()],
        )?;

        debug!("Database migrations complete (schema v{})", SCHEMA_VERSION);
        Ok(())
    }

    // ── Entries ─────────────────────────────────────────────────────────

    /// Insert a new entry at the front of history.
    /// Fails with `DuplicateText` if the text is already stored.
    pub fn insert(&self, text: &str) -> Result<Entry> {
        let conn = self.lock()?;
        insert_entry(&conn, text)
    }

    /// Delete the entry with exactly this text. Returns the number removed (0 or 1).
    pub fn delete_by_text(&self, text: &str) -> Result<usize> {
        let conn = self.lock()?;
        Ok(conn.execute("DELETE FROM items WHERE text = ?1", params![text])?)
    }

    /// Delete any prior copy of `text` and insert it fresh, in one transaction.
    pub fn move_to_front(&self, text: &str) -> Result<Capture> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let replaced = tx.execute("DELETE FROM items WHERE text = ?1", params![text])?;
        let entry = insert_entry(&tx, text)?;
        tx.commit()?;
        Ok(Capture { entry, replaced })
    }

    pub fn count_by_favorite(&self, favorite: bool) -> Result<u32> {
        let conn = self.lock()?;
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM items WHERE favorite = ?1",
            params![favorite],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Remove every entry. Returns the number removed.
    pub fn clear(&self) -> Result<u32> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM items", [])?;
        Ok(rows as u32)
    }

    /// Entries with the given flag, newest first, windowed to one page.
    pub fn page(&self, favorite: bool, page_index: u32, page_size: u32) -> Result<Vec<Entry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM items
             WHERE favorite = ?1
             ORDER BY id DESC
             LIMIT ?2 OFFSET ?3"
        ))?;

        let entries = stmt
            .query_map(
                params![favorite, page_size, offset(page_index, page_size)],
                row_to_entry,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Entries whose text starts with `prefix`, ignoring case, newest first.
    pub fn search(&self, prefix: &str, page_index: u32, page_size: u32) -> Result<Vec<Entry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM items
             WHERE starts_with_ci(text, ?1)
             ORDER BY id DESC
             LIMIT ?2 OFFSET ?3"
        ))?;

        let entries = stmt
            .query_map(
                params![prefix, page_size, offset(page_index, page_size)],
                row_to_entry,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn search_count(&self, prefix: &str) -> Result<u32> {
        let conn = self.lock()?;
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM items WHERE starts_with_ci(text, ?1)",
            params![prefix],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Every entry, newest first.
    pub fn all_entries(&self) -> Result<Vec<Entry>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {ENTRY_COLUMNS} FROM items ORDER BY id DESC"))?;
        let entries = stmt
            .query_map([], row_to_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    // ── Settings ────────────────────────────────────────────────────────

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM app_config WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO app_config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn schema_version(&self) -> Result<Option<u32>> {
        Ok(self
            .get_setting("schema_version")?
            .and_then(|v| v.parse().ok()))
    }

    /// Maximum number of non-favorite entries retained. 0 means unbounded.
    pub fn history_limit(&self) -> u32 {
        self.get_setting("history_limit")
            .ok()
            .flatten()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
    }

    pub fn set_history_limit(&self, limit: u32) -> Result<()> {
        self.set_setting("history_limit", &limit.to_string())
    }

    /// Drop the oldest non-favorite entries beyond the history limit.
    /// Returns the number removed.
    pub fn enforce_history_limit(&self) -> Result<u32> {
        let limit = self.history_limit();
        if limit == 0 {
            return Ok(0);
        }

        let count = self.count_by_favorite(false)?;
        if count <= limit {
            return Ok(0);
        }

        let excess = count - limit;
        let conn = self.lock()?;
        let rows = conn.execute(
            "DELETE FROM items WHERE id IN (
                SELECT id FROM items
                WHERE favorite = 0
                ORDER BY id ASC
                LIMIT ?1
            )",
            params![excess],
        )?;

        if rows > 0 {
            info!("Expired {} old entries (limit: {})", rows, limit);
        }

        Ok(rows as u32)
    }
}

/// Case-insensitive "starts with". Wildcard characters in `prefix` are literal.
pub fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.to_lowercase().starts_with(&prefix.to_lowercase())
}

fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "starts_with_ci",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text = ctx.get::<String>(0)?;
            let prefix = ctx.get::<String>(1)?;
            Ok(starts_with_ignore_case(&text, &prefix))
        },
    )
}

fn insert_entry(conn: &Connection, text: &str) -> Result<Entry> {
    if text.is_empty() {
        return Err(ClipdeckError::EmptyText);
    }

    match conn.execute(
        "INSERT INTO items (text, favorite) VALUES (?1, 0)",
        params![text],
    ) {
        Ok(_) => Ok(Entry {
            id: conn.last_insert_rowid(),
            text: text.to_string(),
            favorite: false,
        }),
        Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
            Err(ClipdeckError::DuplicateText(text.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(0)?,
        text: row.get(1)?,
        favorite: row.get(2)?,
    })
}

fn offset(page_index: u32, page_size: u32) -> i64 {
    i64::from(page_index) * i64::from(page_size)
}

/// Failure injection for tests that need the store to go away mid-session.
#[cfg(test)]
impl Database {
    /// Hide the entries table so every entry query fails until restored.
    pub(crate) fn take_items_offline(&self) {
        let conn = self.lock().unwrap();
        conn.execute_batch("ALTER TABLE items RENAME TO items_offline").unwrap();
    }

    pub(crate) fn restore_items(&self) {
        let conn = self.lock().unwrap();
        conn.execute_batch("ALTER TABLE items_offline RENAME TO items").unwrap();
    }

    /// Swap the prefix matcher for one that always errors. Deletes and
    /// paging keep working; searches fail.
    pub(crate) fn break_prefix_search(&self) {
        let conn = self.lock().unwrap();
        conn.create_scalar_function("starts_with_ci", 2, FunctionFlags::SQLITE_UTF8, |_| {
            Err::<bool, _>(rusqlite::Error::UserFunctionError("prefix matcher offline".into()))
        })
        .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with(texts: &[&str]) -> Database {
        let db = Database::open_in_memory().unwrap();
        for text in texts {
            db.insert(text).unwrap();
        }
        db
    }

    fn texts(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.text.as_str()).collect()
    }

    #[test]
    fn page_returns_newest_first() {
        let db = db_with(&["A", "B", "C"]);
        let page = db.page(false, 0, 9).unwrap();
        assert_eq!(texts(&page), ["C", "B", "A"]);
    }

    #[test]
    fn insert_rejects_duplicate_text() {
        let db = db_with(&["A"]);
        let err = db.insert("A").unwrap_err();
        assert!(matches!(err, ClipdeckError::DuplicateText(ref t) if t == "A"));
        assert_eq!(db.count_by_favorite(false).unwrap(), 1);
    }

    #[test]
    fn insert_rejects_empty_text() {
        let db = db_with(&[]);
        assert!(matches!(db.insert(""), Err(ClipdeckError::EmptyText)));
    }

    #[test]
    fn ids_increase_and_are_never_reused() {
        let db = db_with(&[]);
        let a = db.insert("A").unwrap();
        let b = db.insert("B").unwrap();
        assert!(b.id > a.id);

        db.delete_by_text("B").unwrap();
        let again = db.insert("B").unwrap();
        assert!(again.id > b.id);
    }

    #[test]
    fn delete_by_text_reports_removed_count() {
        let db = db_with(&["A", "B"]);
        assert_eq!(db.delete_by_text("A").unwrap(), 1);
        assert_eq!(db.delete_by_text("A").unwrap(), 0);
        assert_eq!(db.delete_by_text("missing").unwrap(), 0);
        assert_eq!(texts(&db.page(false, 0, 9).unwrap()), ["B"]);
    }

    #[test]
    fn move_to_front_reorders_existing_text() {
        let db = db_with(&["A", "B"]);
        let capture = db.move_to_front("A").unwrap();
        assert_eq!(capture.replaced, 1);
        assert_eq!(texts(&db.page(false, 0, 9).unwrap()), ["A", "B"]);

        let fresh = db.move_to_front("C").unwrap();
        assert_eq!(fresh.replaced, 0);
        assert_eq!(texts(&db.page(false, 0, 9).unwrap()), ["C", "A", "B"]);
    }

    #[test]
    fn texts_stay_unique_under_mixed_operations() {
        let db = db_with(&[]);
        for text in ["A", "B", "A", "C", "B", "A"] {
            db.move_to_front(text).unwrap();
            let _ = db.insert(text);
            db.delete_by_text("C").unwrap();
            db.move_to_front("C").unwrap();
        }

        let mut all: Vec<String> = db.all_entries().unwrap().into_iter().map(|e| e.text).collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
    }

    #[test]
    fn paging_splits_at_page_size() {
        let db = db_with(&[]);
        for i in 0..10 {
            db.insert(&format!("Item {}", i)).unwrap();
        }

        let first = db.page(false, 0, 9).unwrap();
        assert_eq!(first.len(), 9);
        assert_eq!(first[0].text, "Item 9");

        let second = db.page(false, 1, 9).unwrap();
        assert_eq!(texts(&second), ["Item 0"]);

        assert!(db.page(false, 5, 9).unwrap().is_empty());
    }

    #[test]
    fn favorite_page_is_empty() {
        let db = db_with(&["A", "B"]);
        assert!(db.page(true, 0, 9).unwrap().is_empty());
        assert_eq!(db.count_by_favorite(true).unwrap(), 0);
        assert_eq!(db.count_by_favorite(false).unwrap(), 2);
    }

    #[test]
    fn search_matches_prefix_ignoring_case() {
        let db = db_with(&["Item one", "other item", "ITEM two", "itemize"]);
        let found = db.search("item", 0, 9).unwrap();
        assert_eq!(texts(&found), ["itemize", "ITEM two", "Item one"]);
        assert_eq!(db.search_count("item").unwrap(), 3);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let db = db_with(&["100% done", "100 percent", "a_b", "axb"]);
        assert_eq!(texts(&db.search("100%", 0, 9).unwrap()), ["100% done"]);
        assert_eq!(texts(&db.search("a_", 0, 9).unwrap()), ["a_b"]);
    }

    #[test]
    fn search_pages_independently_of_count() {
        let db = db_with(&[]);
        for i in 0..12 {
            db.insert(&format!("Item {}", i)).unwrap();
        }
        db.insert("unrelated").unwrap();

        assert_eq!(db.search_count("item").unwrap(), 12);
        assert_eq!(db.search("item", 0, 9).unwrap().len(), 9);
        assert_eq!(
            texts(&db.search("item", 1, 9).unwrap()),
            ["Item 2", "Item 1", "Item 0"]
        );
    }

    #[test]
    fn unicode_prefix_is_case_folded() {
        let db = db_with(&["Ärger im Büro"]);
        assert_eq!(db.search_count("är").unwrap(), 1);
    }

    #[test]
    fn clear_removes_everything() {
        let db = db_with(&["A", "B"]);
        assert_eq!(db.clear().unwrap(), 2);
        assert_eq!(db.clear().unwrap(), 0);
        assert_eq!(db.count_by_favorite(false).unwrap(), 0);
    }

    #[test]
    fn enforce_history_limit_drops_oldest() {
        let db = db_with(&["A", "B", "C", "D"]);
        db.set_history_limit(2).unwrap();
        assert_eq!(db.enforce_history_limit().unwrap(), 2);
        assert_eq!(texts(&db.page(false, 0, 9).unwrap()), ["D", "C"]);
    }

    #[test]
    fn zero_history_limit_is_unbounded() {
        let db = db_with(&["A", "B", "C"]);
        db.set_history_limit(0).unwrap();
        assert_eq!(db.enforce_history_limit().unwrap(), 0);
        assert_eq!(db.count_by_favorite(false).unwrap(), 3);
    }

    #[test]
    fn fresh_database_records_schema_version() {
        let db = db_with(&[]);
        assert_eq!(db.schema_version().unwrap(), Some(SCHEMA_VERSION));
        assert_eq!(db.history_limit(), DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn offline_table_reports_store_unavailable() {
        let db = db_with(&["A"]);
        db.take_items_offline();
        assert!(matches!(db.insert("B"), Err(ClipdeckError::StoreUnavailable(_))));
        assert!(matches!(db.move_to_front("A"), Err(ClipdeckError::StoreUnavailable(_))));

        db.restore_items();
        let b = db.insert("B").unwrap();
        assert!(b.id > 1);
        assert_eq!(texts(&db.all_entries().unwrap()), ["B", "A"]);
    }

    #[test]
    fn broken_prefix_matcher_fails_search_only() {
        let db = db_with(&["apple", "banana"]);
        db.break_prefix_search();
        assert!(matches!(db.search("ap", 0, 9), Err(ClipdeckError::StoreUnavailable(_))));
        assert!(db.search_count("ap").is_err());
        assert_eq!(db.delete_by_text("apple").unwrap(), 1);
        assert_eq!(texts(&db.page(false, 0, 9).unwrap()), ["banana"]);
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = Database::new(dir.path()).unwrap();
            db.insert("persisted").unwrap();
        }
        let db = Database::new(dir.path()).unwrap();
        assert_eq!(texts(&db.all_entries().unwrap()), ["persisted"]);
    }

    #[test]
    fn newer_schema_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = Database::new(dir.path()).unwrap();
            db.set_setting("schema_version", "99").unwrap();
        }
        let err = Database::new(dir.path()).err().unwrap();
        assert!(matches!(err, ClipdeckError::StoreUnavailable(_)));
    }
}
