use crate::error::Result;
use crate::storage::database::Database;

use super::paginator::PAGE_SIZE;

/// Prefix-search projection of the store, paged independently of the main view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchView {
    query: String,
    page: u32,
    results: Vec<String>,
    total: u32,
}

impl SearchView {
    /// Run a fresh query from the first page.
    pub fn start(db: &Database, query: &str) -> Result<Self> {
        let mut view = Self {
            query: query.to_string(),
            page: 0,
            results: Vec::new(),
            total: 0,
        };
        view.refresh(db)?;
        Ok(view)
    }

    /// Re-run the query for the current page and recount matches.
    pub fn refresh(&mut self, db: &Database) -> Result<()> {
        let total = db.search_count(&self.query)?;
        let results = db.search(&self.query, self.page, PAGE_SIZE)?;
        self.total = total;
        self.results = results.into_iter().map(|e| e.text).collect();
        Ok(())
    }

    pub fn open_page(&mut self, db: &Database, page: u32) -> Result<()> {
        let results = db.search(&self.query, page, PAGE_SIZE)?;
        self.page = page;
        self.results = results.into_iter().map(|e| e.text).collect();
        Ok(())
    }

    /// Drop `text` from the loaded page once it has left the store.
    pub fn forget(&mut self, text: &str) {
        let before = self.results.len();
        self.results.retain(|t| t != text);
        if self.results.len() < before {
            self.total = self.total.saturating_sub(1);
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn results(&self) -> &[String] {
        &self.results
    }

    /// Total matches across all pages.
    pub fn total(&self) -> u32 {
        self.total
    }
}
