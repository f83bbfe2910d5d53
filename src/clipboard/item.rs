use serde::{Deserialize, Serialize};

/// One retained clipboard text snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub text: String,
    pub favorite: bool,
}

impl Entry {
    /// Short single-line preview for listings.
    pub fn preview(&self, max_chars: usize) -> String {
        let line = self.text.lines().next().unwrap_or_default();
        let mut preview: String = line.chars().take(max_chars).collect();
        if line.chars().count() > max_chars || self.text.lines().nth(1).is_some() {
            preview.push('…');
        }
        preview
    }
}
