use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clipboard::item::Entry;
use crate::error::{ClipdeckError, Result};
use crate::storage::database::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Text,
}

impl FromStr for ExportFormat {
    type Err = ClipdeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            other => Err(ClipdeckError::Config(format!("unknown export format: {}", other))),
        }
    }
}

/// Whole history, newest first, in the requested format.
pub fn export_history(db: &Database, format: ExportFormat) -> Result<(String, usize)> {
    let entries = db.all_entries()?;
    let payload = match format {
        ExportFormat::Json => to_json(&entries)?,
        ExportFormat::Text => to_text(&entries),
    };
    Ok((payload, entries.len()))
}

pub fn to_json(entries: &[Entry]) -> Result<String> {
    Ok(serde_json::to_string(entries)?)
}

pub fn to_text(entries: &[Entry]) -> String {
    entries
        .iter()
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
