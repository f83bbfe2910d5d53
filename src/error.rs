use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipdeckError {
    /// Insert of a text that is already stored. Callers delete first.
    #[error("entry already exists: {0:?}")]
    DuplicateText(String),

    #[error("refusing to store empty text")]
    EmptyText,

    #[error("clipboard unavailable: {0}")]
    ClipboardAccess(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("event loop stopped")]
    Stopped,

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for ClipdeckError {
    fn from(e: rusqlite::Error) -> Self {
        Self::StoreUnavailable(e.to_string())
    }
}

impl From<arboard::Error> for ClipdeckError {
    fn from(e: arboard::Error) -> Self {
        Self::ClipboardAccess(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClipdeckError>;
