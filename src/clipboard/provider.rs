use std::sync::Mutex;

use crate::error::{ClipdeckError, Result};

/// Read/write access to the OS clipboard, plain text only.
pub trait ClipboardProvider: Send + Sync {
    /// Current clipboard text. An empty clipboard reads as `""`.
    fn read_text(&self) -> Result<String>;
    fn write_text(&self, text: &str) -> Result<()>;
}

/// System clipboard backed by arboard.
///
/// The handle is kept alive for the lifetime of the provider: on X11 and
/// Wayland the owning process must stay around to serve what it wrote.
pub struct SystemClipboard {
    inner: Mutex<Option<arboard::Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    fn with_clipboard<T>(
        &self,
        f: impl FnOnce(&mut arboard::Clipboard) -> std::result::Result<T, arboard::Error>,
    ) -> Result<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| ClipdeckError::ClipboardAccess(format!("clipboard lock poisoned: {}", e)))?;

        if guard.is_none() {
            *guard = Some(arboard::Clipboard::new()?);
        }

        let clipboard = guard
            .as_mut()
            .ok_or_else(|| ClipdeckError::ClipboardAccess("clipboard not initialized".into()))?;

        match f(clipboard) {
            Ok(value) => Ok(value),
            Err(e) => {
                // Drop the handle so the next call reconnects.
                *guard = None;
                Err(e.into())
            }
        }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardProvider for SystemClipboard {
    fn read_text(&self) -> Result<String> {
        self.with_clipboard(|cb| match cb.get_text() {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(e),
        })
    }

    fn write_text(&self, text: &str) -> Result<()> {
        self.with_clipboard(|cb| cb.set_text(text.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::ClipboardProvider;
    use crate::error::{ClipdeckError, Result};

    /// Scripted clipboard for tests.
    #[derive(Default)]
    pub(crate) struct MemoryClipboard {
        text: Mutex<String>,
        writes: Mutex<Vec<String>>,
        unavailable: Mutex<bool>,
    }

    impl MemoryClipboard {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Simulates another application copying `text`.
        pub(crate) fn copy(&self, text: &str) {
            *self.text.lock().unwrap() = text.to_string();
        }

        pub(crate) fn set_unavailable(&self, unavailable: bool) {
            *self.unavailable.lock().unwrap() = unavailable;
        }

        pub(crate) fn writes(&self) -> Vec<String> {
            self.writes.lock().unwrap().clone()
        }

        pub(crate) fn current(&self) -> String {
            self.text.lock().unwrap().clone()
        }
    }

    impl ClipboardProvider for MemoryClipboard {
        fn read_text(&self) -> Result<String> {
            if *self.unavailable.lock().unwrap() {
                return Err(ClipdeckError::ClipboardAccess("locked by another process".into()));
            }
            Ok(self.text.lock().unwrap().clone())
        }

        fn write_text(&self, text: &str) -> Result<()> {
            if *self.unavailable.lock().unwrap() {
                return Err(ClipdeckError::ClipboardAccess("locked by another process".into()));
            }
            *self.text.lock().unwrap() = text.to_string();
            self.writes.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }
}
