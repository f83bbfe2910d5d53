use std::io::Write;

use log::{debug, info, warn};
use serde::Serialize;

use crate::history::export::ExportFormat;
use crate::history::session::ViewSnapshot;

/// Named signals sent to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum ShellEvent {
    HistoryCleared,
    ExportRequested { format: ExportFormat, entries: usize },
    ViewChanged(ViewSnapshot),
}

impl ShellEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::HistoryCleared => "historyCleared",
            Self::ExportRequested { .. } => "exportRequested",
            Self::ViewChanged(_) => "viewChanged",
        }
    }
}

/// Window and notification capabilities owned by the host application.
pub trait Shell: Send + Sync {
    fn hide_window(&self);
    fn notify(&self, event: ShellEvent);
}

/// Shell for headless runs: every signal goes to the log.
pub struct LogShell;

impl Shell for LogShell {
    fn hide_window(&self) {
        info!("hideWindow requested");
    }

    fn notify(&self, event: ShellEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => debug!("notify {}: {}", event.name(), json),
            Err(e) => warn!("notify {}: unserializable payload: {}", event.name(), e),
        }
    }
}

/// Shell for the interactive terminal mode: renders the active page to stdout.
pub struct ConsoleShell;

impl ConsoleShell {
    fn render(view: &ViewSnapshot) -> String {
        let mut out = String::new();
        match &view.query {
            Some(q) => out.push_str(&format!("search \"{}\" ", q)),
            None => out.push_str("history "),
        }
        out.push_str(&format!(
            "page {}/{} ({} entries)\n",
            view.page + 1,
            view.page_count.max(1),
            view.total
        ));

        for (i, text) in view.items.iter().enumerate() {
            let marker = if view.cursor == Some(i) { '>' } else { ' ' };
            let line: String = text.lines().next().unwrap_or_default().chars().take(60).collect();
            out.push_str(&format!("{} {} {}\n", marker, i + 1, line));
        }
        out
    }
}

impl Shell for ConsoleShell {
    fn hide_window(&self) {
        println!("(hidden)");
    }

    fn notify(&self, event: ShellEvent) {
        let text = match &event {
            ShellEvent::ViewChanged(view) => Self::render(view),
            ShellEvent::HistoryCleared => "history cleared\n".to_string(),
            ShellEvent::ExportRequested { format, entries } => {
                format!("exporting {} entries as {:?}\n", entries, format)
            }
        };
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn view(cursor: Option<usize>) -> ViewSnapshot {
        ViewSnapshot {
            query: None,
            page: 0,
            page_count: 1,
            total: 2,
            items: vec!["first".into(), "second\nline".into()],
            cursor,
        }
    }

    #[test]
    fn event_serializes_with_name_tag() {
        let json = serde_json::to_value(ShellEvent::HistoryCleared).unwrap();
        assert_eq!(json, serde_json::json!({ "event": "historyCleared" }));

        let json = serde_json::to_value(ShellEvent::ExportRequested {
            format: ExportFormat::Json,
            entries: 3,
        })
        .unwrap();
        assert_eq!(json["event"], "exportRequested");
        assert_eq!(json["payload"]["format"], "json");
    }

    #[test]
    fn console_render_marks_cursor() {
        let out = ConsoleShell::render(&view(Some(1)));
        assert!(out.starts_with("history page 1/1 (2 entries)"));
        assert!(out.contains("  1 first"));
        assert!(out.contains("> 2 second"));
        assert!(!out.contains("line"));
    }
}
