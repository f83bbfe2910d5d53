//! Boundary between raw input and history commands.
//!
//! Keys map to commands through one total function; text lines typed in the
//! terminal mode are parsed into either a key or a direct command.

use std::str::FromStr;

use thiserror::Error;

use crate::history::controller::Command;
use crate::history::export::ExportFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    /// Ctrl+Backspace, or Cmd+Backspace on macOS.
    DeleteEntry,
}

impl Key {
    pub fn command(self) -> Command {
        match self {
            Key::Up => Command::SelectPrevious,
            Key::Down => Command::SelectNext,
            Key::Left => Command::PageBackward,
            Key::Right => Command::PageForward,
            Key::Enter => Command::Promote,
            Key::Escape => Command::HideWindow,
            Key::DeleteEntry => Command::Delete,
        }
    }
}

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    Command(Command),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown input: {0:?}")]
pub struct UnknownInput(pub String);

impl FromStr for Key {
    type Err = UnknownInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" | "k" => Ok(Key::Up),
            "down" | "j" => Ok(Key::Down),
            "left" | "h" => Ok(Key::Left),
            "right" | "l" => Ok(Key::Right),
            "enter" | "" => Ok(Key::Enter),
            "esc" | "escape" => Ok(Key::Escape),
            "ctrl+backspace" | "cmd+backspace" | "del" | "delete" => Ok(Key::DeleteEntry),
            _ => Err(UnknownInput(s.to_string())),
        }
    }
}

impl FromStr for InputLine {
    type Err = UnknownInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim_end_matches(['\r', '\n']);

        // "/needle" searches, a bare "/" leaves search.
        if let Some(query) = line.strip_prefix('/') {
            return Ok(InputLine::Command(Command::SetQuery(query.to_string())));
        }

        let trimmed = line.trim();
        let command = match trimmed.to_ascii_lowercase().as_str() {
            "quit" | "q" => return Ok(InputLine::Quit),
            "clear" => Command::ClearHistory,
            "pause" => Command::PauseMonitoring,
            "resume" => Command::ResumeMonitoring,
            "export json" => Command::Export(ExportFormat::Json),
            "export text" | "export txt" => Command::Export(ExportFormat::Text),
            _ => trimmed.parse::<Key>()?.command(),
        };
        Ok(InputLine::Command(command))
    }
}
