use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::history::export::ExportFormat;

#[derive(Debug, Parser)]
#[command(name = "clipdeck", version, about = "Keyboard-driven clipboard history")]
pub struct Cli {
    /// Directory holding the database and log file.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file (defaults to the platform config dir).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Poll the clipboard and browse history from stdin.
    Watch {
        /// Poll interval in milliseconds.
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Only capture; do not read commands from stdin.
        #[arg(long)]
        headless: bool,
    },
    /// Print one page of history, newest first.
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Print entries starting with QUERY (case-insensitive).
    Search {
        query: String,
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Delete every entry.
    Clear,
    /// Dump the whole history to stdout.
    Export {
        #[arg(long, default_value = "json")]
        format: ExportFormat,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_export_format() {
        let cli = Cli::try_parse_from(["clipdeck", "export", "--format", "text"]).unwrap();
        assert!(matches!(cli.command, CliCommand::Export { format: ExportFormat::Text }));
    }

    #[test]
    fn global_data_dir_after_subcommand() {
        let cli = Cli::try_parse_from(["clipdeck", "list", "--page", "2", "--data-dir", "/tmp/x"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(cli.command, CliCommand::List { page: 2 }));
    }

    #[test]
    fn search_requires_query() {
        assert!(Cli::try_parse_from(["clipdeck", "search"]).is_err());
    }
}
