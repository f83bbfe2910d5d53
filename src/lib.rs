pub mod app;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod history;
pub mod input;
pub mod logging;
pub mod shell;
pub mod storage;

use std::future::Future;
use std::io::{BufRead, Read};
use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::mpsc;

use crate::app::{App, AppHandle};
use crate::cli::{Cli, CliCommand};
use crate::clipboard::item::Entry;
use crate::clipboard::provider::SystemClipboard;
use crate::config::Config;
use crate::error::Result;
use crate::history::controller::Response;
use crate::history::export::export_history;
use crate::history::paginator::PAGE_SIZE;
use crate::history::session::SessionState;
use crate::input::InputLine;
use crate::shell::{ConsoleShell, LogShell};
use crate::storage::database::Database;

/// Entry point shared by the binary: load config, set up logging and the
/// store, then dispatch the requested subcommand.
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }

    logging::init(&config.data_dir);

    let db = Arc::new(Database::new(&config.data_dir)?);
    db.set_history_limit(config.history_limit)?;

    match cli.command {
        CliCommand::Watch {
            interval_ms,
            headless,
        } => {
            if let Some(ms) = interval_ms.filter(|ms| *ms > 0) {
                config.poll_interval_ms = ms;
            }
            if headless {
                watch_headless(db, &config).await
            } else {
                watch(db, &config).await
            }
        }
        CliCommand::List { page } => {
            let entries = db.page(false, page, PAGE_SIZE)?;
            print_entries(&entries);
            Ok(())
        }
        CliCommand::Search { query, page } => {
            let entries = db.search(&query, page, PAGE_SIZE)?;
            print_entries(&entries);
            Ok(())
        }
        CliCommand::Clear => {
            let removed = db.clear()?;
            info!("Cleared clipboard history ({} entries)", removed);
            Ok(())
        }
        CliCommand::Export { format } => {
            let (payload, _) = export_history(&db, format)?;
            println!("{}", payload);
            Ok(())
        }
    }
}

/// Interactive mode: stdin lines drive the history while the watcher polls.
async fn watch(db: Arc<Database>, config: &Config) -> Result<()> {
    let app = App::new(
        db,
        Arc::new(SystemClipboard::new()),
        Arc::new(ConsoleShell),
        config.poll_interval(),
    )?;
    let handle = app.spawn();
    let mut lines = spawn_line_reader(std::io::stdin())?;

    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // Without a handler the session still ends on "q" or end of input.
            error!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let outcome = drive_input(&handle, &mut lines, interrupted).await;
    handle.shutdown().await?;
    outcome
}

/// Blocking reads happen on their own thread so nothing waits on stdin at
/// shutdown. The thread ends with the input or once the receiver is gone.
fn spawn_line_reader<R>(reader: R) -> Result<mpsc::Receiver<std::io::Result<String>>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in std::io::BufReader::new(reader).lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() || failed {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Forward parsed input lines to the event loop until quit, end of input,
/// cancellation, or `stop` resolves.
async fn drive_input(
    handle: &AppHandle,
    lines: &mut mpsc::Receiver<std::io::Result<String>>,
    stop: impl Future<Output = ()>,
) -> Result<()> {
    tokio::pin!(stop);
    let token = handle.cancellation_token();

    loop {
        let line = tokio::select! {
            _ = token.cancelled() => break,
            _ = &mut stop => break,
            line = lines.recv() => line,
        };

        let Some(line) = line else { break };

        let command = match line?.parse::<InputLine>() {
            Ok(InputLine::Command(command)) => command,
            Ok(InputLine::Quit) => break,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        let result = tokio::select! {
            _ = &mut stop => break,
            result = handle.execute(command) => result,
        };
        match result {
            Ok(Response::Exported(payload)) => println!("{}", payload),
            Ok(Response::Done) => {}
            // Already logged by the event loop; the session is unchanged.
            Err(_) => {}
        }
    }

    Ok(())
}

/// Headless mode: capture clipboard history without reading input.
async fn watch_headless(db: Arc<Database>, config: &Config) -> Result<()> {
    let app = App::new(
        db,
        Arc::new(SystemClipboard::new()),
        Arc::new(LogShell),
        config.poll_interval(),
    )?;
    let state = run_until(app.spawn(), tokio::signal::ctrl_c()).await?;
    info!("Stopped with {} entries", state.clipboard_item_count);
    Ok(())
}

/// Keep the loop running until `signal` fires. A signal that cannot be
/// awaited still stops the loop, then surfaces as the error.
async fn run_until(
    handle: AppHandle,
    signal: impl Future<Output = std::io::Result<()>>,
) -> Result<SessionState> {
    let waited = signal.await;
    let state = handle.shutdown().await?;
    if let Err(e) = waited {
        error!("Cannot listen for Ctrl+C: {}", e);
        return Err(e.into());
    }
    Ok(state)
}

fn print_entries(entries: &[Entry]) {
    for (i, entry) in entries.iter().enumerate() {
        println!("{} {}", i + 1, entry.preview(80));
    }
}
