use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clipboard::monitor::{ticker, ClipboardMonitor, TickOutcome};
use crate::clipboard::provider::ClipboardProvider;
use crate::error::{ClipdeckError, Result};
use crate::history::controller::{Command, Response, SelectionController};
use crate::history::session::SessionState;
use crate::shell::{Shell, ShellEvent};
use crate::storage::database::Database;

type Request = (Command, oneshot::Sender<Result<Response>>);

/// Owns the session and runs watcher ticks and user commands one at a time.
pub struct App {
    db: Arc<Database>,
    clipboard: Arc<dyn ClipboardProvider>,
    shell: Arc<dyn Shell>,
    state: SessionState,
    poll_interval: Duration,
}

/// Handle to a spawned event loop.
pub struct AppHandle {
    commands: mpsc::Sender<Request>,
    token: CancellationToken,
    task: JoinHandle<SessionState>,
}

impl App {
    pub fn new(
        db: Arc<Database>,
        clipboard: Arc<dyn ClipboardProvider>,
        shell: Arc<dyn Shell>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let state = SessionState::load(&db)?;
        Ok(Self {
            db,
            clipboard,
            shell,
            state,
            poll_interval,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn handle_tick(&mut self) {
        let monitor = ClipboardMonitor::new(&self.db, self.clipboard.as_ref());
        match monitor.tick(&mut self.state) {
            Ok(TickOutcome::Captured { .. }) => self.publish_view(),
            Ok(_) => {}
            Err(e) => warn!("Clipboard tick failed: {}", e),
        }
    }

    pub fn handle_command(&mut self, command: Command) -> Result<Response> {
        let controller =
            SelectionController::new(&self.db, self.clipboard.as_ref(), self.shell.as_ref());
        let result = controller.apply(&mut self.state, command.clone());
        match &result {
            Ok(_) => self.publish_view(),
            Err(e) => error!("Command {:?} failed: {}", command, e),
        }
        result
    }

    fn publish_view(&self) {
        self.shell
            .notify(ShellEvent::ViewChanged(self.state.snapshot()));
    }

    /// Serve ticks and commands until cancelled or every sender is gone.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Request>,
        token: CancellationToken,
    ) -> SessionState {
        let mut ticker = ticker(self.poll_interval);
        info!(
            "Event loop started ({} entries, polling every {:?})",
            self.state.clipboard_item_count, self.poll_interval
        );
        self.publish_view();

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => self.handle_tick(),
                request = commands.recv() => match request {
                    Some((command, reply)) => {
                        let result = self.handle_command(command);
                        let _ = reply.send(result);
                    }
                    None => break,
                },
            }
        }

        info!("Event loop stopped");
        self.state
    }

    pub fn spawn(self) -> AppHandle {
        let (tx, rx) = mpsc::channel(32);
        let token = CancellationToken::new();
        let task = tokio::spawn(self.run(rx, token.clone()));
        AppHandle {
            commands: tx,
            token,
            task,
        }
    }
}

impl AppHandle {
    /// Queue a command behind any in-flight work and wait for its result.
    pub async fn execute(&self, command: Command) -> Result<Response> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send((command, reply_tx))
            .await
            .map_err(|_| ClipdeckError::Stopped)?;
        reply_rx.await.map_err(|_| ClipdeckError::Stopped)?
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stop the loop and return the final session.
    pub async fn shutdown(self) -> Result<SessionState> {
        self.token.cancel();
        self.task
            .await
            .map_err(|e| ClipdeckError::StoreUnavailable(format!("event loop panicked: {}", e)))
    }
}
