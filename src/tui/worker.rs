//! Background task that owns the orchestrator and the session.
//!
//! The UI sends raw input lines and receives a snapshot of the session after
//! each one, so it can keep drawing (and animating the spinner) while the
//! agent is working.

use crate::app::{InputResult, Orchestrator};
use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::session::{ChatMessage, Session};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Requests from the UI.
#[derive(Debug)]
pub enum WorkerCommand {
    Input(String),
    Shutdown,
}

/// State sent back to the UI after each request.
#[derive(Debug)]
pub struct WorkerUpdate {
    pub result: Result<InputResult>,
    pub messages: Vec<ChatMessage>,
    pub connection: ConnectionConfig,
    pub connected: bool,
    pub pending_write: bool,
}

/// UI-side handle to the worker task.
pub struct Worker {
    commands: mpsc::Sender<WorkerCommand>,
    updates: mpsc::Receiver<WorkerUpdate>,
    task: JoinHandle<()>,
}

impl Worker {
    /// Spawns the worker with a fresh session.
    pub fn spawn(orchestrator: Orchestrator) -> Self {
        let (command_tx, command_rx) = mpsc::channel(8);
        let (update_tx, update_rx) = mpsc::channel(8);
        let task = tokio::spawn(run(orchestrator, Session::new(), command_rx, update_tx));

        Self {
            commands: command_tx,
            updates: update_rx,
            task,
        }
    }

    /// Queues one line of input. Returns false if the worker has stopped.
    pub async fn send(&self, input: String) -> bool {
        self.commands.send(WorkerCommand::Input(input)).await.is_ok()
    }

    /// Waits for the next update.
    pub async fn recv(&mut self) -> Option<WorkerUpdate> {
        self.updates.recv().await
    }

    /// Stops the worker and closes the database handle.
    pub async fn shutdown(self) {
        let _ = self.commands.send(WorkerCommand::Shutdown).await;
        if let Err(e) = self.task.await {
            warn!("Worker task ended abnormally: {}", e);
        }
    }
}

async fn run(
    mut orchestrator: Orchestrator,
    mut session: Session,
    mut commands: mpsc::Receiver<WorkerCommand>,
    updates: mpsc::Sender<WorkerUpdate>,
) {
    while let Some(command) = commands.recv().await {
        match command {
            WorkerCommand::Input(input) => {
                let result = orchestrator.handle_input(&mut session, &input).await;
                let update = WorkerUpdate {
                    result,
                    messages: session.render().cloned().collect(),
                    connection: orchestrator.connection().clone(),
                    connected: orchestrator.is_connected(),
                    pending_write: session.pending().is_some(),
                };
                if updates.send(update).await.is_err() {
                    break;
                }
            }
            WorkerCommand::Shutdown => break,
        }
    }

    debug!("Worker shutting down");
    if let Err(e) = orchestrator.close().await {
        warn!("Error closing database connection: {}", e);
    }
}
