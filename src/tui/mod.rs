//! Terminal User Interface for pgchat.
//!
//! Provides the main TUI application loop using ratatui and crossterm.

pub mod app;
mod events;
mod history;
mod ui;
pub mod widgets;
mod worker;

pub use app::App;
pub use events::Event;
pub use worker::{Worker, WorkerUpdate};

use crate::app::Orchestrator;
use crate::error::{ChatError, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use tracing::{info, warn};

/// The main TUI application runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new() -> Result<Self> {
        enable_raw_mode()
            .map_err(|e| ChatError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)
            .map_err(|e| ChatError::internal(format!("Failed to enter alternate screen: {e}")))?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout))
            .map_err(|e| ChatError::internal(format!("Failed to create terminal: {e}")))?;

        Ok(Self { terminal })
    }

    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()
            .map_err(|e| ChatError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)
            .map_err(|e| ChatError::internal(format!("Failed to leave alternate screen: {e}")))?;

        self.terminal
            .show_cursor()
            .map_err(|e| ChatError::internal(format!("Failed to show cursor: {e}")))?;

        Ok(())
    }

    /// Runs the event loop until the user quits.
    pub async fn run(&mut self, orchestrator: Orchestrator) -> Result<()> {
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(panic_info);
        }));

        let mut app_state = App::new(orchestrator.connection().clone());
        let mut worker = Worker::spawn(orchestrator);

        let result = self.event_loop(&mut app_state, &mut worker).await;

        worker.shutdown().await;
        let _ = panic::take_hook();

        result
    }

    async fn event_loop(&mut self, app_state: &mut App, worker: &mut Worker) -> Result<()> {
        loop {
            app_state.clear_expired_notice();

            self.terminal
                .draw(|frame| ui::render(frame, app_state))
                .map_err(|e| ChatError::internal(format!("Failed to draw: {e}")))?;

            if !app_state.running {
                break;
            }

            tokio::select! {
                polled = tokio::task::spawn_blocking(|| events::poll(events::TICK_RATE)) => {
                    let event = polled
                        .map_err(|e| ChatError::internal(format!("Event task failed: {e}")))?
                        .map_err(|e| ChatError::internal(format!("Failed to read event: {e}")))?;

                    if let Event::Key(key) = event {
                        if let Some(input) = app_state.handle_key(key) {
                            if !worker.send(input).await {
                                warn!("Worker stopped; exiting");
                                app_state.running = false;
                            }
                        }
                    }
                }

                Some(update) = worker.recv() => {
                    app_state.apply_update(update);
                }
            }
        }

        info!("Exiting TUI");
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

/// Runs the TUI application.
pub async fn run(orchestrator: Orchestrator) -> Result<()> {
    let mut tui = Tui::new()?;
    tui.run(orchestrator).await
}
