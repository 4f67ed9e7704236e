//! Core orchestrator for pgchat.
//!
//! Reads one user message at a time, obtains a database handle through the
//! connection factory, drives the query agent and records the exchange in
//! the session log.

use std::sync::Arc;

use tracing::{info, warn};

use crate::agent::QueryAgent;
use crate::config::{AgentConfig, ConnectionConfig};
use crate::connection::ConnectionFactory;
use crate::error::Result;
use crate::llm::LlmClient;
use crate::session::{ChatMessage, Session};

/// Help text displayed for the /help command.
const HELP_TEXT: &str = r#"Ask a question about your database in plain English.

Commands:
  /set <field> <value> - Set host, port, user, password or database
  /config              - Show the connection settings (password masked)
  /refresh             - Refresh the database connection
  /clear               - Clear message history
  /confirm             - Run the statement waiting for confirmation
  /cancel              - Discard the statement waiting for confirmation
  /help                - Show this help message
  /quit, /exit         - Exit the application

Keyboard shortcuts:
  Ctrl+C, Ctrl+Q  - Exit application
  Enter           - Submit input
  Esc             - Clear input
  ↑/↓             - Input history
  Page Up/Down    - Scroll the conversation"#;

/// Result of processing user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResult {
    /// Nothing happened (empty input).
    None,
    /// The assistant answered; the reply was appended to the session.
    Replied(String),
    /// The assistant proposed a data-modifying statement. The confirmation
    /// request was appended and the statement is pending in the session.
    ConfirmationRequired(String),
    /// Informational output from a command. Not part of the log.
    Notice(String),
    /// The agent or LLM failed. The user's message stays in the log.
    Failed(String),
    /// The request stopped before reaching the agent; nothing was logged.
    Halted(String),
    /// Application should exit.
    Exit,
}

/// Byte offset of the value in `/set password <value>`, if `input` is one.
fn secret_value_start(input: &str) -> Option<usize> {
    let command = input.trim_start();
    if !command.get(..4)?.eq_ignore_ascii_case("/set") {
        return None;
    }
    let rest = &command[4..];
    let field = rest.trim_start();
    if field.len() == rest.len() || !field.get(..8)?.eq_ignore_ascii_case("password") {
        return None;
    }
    let tail = &field[8..];
    if !tail.starts_with(char::is_whitespace) {
        return None;
    }
    Some(input.len() - tail.trim_start().len())
}

/// Replaces the value of `/set password <value>` with a fixed mask.
///
/// Use before an input line is logged, recorded or kept for recall.
pub fn redact_input(input: &str) -> String {
    match secret_value_start(input) {
        Some(start) if !input[start..].trim().is_empty() => {
            format!("{}********", &input[..start])
        }
        _ => input.to_string(),
    }
}

/// Masks a password being typed character by character, keeping the length
/// so the cursor position still lines up.
pub fn mask_secret(input: &str) -> String {
    match secret_value_start(input) {
        Some(start) => {
            let masked: String = input[start..].chars().map(|_| '*').collect();
            format!("{}{masked}", &input[..start])
        }
        None => input.to_string(),
    }
}

/// The main orchestrator that coordinates all components.
pub struct Orchestrator {
    factory: Arc<ConnectionFactory>,
    llm: Arc<dyn LlmClient>,
    settings: AgentConfig,
    connection: ConnectionConfig,
    /// Built on first use, dropped on refresh or any connection change.
    agent: Option<Arc<QueryAgent>>,
}

impl Orchestrator {
    pub fn new(
        factory: Arc<ConnectionFactory>,
        llm: Arc<dyn LlmClient>,
        connection: ConnectionConfig,
        settings: AgentConfig,
    ) -> Self {
        Self {
            factory,
            llm,
            settings,
            connection,
            agent: None,
        }
    }

    /// Current connection settings.
    pub fn connection(&self) -> &ConnectionConfig {
        &self.connection
    }

    /// Whether an agent is currently built.
    pub fn is_connected(&self) -> bool {
        self.agent.is_some()
    }

    /// Handles user input and returns the result.
    pub async fn handle_input(&mut self, session: &mut Session, input: &str) -> Result<InputResult> {
        let input = input.trim();

        if input.is_empty() {
            return Ok(InputResult::None);
        }

        if input.starts_with('/') {
            return self.handle_command(session, input).await;
        }

        self.handle_question(session, input).await
    }

    /// Handles a command (input starting with /).
    async fn handle_command(&mut self, session: &mut Session, input: &str) -> Result<InputResult> {
        let parts: Vec<&str> = input.splitn(2, char::is_whitespace).collect();
        let command = parts[0].to_lowercase();
        let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

        match command.as_str() {
            "/clear" => {
                session.reset();
                Ok(InputResult::Notice("Message history cleared.".to_string()))
            }
            "/refresh" => self.handle_refresh().await,
            "/set" => Ok(self.handle_set(session, args)),
            "/config" => Ok(InputResult::Notice(self.connection.masked_summary())),
            "/confirm" => self.handle_confirm(session).await,
            "/cancel" => Ok(match session.take_pending() {
                Some(pending) => {
                    info!("Discarded pending {} statement", pending.classification.statement_type);
                    InputResult::Notice("Statement discarded. The database was not changed.".to_string())
                }
                None => InputResult::Notice("Nothing to cancel.".to_string()),
            }),
            "/help" => Ok(InputResult::Notice(HELP_TEXT.to_string())),
            "/quit" | "/exit" => Ok(InputResult::Exit),
            _ => Ok(InputResult::Notice(format!(
                "Unknown command: {command}. Type /help for available commands."
            ))),
        }
    }

    /// Sends a question to the agent.
    async fn handle_question(&mut self, session: &mut Session, question: &str) -> Result<InputResult> {
        let agent = match self.agent().await {
            Ok(agent) => agent,
            Err(e) if e.halts_request() => return Ok(InputResult::Halted(e.to_string())),
            Err(e) => return Err(e),
        };

        session.append(ChatMessage::user(question));

        match agent.answer(question).await {
            Ok(reply) => {
                session.append(ChatMessage::assistant(reply.text.clone()));
                let gated = reply.pending.is_some();
                if gated {
                    session.set_pending(reply.pending);
                }

                Ok(if gated {
                    InputResult::ConfirmationRequired(reply.text)
                } else {
                    InputResult::Replied(reply.text)
                })
            }
            Err(e) => {
                warn!("Question failed: {}", e);
                Ok(InputResult::Failed(e.to_string()))
            }
        }
    }

    async fn handle_confirm(&mut self, session: &mut Session) -> Result<InputResult> {
        let Some(pending) = session.take_pending() else {
            return Ok(InputResult::Notice("Nothing to confirm.".to_string()));
        };

        let agent = match self.agent().await {
            Ok(agent) => agent,
            Err(e) if e.halts_request() => {
                // Keep the statement so the user can retry after fixing the connection.
                session.set_pending(Some(pending));
                return Ok(InputResult::Halted(e.to_string()));
            }
            Err(e) => return Err(e),
        };

        match agent.execute_confirmed(&pending).await {
            Ok(text) => {
                session.append(ChatMessage::assistant(text.clone()));
                Ok(InputResult::Replied(text))
            }
            Err(e) => {
                warn!("Confirmed statement failed: {}", e);
                Ok(InputResult::Failed(e.to_string()))
            }
        }
    }

    async fn handle_refresh(&mut self) -> Result<InputResult> {
        self.factory.invalidate_all().await;
        self.agent = None;

        match self.agent().await {
            Ok(_) => Ok(InputResult::Notice("Database connection refreshed.".to_string())),
            Err(e) if e.halts_request() => Ok(InputResult::Halted(e.to_string())),
            Err(e) => Err(e),
        }
    }

    fn handle_set(&mut self, session: &mut Session, args: &str) -> InputResult {
        let mut parts = args.splitn(2, char::is_whitespace);
        let field = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default().trim();

        if field.is_empty() {
            return InputResult::Notice("Usage: /set <host|port|user|password|database> <value>".to_string());
        }

        let previous = self.connection.clone();
        if let Err(e) = self.connection.set_field(field, value) {
            return InputResult::Notice(e.to_string());
        }
        self.agent = None;

        // A pending write was reviewed against the old connection only.
        let discarded = if self.connection != previous {
            session.take_pending()
        } else {
            None
        };

        let shown = if field.eq_ignore_ascii_case("password") {
            "********"
        } else {
            value
        };
        let mut notice = format!("{} set to {shown}.", field.to_lowercase());
        if let Some(pending) = discarded {
            info!(
                "Discarded pending {} statement after connection change",
                pending.classification.statement_type
            );
            notice.push_str(&format!(
                " The pending {} statement was discarded because the connection changed.",
                pending.classification.statement_type
            ));
        }
        InputResult::Notice(notice)
    }

    /// Returns the agent for the current connection, building it when
    /// missing or when the factory hands out a different handle.
    async fn agent(&mut self) -> Result<Arc<QueryAgent>> {
        let handle = self.factory.obtain(&self.connection).await?;

        if let Some(agent) = &self.agent {
            if Arc::ptr_eq(agent.handle(), &handle) {
                return Ok(Arc::clone(agent));
            }
        }

        info!("Building query agent for {}", self.connection.display_string());
        let agent = Arc::new(QueryAgent::new(
            Arc::clone(&self.llm),
            handle,
            self.settings.clone(),
        ));
        self.agent = Some(Arc::clone(&agent));
        Ok(agent)
    }

    /// Closes the database handle, if any.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(agent) = self.agent.take() {
            agent.handle().close().await?;
        }
        self.factory.invalidate_all().await;
        Ok(())
    }
}
