//! Natural-language query agent.
//!
//! Turns a question into zero or more SQL tool calls and a final answer by
//! running a reasoning loop against the LLM. Data-modifying statements can
//! be held back until the user confirms them.

mod parser;
mod prompt;
mod tools;

pub use parser::{parse_reply, AgentStep, ParseError};
pub use prompt::{PREFIX, STOP_SEQUENCE};
pub use tools::{Tool, ToolOutcome, MAX_RESULT_ROWS};

use crate::config::AgentConfig;
use crate::db::{DatabaseClient, Schema};
use crate::error::{ChatError, Result};
use crate::llm::{LlmClient, Message};
use crate::safety::Classification;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Default row limit suggested to the model for exploratory queries.
const TOP_K: usize = 10;

/// A data-modifying statement waiting for the user's go-ahead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub sql: String,
    pub classification: Classification,
}

impl PendingWrite {
    /// Confirmation statement shown to the user: statement type, safety
    /// level, any warning and the SQL itself.
    pub fn confirmation_message(&self) -> String {
        let mut text = format!(
            "This request will change the database.\n\nStatement: {} ({})",
            self.classification.statement_type, self.classification.level
        );
        if let Some(warning) = &self.classification.warning {
            text.push_str(&format!("\nWarning: {warning}"));
        }
        text.push_str(&format!(
            "\n\n```sql\n{}\n```\n\nType /confirm to run it or /cancel to discard it.",
            self.sql
        ));
        text
    }
}

/// What the agent produced for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub text: String,
    /// Set when the answer is a confirmation request.
    pub pending: Option<PendingWrite>,
}

impl AgentReply {
    fn answer(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pending: None,
        }
    }
}

/// Answers questions about one database using one LLM client.
pub struct QueryAgent {
    llm: Arc<dyn LlmClient>,
    db: Arc<dyn DatabaseClient>,
    settings: AgentConfig,
    schema: OnceCell<Schema>,
}

impl QueryAgent {
    pub fn new(llm: Arc<dyn LlmClient>, db: Arc<dyn DatabaseClient>, settings: AgentConfig) -> Self {
        Self {
            llm,
            db,
            settings,
            schema: OnceCell::new(),
        }
    }

    /// The database handle this agent queries.
    pub fn handle(&self) -> &Arc<dyn DatabaseClient> {
        &self.db
    }

    /// Answers one question.
    ///
    /// Unparseable model replies are retried with a corrective observation.
    /// Fails with `Agent` once the parse retries or the step limit run out.
    pub async fn answer(&self, question: &str) -> Result<AgentReply> {
        info!("Agent answering question ({} chars)", question.len());

        let mut messages = vec![
            Message::system(prompt::system_prompt(Tool::ALL, TOP_K)),
            Message::user(prompt::question(question)),
        ];
        let mut parse_failures = 0;

        for step in 1..=self.settings.max_iterations {
            let reply = self
                .llm
                .complete_with_stop(&messages, &[STOP_SEQUENCE])
                .await?;

            match parse_reply(&reply) {
                Ok(AgentStep::Finish { answer }) => {
                    debug!("Agent finished after {} step(s)", step);
                    return Ok(AgentReply::answer(answer));
                }
                Ok(AgentStep::Action { tool, input }) => {
                    parse_failures = 0;
                    debug!("Step {}: {} <- {:?}", step, tool, input);
                    messages.push(Message::assistant(reply.trim()));

                    match self.run_tool(&tool, &input).await {
                        ToolOutcome::Observation(text) => {
                            messages.push(Message::user(prompt::observation(&text)));
                        }
                        ToolOutcome::HeldForConfirmation {
                            sql,
                            classification,
                        } => {
                            let pending = PendingWrite {
                                sql,
                                classification,
                            };
                            return Ok(AgentReply {
                                text: pending.confirmation_message(),
                                pending: Some(pending),
                            });
                        }
                    }
                }
                Err(e) => {
                    parse_failures += 1;
                    warn!("Unparseable LLM reply ({} in a row): {}", parse_failures, e);

                    if parse_failures > self.settings.max_parse_retries {
                        return Err(ChatError::agent(format!(
                            "Could not parse LLM output: {e}"
                        )));
                    }

                    messages.push(Message::assistant(reply.trim()));
                    messages.push(Message::user(prompt::observation(&format!(
                        "{e}. {}",
                        prompt::FORMAT_REMINDER
                    ))));
                }
            }
        }

        Err(ChatError::agent(format!(
            "Agent stopped after {} steps without a final answer.",
            self.settings.max_iterations
        )))
    }

    /// Executes a statement the user confirmed.
    pub async fn execute_confirmed(&self, pending: &PendingWrite) -> Result<String> {
        info!(
            "Executing confirmed {} statement",
            pending.classification.statement_type
        );
        let result = self.db.execute_query(&pending.sql).await?;

        Ok(if result.columns.is_empty() {
            format!(
                "Done. The {} statement was executed.",
                pending.classification.statement_type
            )
        } else {
            result.render_text(MAX_RESULT_ROWS)
        })
    }

    async fn schema(&self) -> Result<&Schema> {
        self.schema
            .get_or_try_init(|| self.db.introspect_schema())
            .await
    }

    async fn run_tool(&self, name: &str, input: &str) -> ToolOutcome {
        let Some(tool) = Tool::from_name(name) else {
            return ToolOutcome::Observation(Tool::unknown(name));
        };

        let observation = match tool {
            Tool::Query => {
                return tools::run_query(self.db.as_ref(), input, self.settings.confirm_writes)
                    .await
            }
            Tool::QueryChecker => tools::check_query(input),
            Tool::ListTables => match self.schema().await {
                Ok(schema) => tools::list_tables(schema),
                Err(e) => format!("Error: {e}"),
            },
            Tool::Schema => match self.schema().await {
                Ok(schema) => tools::describe_tables(self.db.as_ref(), schema, input).await,
                Err(e) => format!("Error: {e}"),
            },
        };

        ToolOutcome::Observation(observation)
    }
}
