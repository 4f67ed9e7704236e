//! Error types for pgchat.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for pgchat operations.
#[derive(Error, Debug)]
pub enum ChatError {
    /// One or more connection fields are empty; no connection was attempted.
    #[error("Please provide all PostgreSQL connection details (missing: {})", .missing.join(", "))]
    ConfigIncomplete { missing: Vec<&'static str> },

    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// The LLM API credential is absent.
    #[error("{0}")]
    MissingCredential(String),

    /// The query agent could not produce an answer.
    #[error("Agent error: {0}")]
    Agent(String),

    /// Query execution errors (syntax errors, constraint violations, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// LLM API errors (rate limits, auth, timeouts, etc.)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors (invalid config file, bad CLI values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (terminal failures, unexpected states).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Creates an incomplete-config error listing the empty fields.
    pub fn config_incomplete(missing: Vec<&'static str>) -> Self {
        Self::ConfigIncomplete { missing }
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a missing-credential error with the given message.
    pub fn missing_credential(msg: impl Into<String>) -> Self {
        Self::MissingCredential(msg.into())
    }

    /// Creates an agent error with the given message.
    pub fn agent(msg: impl Into<String>) -> Self {
        Self::Agent(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConfigIncomplete { .. } => "Incomplete Configuration",
            Self::Connection(_) => "Connection Error",
            Self::MissingCredential(_) => "Missing Credential",
            Self::Agent(_) => "Agent Error",
            Self::Query(_) => "Query Error",
            Self::Llm(_) => "LLM Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true if the error stops a request before it reaches the agent.
    ///
    /// Halting errors leave the conversation log untouched.
    pub fn halts_request(&self) -> bool {
        matches!(self, Self::ConfigIncomplete { .. } | Self::Connection(_))
    }
}

/// Result type alias using ChatError.
pub type Result<T> = std::result::Result<T, ChatError>;
