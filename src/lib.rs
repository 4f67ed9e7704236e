//! pgchat: chat with a PostgreSQL database in natural language.
//!
//! An LLM-driven agent turns questions into SQL, runs it through a cached
//! connection and answers in plain text. The binary wraps this in a terminal
//! UI and a headless runner.

pub mod agent;
pub mod app;
pub mod cli;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod headless;
pub mod llm;
pub mod logging;
pub mod safety;
pub mod session;
pub mod tui;
