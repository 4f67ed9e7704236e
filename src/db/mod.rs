//! Database abstraction layer for pgchat.
//!
//! Provides a trait-based interface for database operations so the
//! PostgreSQL client and the in-memory mock can be used interchangeably.

mod mock;
mod postgres;
mod schema;
mod types;

pub use mock::{MockConnector, MockDatabaseClient};
pub use postgres::{PostgresClient, PostgresConnector};
pub use schema::{Column, ForeignKey, Schema, Table};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with ChatError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Introspects the database schema, returning table and relationship information.
    async fn introspect_schema(&self) -> Result<Schema>;

    /// Executes a SQL query and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

/// Opens database handles for a connection config.
///
/// The connection factory calls this at most once per cache miss.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn DatabaseClient>>;
}
