//! Mock database client for testing.
//!
//! Provides an in-memory database with a small users/orders dataset so the
//! agent and the chat loop can run headless without PostgreSQL.

use super::{
    Column, ColumnInfo, Connector, DatabaseClient, ForeignKey, QueryResult, Row, Schema, Table,
    Value,
};
use crate::config::ConnectionConfig;
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Returns the identifier following the first keyword in `keywords`.
fn word_after(sql: &str, keywords: &[&str]) -> Option<String> {
    let mut words = sql.split_whitespace();
    while let Some(word) = words.next() {
        if keywords.iter().any(|k| word.eq_ignore_ascii_case(k)) {
            return words.next().map(|next| {
                next.trim_matches(|c: char| !c.is_alphanumeric() && c != '_')
                    .to_string()
            });
        }
    }
    None
}

/// An in-memory database client that answers simple queries.
///
/// `SELECT ... FROM <table> [LIMIT n]` returns the table's rows,
/// `SELECT COUNT(*) FROM <table>` returns the row count, and any other
/// statement on a known table succeeds with no rows. Every statement is
/// recorded and can be inspected with [`MockDatabaseClient::executed`].
pub struct MockDatabaseClient {
    schema: Schema,
    data: HashMap<String, Vec<Row>>,
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a mock database with sample `users` and `orders` tables.
    pub fn new() -> Self {
        let users = Table::new("users")
            .column(Column::new("id", "integer").nullable(false))
            .column(Column::new("name", "varchar(100)").nullable(false))
            .column(Column::new("email", "varchar(255)").nullable(false))
            .primary_key(&["id"]);
        let orders = Table::new("orders")
            .column(Column::new("id", "integer").nullable(false))
            .column(Column::new("user_id", "integer").nullable(false))
            .column(Column::new("total", "numeric(10,2)").nullable(false))
            .primary_key(&["id"]);

        let schema = Schema {
            tables: vec![users, orders],
            foreign_keys: vec![ForeignKey::new(
                "orders",
                vec!["user_id".to_string()],
                "users",
                vec!["id".to_string()],
            )],
        };

        let user_rows = [
            (1, "Alice", "alice@example.com"),
            (2, "Bob", "bob@example.com"),
            (3, "Carol", "carol@example.com"),
        ]
        .into_iter()
        .map(|(id, name, email)| vec![Value::from(id), Value::from(name), Value::from(email)])
        .collect();

        let order_rows = [(1, 1, 19.99), (2, 1, 5.0), (3, 2, 42.5)]
            .into_iter()
            .map(|(id, user_id, total)| {
                vec![Value::from(id), Value::from(user_id), Value::from(total)]
            })
            .collect();

        let data = HashMap::from([
            ("users".to_string(), user_rows),
            ("orders".to_string(), order_rows),
        ]);

        Self {
            schema,
            data,
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock database with the given schema and no rows.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            data: HashMap::new(),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Returns every statement executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn record(&self, sql: &str) {
        if let Ok(mut log) = self.executed.lock() {
            log.push(sql.to_string());
        }
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.record(sql);

        let table_name = word_after(sql, &["from", "into", "update"]);

        let Some(table_name) = table_name else {
            return Ok(QueryResult::with_data(
                vec![ColumnInfo::new("?column?", "int4")],
                vec![vec![Value::Int(1)]],
            ));
        };

        let table = self.schema.find_table(&table_name).ok_or_else(|| {
            ChatError::query(format!(
                "ERROR: relation \"{}\" does not exist",
                table_name.to_lowercase()
            ))
        })?;

        let is_select = sql.trim_start().to_uppercase().starts_with("SELECT");
        if !is_select {
            return Ok(QueryResult::new());
        }

        let rows = self.data.get(&table.name).cloned().unwrap_or_default();

        if sql.to_uppercase().contains("COUNT(*)") {
            return Ok(QueryResult::with_data(
                vec![ColumnInfo::new("count", "int8")],
                vec![vec![Value::Int(rows.len() as i64)]],
            ));
        }

        let limit = word_after(sql, &["limit"])
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(usize::MAX);

        let columns = table
            .columns
            .iter()
            .map(|c| ColumnInfo::new(&c.name, &c.data_type))
            .collect();

        Ok(QueryResult::with_data(
            columns,
            rows.into_iter().take(limit).collect(),
        )
        .with_execution_time(Duration::from_millis(1)))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Connector that hands out fresh [`MockDatabaseClient`]s and counts calls.
#[derive(Default)]
pub struct MockConnector {
    connects: AtomicUsize,
    failure: Option<String>,
    delay: Option<Duration>,
    last_client: Mutex<Option<Arc<MockDatabaseClient>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every connect attempt fail with a connection error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Sleeps before each connect, so concurrent callers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of connect calls made so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// The client handed out by the most recent successful connect.
    pub fn last_client(&self) -> Option<Arc<MockDatabaseClient>> {
        self.last_client.lock().ok().and_then(|c| c.clone())
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn DatabaseClient>> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.failure {
            return Err(ChatError::connection(format!(
                "Cannot connect to {}:{}. ({message})",
                config.host, config.port
            )));
        }

        let client = Arc::new(MockDatabaseClient::new());
        if let Ok(mut last) = self.last_client.lock() {
            *last = Some(Arc::clone(&client));
        }
        Ok(client)
    }
}
