//! PostgreSQL database client implementation.
//!
//! Provides `PostgresClient`, which implements `DatabaseClient` on top of an
//! sqlx connection pool, and `PostgresConnector`, which opens such pools.

use crate::config::ConnectionConfig;
use crate::db::{
    Column, ColumnInfo, Connector, DatabaseClient, ForeignKey, QueryResult, Row, Schema, Table,
    Value,
};
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Maximum rows kept from a single query.
const MAX_ROWS: usize = 1000;

/// How long to wait for the first connection.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL database client backed by a connection pool.
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Wraps an existing connection pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool for the given config.
    ///
    /// Failures are reported once; reconnecting is left to the user.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let uri = config.connection_uri()?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .connect(&uri)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        info!("Connected to {}", config.display_string());
        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        let tables = self.fetch_tables().await?;
        let foreign_keys = self.fetch_foreign_keys().await?;

        Ok(Schema {
            tables,
            foreign_keys,
        })
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let result = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            sqlx::query(sql).fetch_all(&self.pool),
        )
        .await
        .map_err(|_| {
            ChatError::query(format!("Query timed out after {QUERY_TIMEOUT_SECS} seconds"))
        })?
        .map_err(|e| ChatError::query(format_query_error(e)))?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = result
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        let total_rows = result.len();
        if total_rows > MAX_ROWS {
            warn!("Query returned {} rows, keeping {}", total_rows, MAX_ROWS);
        }

        let rows: Vec<Row> = result.iter().take(MAX_ROWS).map(convert_row).collect();

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            total_rows: Some(total_rows),
        })
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Every column of every base table in `public`, with its primary key position.
const COLUMNS_SQL: &str = r#"
    SELECT
        c.table_name::text,
        c.column_name::text,
        c.data_type::text,
        c.is_nullable = 'YES',
        c.column_default::text,
        pk.position
    FROM information_schema.columns c
    JOIN information_schema.tables t
        ON t.table_schema = c.table_schema AND t.table_name = c.table_name
    LEFT JOIN (
        SELECT kcu.table_name, kcu.column_name, kcu.ordinal_position::int AS position
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON kcu.constraint_name = tc.constraint_name
            AND kcu.table_schema = tc.table_schema
        WHERE tc.table_schema = 'public' AND tc.constraint_type = 'PRIMARY KEY'
    ) pk ON pk.table_name = c.table_name AND pk.column_name = c.column_name
    WHERE c.table_schema = 'public' AND t.table_type = 'BASE TABLE'
    ORDER BY c.table_name, c.ordinal_position
"#;

/// Foreign key column pairs in `public`, in key order.
const FOREIGN_KEYS_SQL: &str = r#"
    SELECT
        con.conname::text,
        src.relname::text,
        sa.attname::text,
        dst.relname::text,
        da.attname::text
    FROM pg_constraint con
    JOIN pg_class src ON src.oid = con.conrelid
    JOIN pg_class dst ON dst.oid = con.confrelid
    JOIN pg_namespace ns ON ns.oid = src.relnamespace
    CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(src_att, dst_att, pos)
    JOIN pg_attribute sa ON sa.attrelid = con.conrelid AND sa.attnum = k.src_att
    JOIN pg_attribute da ON da.attrelid = con.confrelid AND da.attnum = k.dst_att
    WHERE con.contype = 'f' AND ns.nspname = 'public'
    ORDER BY src.relname, con.conname, k.pos
"#;

type ColumnRow = (String, String, String, bool, Option<String>, Option<i32>);
type ForeignKeyRow = (String, String, String, String, String);

impl PostgresClient {
    async fn fetch_tables(&self) -> Result<Vec<Table>> {
        let rows: Vec<ColumnRow> = sqlx::query_as(COLUMNS_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ChatError::query(format!("Failed to fetch columns: {e}")))?;

        Ok(group_columns(rows))
    }

    async fn fetch_foreign_keys(&self) -> Result<Vec<ForeignKey>> {
        let rows: Vec<ForeignKeyRow> = sqlx::query_as(FOREIGN_KEYS_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ChatError::query(format!("Failed to fetch foreign keys: {e}")))?;

        Ok(group_foreign_keys(rows))
    }
}

/// Folds column rows (sorted by table) into tables.
fn group_columns(rows: Vec<ColumnRow>) -> Vec<Table> {
    let mut tables: Vec<Table> = Vec::new();
    let mut key_positions: Vec<(i32, String)> = Vec::new();

    for (table, name, data_type, is_nullable, default, pk_position) in rows {
        if tables.last().map_or(true, |t| t.name != table) {
            finish_primary_key(tables.last_mut(), &mut key_positions);
            tables.push(Table::new(table));
        }
        if let Some(position) = pk_position {
            key_positions.push((position, name.clone()));
        }
        if let Some(current) = tables.last_mut() {
            current.columns.push(Column {
                name,
                data_type,
                is_nullable,
                default,
            });
        }
    }
    finish_primary_key(tables.last_mut(), &mut key_positions);

    tables
}

fn finish_primary_key(table: Option<&mut Table>, positions: &mut Vec<(i32, String)>) {
    positions.sort();
    if let Some(table) = table {
        table.primary_key = positions.drain(..).map(|(_, name)| name).collect();
    }
    positions.clear();
}

/// Folds column pairs (sorted by constraint) into one key per constraint.
fn group_foreign_keys(rows: Vec<ForeignKeyRow>) -> Vec<ForeignKey> {
    let mut keys: Vec<(String, ForeignKey)> = Vec::new();

    for (constraint, from_table, from_column, to_table, to_column) in rows {
        match keys.last_mut() {
            Some((name, fk)) if *name == constraint && fk.from_table == from_table => {
                fk.from_columns.push(from_column);
                fk.to_columns.push(to_column);
            }
            _ => keys.push((
                constraint,
                ForeignKey::new(from_table, vec![from_column], to_table, vec![to_column]),
            )),
        }
    }

    keys.into_iter().map(|(_, fk)| fk).collect()
}

/// Opens pooled PostgreSQL handles.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresConnector;

#[async_trait]
impl Connector for PostgresConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn DatabaseClient>> {
        let client = PostgresClient::connect(config).await?;
        Ok(Arc::new(client))
    }
}

fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Decodes one column by its Postgres type name, falling back to text.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .into(),
        "INT2" | "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),
        "INT4" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .into(),
        "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .into(),
        "FLOAT4" | "REAL" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),
        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .into(),
        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .into(),
    }
}

/// Maps sqlx connection errors to friendly messages that keep the detail.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> ChatError {
    let detail = error.to_string();
    let lower = detail.to_lowercase();
    let (host, port) = (&config.host, &config.port);

    let summary = if lower.contains("connection refused") || lower.contains("could not connect") {
        format!("Cannot connect to {host}:{port}. Check that the server is running.")
    } else if lower.contains("authentication failed") {
        format!(
            "Authentication failed for user '{}'. Check your credentials.",
            config.user
        )
    } else if lower.contains("does not exist") && lower.contains("database") {
        format!("Database '{}' does not exist.", config.database)
    } else if lower.contains("timed out") || lower.contains("timeout") {
        format!("Connection to {host}:{port} timed out.")
    } else if lower.contains("failed to lookup address") || lower.contains("name or service") {
        format!("Unknown host '{host}'.")
    } else {
        return ChatError::connection(detail);
    };

    ChatError::connection(format!("{summary} ({detail})"))
}

/// Formats a query error with the Postgres detail and hint when present.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = format!("ERROR: {}", db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }
        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }
    }

    result
}
