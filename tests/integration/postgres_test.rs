//! Tests against a live PostgreSQL server.
//!
//! Skipped unless DATABASE_URL is set. Each test works in its own table so
//! runs do not interfere.

use std::sync::Arc;
use std::time::Duration;

use pgchat::config::ConnectionConfig;
use pgchat::connection::ConnectionFactory;
use pgchat::db::{DatabaseClient, PostgresClient, PostgresConnector, Value};
use pgchat::error::ChatError;

fn test_config() -> Option<ConnectionConfig> {
    let url = std::env::var("DATABASE_URL").ok()?;
    ConnectionConfig::from_connection_string(&url).ok()
}

async fn get_test_client() -> Option<PostgresClient> {
    let config = test_config()?;
    PostgresClient::connect(&config).await.ok()
}

#[tokio::test]
async fn test_select_literals() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute_query("SELECT 1 AS one, 'two' AS two, NULL::int AS nothing")
        .await
        .unwrap();

    assert_eq!(result.columns.len(), 3);
    assert_eq!(result.columns[0].name, "one");
    assert_eq!(result.rows[0][0], Value::Int(1));
    assert_eq!(result.rows[0][1], Value::String("two".to_string()));
    assert_eq!(result.rows[0][2], Value::Null);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_introspection_sees_new_table() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    client
        .execute_query("DROP TABLE IF EXISTS pgchat_it_items")
        .await
        .unwrap();
    client
        .execute_query("CREATE TABLE pgchat_it_items (id SERIAL PRIMARY KEY, label TEXT NOT NULL)")
        .await
        .unwrap();

    let schema = client.introspect_schema().await.unwrap();
    let table = schema.find_table("pgchat_it_items").expect("table should be listed");
    assert_eq!(table.primary_key, vec!["id".to_string()]);
    assert!(table.columns.iter().any(|c| c.name == "label" && !c.is_nullable));

    client
        .execute_query("DROP TABLE pgchat_it_items")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_query_error_is_reported() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let err = client
        .execute_query("SELECT * FROM pgchat_no_such_table")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Query(_)));
}

#[tokio::test]
async fn test_unknown_database_is_a_connection_error() {
    let Some(mut config) = test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    config.database = "pgchat_no_such_database".to_string();

    let factory = ConnectionFactory::new(Arc::new(PostgresConnector), Duration::from_secs(60));

    let err = factory.obtain(&config).await.err().unwrap();
    assert!(matches!(err, ChatError::Connection(_)));
}
