//! End-to-end agent runs over the mock database.

use std::sync::Arc;

use pgchat::agent::QueryAgent;
use pgchat::config::AgentConfig;
use pgchat::db::MockDatabaseClient;
use pgchat::llm::{MockLlmClient, Role};

fn agent(llm: Arc<MockLlmClient>, db: Arc<MockDatabaseClient>) -> QueryAgent {
    QueryAgent::new(llm, db, AgentConfig::default())
}

#[tokio::test]
async fn test_explores_schema_before_querying() {
    let llm = Arc::new(MockLlmClient::new().with_script([
        "Thought: Which tables are there?\nAction: sql_db_list_tables\nAction Input: ",
        "Thought: Look at orders.\nAction: sql_db_schema\nAction Input: orders",
        "Thought: Check the query.\nAction: sql_db_query_checker\nAction Input: SELECT COUNT(*) FROM orders",
        "Thought: Run it.\nAction: sql_db_query\nAction Input: SELECT COUNT(*) FROM orders",
        "Thought: I now know the final answer.\nFinal Answer: There are 3 orders.",
    ]));
    let db = Arc::new(MockDatabaseClient::new());

    let reply = agent(Arc::clone(&llm), Arc::clone(&db))
        .answer("How many orders are there?")
        .await
        .unwrap();

    assert_eq!(reply.text, "There are 3 orders.");
    assert!(reply.pending.is_none());
    assert_eq!(llm.calls(), 5);

    let observations: Vec<String> = llm
        .last_request()
        .into_iter()
        .filter(|m| m.role == Role::User && m.content.starts_with("Observation:"))
        .map(|m| m.content)
        .collect();
    assert_eq!(observations.len(), 4);
    assert_eq!(observations[0], "Observation: users, orders");
    assert!(observations[1].contains("CREATE TABLE orders"));
    assert_eq!(observations[3], "Observation: count\n3");

    // Sample rows for the schema tool, then the real query.
    assert_eq!(
        db.executed(),
        vec![
            "SELECT * FROM \"orders\" LIMIT 3".to_string(),
            "SELECT COUNT(*) FROM orders".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_query_errors_are_observations() {
    let llm = Arc::new(MockLlmClient::new().with_script([
        "Action: sql_db_query\nAction Input: SELECT * FROM customers",
        "Final Answer: There is no customers table.",
    ]));

    let reply = agent(Arc::clone(&llm), Arc::new(MockDatabaseClient::new()))
        .answer("List customers")
        .await
        .unwrap();

    assert_eq!(reply.text, "There is no customers table.");
    let last = llm.last_request();
    let observation = &last[last.len() - 1].content;
    assert!(observation.starts_with("Observation: Error:"));
    assert!(observation.contains("customers"));
}

#[tokio::test]
async fn test_write_waits_for_confirmation() {
    let llm = Arc::new(MockLlmClient::new());
    let db = Arc::new(MockDatabaseClient::new());
    let agent = agent(llm, Arc::clone(&db));

    let reply = agent.answer("Please delete user 3").await.unwrap();
    let pending = reply.pending.expect("write should be held");

    assert_eq!(pending.sql, "DELETE FROM users WHERE id = 3");
    assert!(reply.text.contains("/confirm"));
    assert!(db.executed().is_empty());

    let done = agent.execute_confirmed(&pending).await.unwrap();
    assert_eq!(done, "Done. The DELETE statement was executed.");
    assert_eq!(db.executed(), vec!["DELETE FROM users WHERE id = 3"]);
}

#[tokio::test]
async fn test_writes_run_directly_when_confirmation_is_off() {
    let db = Arc::new(MockDatabaseClient::new());
    let settings = AgentConfig {
        confirm_writes: false,
        ..AgentConfig::default()
    };
    let agent = QueryAgent::new(Arc::new(MockLlmClient::new()), db.clone(), settings);

    let reply = agent.answer("Update user 1").await.unwrap();

    assert!(reply.pending.is_none());
    assert_eq!(
        db.executed(),
        vec!["UPDATE users SET name = 'Updated Name' WHERE id = 1"]
    );
}
