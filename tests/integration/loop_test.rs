//! The request loop: orchestrator, session and factory together.

use std::sync::Arc;
use std::time::Duration;

use pgchat::app::{InputResult, Orchestrator};
use pgchat::config::{AgentConfig, ConnectionConfig};
use pgchat::connection::ConnectionFactory;
use pgchat::db::MockConnector;
use pgchat::llm::MockLlmClient;
use pgchat::session::{ChatRole, Session, GREETING};

fn orchestrator(
    connector: &Arc<MockConnector>,
    ttl: Duration,
    connection: ConnectionConfig,
) -> Orchestrator {
    let factory = Arc::new(ConnectionFactory::new(connector.clone(), ttl));
    Orchestrator::new(
        factory,
        Arc::new(MockLlmClient::new()),
        connection,
        AgentConfig::default(),
    )
}

#[tokio::test]
async fn test_filling_in_missing_details_unblocks_questions() {
    let connector = Arc::new(MockConnector::new());
    let mut orchestrator =
        orchestrator(&connector, Duration::from_secs(60), ConnectionConfig::default());
    let mut session = Session::new();

    let result = orchestrator
        .handle_input(&mut session, "How many users?")
        .await
        .unwrap();
    assert!(matches!(result, InputResult::Halted(_)));

    for input in ["/set user app", "/set password secret", "/set db shop"] {
        let result = orchestrator.handle_input(&mut session, input).await.unwrap();
        assert!(matches!(result, InputResult::Notice(_)), "{input}: {result:?}");
    }

    let result = orchestrator
        .handle_input(&mut session, "How many users?")
        .await
        .unwrap();
    assert_eq!(result, InputResult::Replied("count\n3".to_string()));
    assert_eq!(connector.connect_count(), 1);

    // Halted attempts and commands never reach the log.
    let texts: Vec<&str> = session.render().map(|m| m.text()).collect();
    assert_eq!(texts, vec![GREETING, "How many users?", "count\n3"]);
}

#[tokio::test]
async fn test_expired_handle_is_replaced_between_requests() {
    let connector = Arc::new(MockConnector::new());
    let mut orchestrator = orchestrator(
        &connector,
        Duration::ZERO,
        ConnectionConfig::new("localhost", "5432", "app", "secret", "shop"),
    );
    let mut session = Session::new();

    orchestrator
        .handle_input(&mut session, "How many users?")
        .await
        .unwrap();
    let first = connector.last_client().unwrap();

    orchestrator
        .handle_input(&mut session, "How many orders?")
        .await
        .unwrap();
    let second = connector.last_client().unwrap();

    assert_eq!(connector.connect_count(), 2);
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.executed(), vec!["SELECT COUNT(*) FROM orders"]);
}

#[tokio::test]
async fn test_confirmation_survives_other_questions() {
    let connector = Arc::new(MockConnector::new());
    let mut orchestrator = orchestrator(
        &connector,
        Duration::from_secs(60),
        ConnectionConfig::new("localhost", "5432", "app", "secret", "shop"),
    );
    let mut session = Session::new();

    let result = orchestrator
        .handle_input(&mut session, "Delete user 3")
        .await
        .unwrap();
    assert!(matches!(result, InputResult::ConfirmationRequired(_)));

    orchestrator
        .handle_input(&mut session, "/config")
        .await
        .unwrap();
    let result = orchestrator
        .handle_input(&mut session, "How many orders?")
        .await
        .unwrap();
    assert_eq!(result, InputResult::Replied("count\n3".to_string()));
    assert!(session.pending().is_some());

    let result = orchestrator.handle_input(&mut session, "/confirm").await.unwrap();
    assert!(matches!(result, InputResult::Replied(_)));

    let roles: Vec<ChatRole> = session.render().map(|m| m.role()).collect();
    assert_eq!(
        roles,
        vec![
            ChatRole::Assistant,
            ChatRole::User,
            ChatRole::Assistant,
            ChatRole::User,
            ChatRole::Assistant,
            ChatRole::Assistant,
        ]
    );
    assert_eq!(
        connector.last_client().unwrap().executed(),
        vec!["SELECT COUNT(*) FROM orders", "DELETE FROM users WHERE id = 3"]
    );
}

#[tokio::test]
async fn test_changing_database_drops_pending_write() {
    let connector = Arc::new(MockConnector::new());
    let mut orchestrator = orchestrator(
        &connector,
        Duration::from_secs(60),
        ConnectionConfig::new("localhost", "5432", "app", "secret", "shop"),
    );
    let mut session = Session::new();

    let result = orchestrator
        .handle_input(&mut session, "Delete user 3")
        .await
        .unwrap();
    assert!(matches!(result, InputResult::ConfirmationRequired(_)));
    let shop = connector.last_client().unwrap();

    let result = orchestrator
        .handle_input(&mut session, "/set database production")
        .await
        .unwrap();
    assert!(matches!(result, InputResult::Notice(ref m) if m.contains("discarded")));

    let result = orchestrator.handle_input(&mut session, "/confirm").await.unwrap();
    assert_eq!(result, InputResult::Notice("Nothing to confirm.".to_string()));

    // A question against the new database opens a fresh handle that saw no DELETE.
    orchestrator
        .handle_input(&mut session, "How many users?")
        .await
        .unwrap();
    let production = connector.last_client().unwrap();

    assert!(!Arc::ptr_eq(&shop, &production));
    assert!(shop.executed().is_empty());
    assert_eq!(production.executed(), vec!["SELECT COUNT(*) FROM users"]);
}
