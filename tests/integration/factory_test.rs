//! Connection factory behavior across tasks and configs.

use std::sync::Arc;
use std::time::Duration;

use pgchat::config::ConnectionConfig;
use pgchat::connection::ConnectionFactory;
use pgchat::db::MockConnector;
use pgchat::error::ChatError;

fn config() -> ConnectionConfig {
    ConnectionConfig::new("localhost", "5432", "app", "secret", "shop")
}

#[tokio::test]
async fn test_concurrent_first_use_connects_once() {
    let connector = Arc::new(MockConnector::new().with_delay(Duration::from_millis(50)));
    let factory = Arc::new(ConnectionFactory::new(
        connector.clone(),
        Duration::from_secs(60),
    ));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let factory = Arc::clone(&factory);
            tokio::spawn(async move { factory.obtain(&config()).await })
        })
        .collect();

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap().unwrap());
    }

    assert_eq!(connector.connect_count(), 1);
    assert!(handles.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[tokio::test]
async fn test_each_config_gets_its_own_handle() {
    let connector = Arc::new(MockConnector::new());
    let factory = ConnectionFactory::new(connector.clone(), Duration::from_secs(60));

    let mut other = config();
    other.database = "analytics".to_string();

    let a = factory.obtain(&config()).await.unwrap();
    let b = factory.obtain(&other).await.unwrap();
    let a_again = factory.obtain(&config()).await.unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &a_again));
    assert_eq!(connector.connect_count(), 2);
}

#[tokio::test]
async fn test_invalidate_only_drops_one_entry() {
    let connector = Arc::new(MockConnector::new());
    let factory = ConnectionFactory::new(connector.clone(), Duration::from_secs(60));

    let mut other = config();
    other.user = "reporting".to_string();

    factory.obtain(&config()).await.unwrap();
    let kept = factory.obtain(&other).await.unwrap();

    factory.invalidate(&config()).await;

    factory.obtain(&config()).await.unwrap();
    let still = factory.obtain(&other).await.unwrap();

    assert!(Arc::ptr_eq(&kept, &still));
    assert_eq!(connector.connect_count(), 3);
}

#[tokio::test]
async fn test_missing_fields_are_listed_in_order() {
    let factory = ConnectionFactory::new(Arc::new(MockConnector::new()), Duration::from_secs(60));

    let err = factory
        .obtain(&ConnectionConfig::default())
        .await
        .err()
        .unwrap();

    match err {
        ChatError::ConfigIncomplete { missing } => {
            assert_eq!(missing, vec!["user", "password", "database"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_special_characters_survive_the_uri() {
    let original = ConnectionConfig::new("db.internal", "6543", "app@corp", "p@ss:w/rd#1", "my db");

    let uri = original.connection_uri().unwrap();
    assert!(!uri.contains("p@ss"));

    let parsed = ConnectionConfig::from_connection_string(&uri).unwrap();
    assert_eq!(parsed, original);
}
