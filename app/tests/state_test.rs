use prospect_app::{execute, state::AppState, Request};
use prospect_core::AppConfig;
use prospect_scanner::{ResponseStatus, SearchRequest};
use tempfile::TempDir;

#[tokio::test]
async fn test_state_opens_database_when_storage_enabled() {
    let dir = TempDir::new().unwrap();
    let mut config = AppConfig::default();
    config.storage.enabled = true;
    config.storage.database_path = dir.path().join("data").join("records.db");

    let state = AppState::new(config).await.unwrap();

    assert!(state.database.is_some());
    assert!(dir.path().join("data").join("records.db").exists());
    state.shutdown().await;
}

#[tokio::test]
async fn test_invalid_request_never_reaches_browser() {
    let state = AppState::new(AppConfig::default()).await.unwrap();
    assert!(state.database.is_none());

    let response = execute(&state, Request::Search(SearchRequest::default())).await;

    assert_eq!(response.status, ResponseStatus::Error);
    assert_eq!(response.message, "Query is required");
}
