use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spotitags::config::ApiConfig;
use spotitags::error::Error;
use spotitags::token::{CredentialStorage, FileCredentialStorage, MemoryCredentialStorage, TokenStore};
use spotitags::types::Credential;

// Helper function to create a config pointing at the mock server
fn test_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        api_base_url: server.uri(),
        accounts_base_url: server.uri(),
        client_id: "test-client".to_string(),
        redirect_uri: "http://127.0.0.1:3000/callback".to_string(),
        ..ApiConfig::default()
    }
}

fn credential(access: &str, refresh: &str) -> Credential {
    Credential {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        scope: "user-read-currently-playing".to_string(),
        expires_in: 3600,
        obtained_at: 0,
    }
}

fn memory_store(config: ApiConfig) -> TokenStore {
    TokenStore::new(config, Box::new(MemoryCredentialStorage::default()))
}

async fn mock_token_endpoint(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_empty_store_is_unauthenticated() {
    let server = MockServer::start().await;
    let store = memory_store(test_config(&server));

    match store.credential().await.unwrap_err() {
        Error::Unauthenticated => {}
        e => panic!("unexpected error: {e}"),
    }
    match store.access_token().await.unwrap_err() {
        Error::Unauthenticated => {}
        e => panic!("unexpected error: {e}"),
    }
}

#[tokio::test]
async fn test_refresh_without_credential_fails() {
    let server = MockServer::start().await;
    let store = memory_store(test_config(&server));

    match store.refresh().await.unwrap_err() {
        Error::RefreshFailed(_) => {}
        e => panic!("unexpected error: {e}"),
    }
    // no credential means no exchange was even attempted
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_refresh_replaces_and_persists_credential() {
    let server = MockServer::start().await;
    mock_token_endpoint(
        &server,
        json!({
            "access_token": "renewed_token",
            "refresh_token": "refresh_2",
            "scope": "user-read-currently-playing",
            "expires_in": 3600
        }),
    )
    .await;

    let store = memory_store(test_config(&server));
    store.set_credential(credential("stale_token", "refresh_1")).await.unwrap();

    let renewed = store.refresh().await.unwrap();
    assert_eq!(renewed.access_token, "renewed_token");
    assert_eq!(renewed.refresh_token, "refresh_2");

    let stored = store.credential().await.unwrap();
    assert_eq!(stored.access_token, "renewed_token");
    assert_eq!(stored.refresh_token, "refresh_2");
    assert!(stored.obtained_at > 0);
}

#[tokio::test]
async fn test_refresh_keeps_old_refresh_token_when_response_omits_it() {
    let server = MockServer::start().await;
    mock_token_endpoint(
        &server,
        json!({"access_token": "renewed_token", "expires_in": 3600}),
    )
    .await;

    let store = memory_store(test_config(&server));
    store.set_credential(credential("stale_token", "refresh_1")).await.unwrap();

    let renewed = store.refresh().await.unwrap();
    assert_eq!(renewed.access_token, "renewed_token");
    assert_eq!(renewed.refresh_token, "refresh_1");
}

#[tokio::test]
async fn test_rejected_refresh_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh token revoked"
        })))
        .mount(&server)
        .await;

    let store = memory_store(test_config(&server));
    store.set_credential(credential("stale_token", "refresh_1")).await.unwrap();

    match store.refresh().await.unwrap_err() {
        Error::RefreshFailed(_) => {}
        e => panic!("unexpected error: {e}"),
    }
}

#[tokio::test]
async fn test_concurrent_stale_observations_refresh_once() {
    let server = MockServer::start().await;
    mock_token_endpoint(
        &server,
        json!({
            "access_token": "renewed_token",
            "refresh_token": "refresh_2",
            "expires_in": 3600
        }),
    )
    .await;

    let store = memory_store(test_config(&server));
    store.set_credential(credential("stale_token", "refresh_1")).await.unwrap();

    // both callers saw the same stale token; only one exchange may happen
    let (first, second) = tokio::join!(
        store.refresh_if_stale("stale_token"),
        store.refresh_if_stale("stale_token"),
    );
    assert_eq!(first.unwrap().access_token, "renewed_token");
    assert_eq!(second.unwrap().access_token, "renewed_token");
}

#[tokio::test]
async fn test_refresh_if_stale_skips_exchange_for_outdated_observation() {
    let server = MockServer::start().await;
    let store = memory_store(test_config(&server));
    store.set_credential(credential("current_token", "refresh_1")).await.unwrap();

    // the caller's token is older than the stored one, so no exchange happens
    let current = store.refresh_if_stale("previous_token").await.unwrap();
    assert_eq!(current.access_token, "current_token");
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_file_storage_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileCredentialStorage::with_path(dir.path().join("credential.json"));

    assert!(storage.load().await.unwrap().is_none());

    storage.store(&credential("valid_token", "refresh_1")).await.unwrap();
    let loaded = storage.load().await.unwrap().unwrap();
    assert_eq!(loaded.access_token, "valid_token");
    assert_eq!(loaded.refresh_token, "refresh_1");

    storage.clear().await.unwrap();
    assert!(storage.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_file_storage_clear_tolerates_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileCredentialStorage::with_path(dir.path().join("credential.json"));

    assert!(storage.clear().await.is_ok());
}

#[tokio::test]
async fn test_clearing_the_store_forgets_the_credential() {
    let server = MockServer::start().await;
    let store = memory_store(test_config(&server));
    store.set_credential(credential("valid_token", "refresh_1")).await.unwrap();

    store.clear().await.unwrap();
    match store.credential().await.unwrap_err() {
        Error::Unauthenticated => {}
        e => panic!("unexpected error: {e}"),
    }
}

#[test]
fn test_credential_expiry_hint() {
    let now = chrono::Utc::now().timestamp() as u64;

    let fresh = Credential {
        access_token: "valid_token".to_string(),
        refresh_token: "refresh_1".to_string(),
        scope: String::new(),
        expires_in: 3600,
        obtained_at: now,
    };
    assert!(!fresh.is_expired());

    // within the 240 second early-renewal margin
    let expiring = Credential { expires_in: 120, ..fresh };
    assert!(expiring.is_expired());
}
