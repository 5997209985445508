mod common;

use absconditus::{VaultError, VaultState, VaultStatus};
use common::{session_for, FakeVault, MASTER_PASSWORD};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zeroize::Zeroizing;

fn master() -> Zeroizing<String> {
    Zeroizing::new(MASTER_PASSWORD.to_string())
}

#[tokio::test]
async fn request_token_fails_before_unlock() {
    let (server, _vault) = FakeVault::start().await;
    let mut session = session_for(&server);

    let err = session.request_token().await.unwrap_err();

    assert!(matches!(err, VaultError::Locked));
    assert_eq!(session.state(), VaultState::Locked);
    assert!(session.token().is_none());
}

#[tokio::test]
async fn unlock_then_request_token() {
    let (server, _vault) = FakeVault::start().await;
    let mut session = session_for(&server);

    session.unlock(master()).await.unwrap();
    // Unlock alone does not hand out a credential.
    assert!(session.token().is_none());

    let token = session.request_token().await.unwrap();
    assert!(!token.as_str().is_empty());
    assert_eq!(session.state(), VaultState::Unlocked);
}

#[tokio::test]
async fn wrong_master_password_stays_locked() {
    let (server, _vault) = FakeVault::start().await;
    let mut session = session_for(&server);

    let err = session
        .unlock(Zeroizing::new("hunter2".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, VaultError::InvalidPassword));
    assert_eq!(session.state(), VaultState::Locked);
    assert!(matches!(
        session.request_token().await,
        Err(VaultError::Locked)
    ));
}

#[tokio::test]
async fn empty_master_password_is_not_sent() {
    let (server, _vault) = FakeVault::start().await;
    let mut session = session_for(&server);

    let err = session.unlock(Zeroizing::new(String::new())).await.unwrap_err();

    assert!(matches!(err, VaultError::InvalidInput(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn save_then_list_end_to_end() {
    let (server, vault) = FakeVault::start().await;
    let mut session = session_for(&server);

    session.unlock_and_connect(master()).await.unwrap();
    session.save_password("github", "Xy9!aB2c").await.unwrap();
    let entries = session.list_passwords().await.unwrap();

    assert_eq!(entries.get("github").map(String::as_str), Some("Xy9!aB2c"));
    assert_eq!(vault.stored().len(), 1);
}

#[tokio::test]
async fn empty_name_is_rejected_without_network_call() {
    let (server, vault) = FakeVault::start().await;
    let vault = vault.unlocked();
    let mut session = session_for(&server);
    session.request_token().await.unwrap();
    let before = server.received_requests().await.unwrap().len();

    let err = session.save_password("", "Xy9!aB2c").await.unwrap_err();

    assert!(matches!(err, VaultError::InvalidInput(_)));
    assert_eq!(server.received_requests().await.unwrap().len(), before);
    assert_eq!(session.state(), VaultState::Unlocked);
    assert!(vault.stored().is_empty());
}

#[tokio::test]
async fn stale_token_after_server_lock() {
    let (server, vault) = FakeVault::start().await;
    let vault = vault.unlocked();
    vault.insert("mail", "secret");
    let mut session = session_for(&server);
    session.request_token().await.unwrap();

    vault.lock();

    let err = session.list_passwords().await.unwrap_err();
    assert!(matches!(err, VaultError::AuthRejected));
    assert_eq!(session.state(), VaultState::Locked);
    assert!(session.token().is_none());

    // The token is gone, so the next save fails client-side.
    assert!(matches!(
        session.save_password("github", "pw").await,
        Err(VaultError::AuthRejected)
    ));
}

#[tokio::test]
async fn status_reflects_server_lock() {
    let (server, vault) = FakeVault::start().await;
    let vault = vault.unlocked();
    let mut session = session_for(&server);
    session.request_token().await.unwrap();

    assert_eq!(session.status().await.unwrap(), VaultStatus::Unlocked);
    assert_eq!(session.state(), VaultState::Unlocked);

    vault.lock();
    assert_eq!(session.status().await.unwrap(), VaultStatus::Locked);
    assert_eq!(session.state(), VaultState::Locked);
    assert!(session.token().is_none());
}

#[tokio::test]
async fn relock_and_unlock_issues_new_token() {
    let (server, vault) = FakeVault::start().await;
    let vault = vault.unlocked();
    let mut session = session_for(&server);
    let first = session.request_token().await.unwrap().clone();

    vault.lock();
    assert!(session.list_passwords().await.is_err());

    let second = session.unlock_and_connect(master()).await.unwrap().clone();
    assert_ne!(first, second);
    assert!(session.list_passwords().await.unwrap().is_empty());
}

#[tokio::test]
async fn forget_drops_token() {
    let (server, vault) = FakeVault::start().await;
    let _vault = vault.unlocked();
    let mut session = session_for(&server);
    session.request_token().await.unwrap();

    session.forget();

    assert_eq!(session.state(), VaultState::Unknown);
    assert!(matches!(
        session.list_passwords().await,
        Err(VaultError::AuthRejected)
    ));
}

#[tokio::test]
async fn undecodable_token_reply_leaves_session_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/request-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t1"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/request-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tok": 1})))
        .mount(&server)
        .await;
    let mut session = session_for(&server);
    session.request_token().await.unwrap();

    assert!(matches!(
        session.request_token().await,
        Err(VaultError::MalformedResponse(_))
    ));
    assert_eq!(session.state(), VaultState::Unreachable);

    // No token is left to send, so nothing reaches the server.
    let before = server.received_requests().await.unwrap().len();
    assert!(matches!(
        session.list_passwords().await,
        Err(VaultError::AuthRejected)
    ));
    assert_eq!(server.received_requests().await.unwrap().len(), before);
}

#[tokio::test]
async fn unlock_server_error_leaves_session_locked() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/unlock"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "Failed to unlock"})))
        .mount(&server)
        .await;
    let mut session = session_for(&server);
    assert_eq!(session.state(), VaultState::Unknown);

    let err = session.unlock(master()).await.unwrap_err();

    match err {
        VaultError::ServerRejected(message) => assert_eq!(message, "Failed to unlock"),
        other => panic!("expected ServerRejected, got {other:?}"),
    }
    assert_eq!(session.state(), VaultState::Locked);
    assert!(session.token().is_none());
}
