use base64ct::{Base64UrlUnpadded, Encoding};
use calcgate::{
    api::{router, AuthConfig, AuthState, MemoryUserStore},
    client::{
        codec, ApiRequest, Client, ClientConfig, ClientError, RecordingNavigator, Session,
        SessionStore, StorageScope, Stored, LOGIN_ENTRY_POINT,
    },
};
use secrecy::SecretString;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;

const PASSWORD: &str = "securepass123";

async fn spawn_server(token_ttl_seconds: i64) -> String {
    let config = AuthConfig::new(SecretString::from("integration-secret".to_string()))
        .with_token_ttl_seconds(token_ttl_seconds)
        .with_argon2_params(8, 1, 1);
    let state = AuthState::new(config, Arc::new(MemoryUserStore::new())).unwrap();
    let app = router(Arc::new(state)).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: &str) -> (Client, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::new());
    let client = Client::new(
        ClientConfig::new(base_url),
        Arc::new(SessionStore::in_memory()),
        navigator.clone(),
    )
    .unwrap();
    (client, navigator)
}

fn forged_token(sub: &str) -> String {
    let header = Base64UrlUnpadded::encode_string(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = json!({"sub": sub, "exp": codec::now_unix_seconds() + 3600});
    let payload = Base64UrlUnpadded::encode_string(claims.to_string().as_bytes());
    format!("{header}.{payload}.forged")
}

#[tokio::test]
async fn register_issues_a_half_hour_credential() {
    let base = spawn_server(1800).await;
    let (client, navigator) = client(&base);

    let session = client
        .auth
        .register("johndoe", "john@example.com", PASSWORD, true)
        .await
        .unwrap();

    let claims = codec::decode(&session.access_token).unwrap();
    assert_eq!(claims.sub, session.user.id.to_string());
    assert!((claims.exp - codec::now_unix_seconds() - 1800).abs() <= 5);
    assert!(!codec::is_expired(&session.access_token));

    assert!(matches!(
        client.store.read(),
        Stored::Complete(_, StorageScope::Persistent)
    ));
    assert!(client.guard.enforce(None));

    let me = client.current_user().await.unwrap();
    assert_eq!(me.username, "johndoe");
    assert_eq!(me.email, "john@example.com");
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn short_username_is_rejected_without_a_session() {
    let base = spawn_server(1800).await;
    let (client, _) = client(&base);

    let err = client
        .auth
        .register("ab", "ab@example.com", PASSWORD, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput(_)));
    assert!(client.store.load().is_none());
}

#[tokio::test]
async fn duplicate_registration_is_reported() {
    let base = spawn_server(1800).await;
    let (client, _) = client(&base);

    client
        .auth
        .register("johndoe", "john@example.com", PASSWORD, false)
        .await
        .unwrap();
    let err = client
        .auth
        .register("johndoe", "other@example.com", PASSWORD, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::DuplicateIdentity));
}

#[tokio::test]
async fn empty_store_yields_no_credential() {
    let base = spawn_server(1800).await;
    let (client, navigator) = client(&base);

    let err = client
        .gateway
        .send(ApiRequest::get("/users/me"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NoCredential));
    assert!(navigator.history().is_empty());
    assert!(!client.guard.enforce(None));
    assert_eq!(navigator.last().as_deref(), Some(LOGIN_ENTRY_POINT));
}

#[tokio::test]
async fn forged_credential_is_cleared_on_401() {
    let base = spawn_server(1800).await;
    let (client, navigator) = client(&base);

    let registered = client
        .auth
        .register("johndoe", "john@example.com", PASSWORD, true)
        .await
        .unwrap();
    let forged = Session {
        access_token: forged_token(&registered.user.id.to_string()),
        ..registered
    };
    client
        .store
        .save(&forged, StorageScope::Persistent)
        .unwrap();

    // The client cannot tell a forged token from a real one.
    assert!(client.validator.is_authenticated());

    let err = client.current_user().await.unwrap_err();
    assert!(matches!(err, ClientError::AuthenticationFailed));
    assert_eq!(client.store.read(), Stored::Empty);
    assert_eq!(navigator.history(), vec![LOGIN_ENTRY_POINT.to_string()]);
}

#[tokio::test]
async fn expired_credential_is_rejected_and_purged() {
    let base = spawn_server(1).await;
    let (client, navigator) = client(&base);

    client
        .auth
        .register("johndoe", "john@example.com", PASSWORD, false)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2100)).await;

    // The gateway does not pre-check expiry; the server has the final word.
    let err = client.current_user().await.unwrap_err();
    assert!(matches!(err, ClientError::AuthenticationFailed));
    assert!(client.store.load().is_none());
    assert_eq!(navigator.last().as_deref(), Some(LOGIN_ENTRY_POINT));
}

#[tokio::test]
async fn validator_purges_expired_session_before_any_request() {
    let base = spawn_server(1).await;
    let (client, navigator) = client(&base);

    client
        .auth
        .register("johndoe", "john@example.com", PASSWORD, true)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2100)).await;

    assert!(!client.guard.enforce(None));
    assert_eq!(client.store.read(), Stored::Empty);
    assert_eq!(navigator.history(), vec![LOGIN_ENTRY_POINT.to_string()]);
}

#[tokio::test]
async fn remember_flag_selects_the_scope() {
    let base = spawn_server(1800).await;
    let (client, _) = client(&base);

    client
        .auth
        .register("johndoe", "john@example.com", PASSWORD, false)
        .await
        .unwrap();
    assert!(matches!(
        client.store.read(),
        Stored::Complete(_, StorageScope::Ephemeral)
    ));

    client
        .auth
        .login("john@example.com", PASSWORD, true)
        .await
        .unwrap();
    assert!(matches!(
        client.store.read(),
        Stored::Complete(_, StorageScope::Persistent)
    ));
    assert_eq!(
        client
            .store
            .repository(StorageScope::Ephemeral)
            .get("access_token"),
        None
    );

    client.auth.logout();
    client.auth.logout();
    assert_eq!(client.store.read(), Stored::Empty);
}

#[tokio::test]
async fn login_without_remember_wipes_the_persistent_file() {
    let base = spawn_server(1800).await;
    let dir = tempfile::tempdir().unwrap();
    let persistent = dir.path().join("persistent.json");
    let ephemeral = dir.path().join("ephemeral.json");
    let client = Client::with_session_files(
        ClientConfig::new(&base),
        &persistent,
        &ephemeral,
        Arc::new(RecordingNavigator::new()),
    )
    .unwrap();

    let remembered = client
        .auth
        .register("johndoe", "john@example.com", PASSWORD, true)
        .await
        .unwrap();
    assert!(persistent.exists());
    assert!(!ephemeral.exists());

    let current = client.auth.login("johndoe", PASSWORD, false).await.unwrap();
    assert_ne!(current.access_token, remembered.access_token);
    assert!(!persistent.exists());
    assert!(ephemeral.exists());
    assert!(matches!(
        client.store.read(),
        Stored::Complete(ref session, StorageScope::Ephemeral)
            if session.access_token == current.access_token
    ));
}

#[tokio::test]
async fn repeated_wrong_passwords_never_create_a_session() {
    let base = spawn_server(1800).await;
    let (client, _) = client(&base);

    client
        .auth
        .register("johndoe", "john@example.com", PASSWORD, false)
        .await
        .unwrap();
    client.auth.logout();

    for _ in 0..3 {
        let err = client
            .auth
            .login("johndoe", "wrongpassword", true)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidCredentials));
        assert!(client.store.load().is_none());
    }

    let unknown = client
        .auth
        .login("nobody", "wrongpassword", true)
        .await
        .unwrap_err();
    assert!(matches!(unknown, ClientError::InvalidCredentials));

    client.auth.login("johndoe", PASSWORD, false).await.unwrap();
    assert!(client.validator.is_authenticated());
}
