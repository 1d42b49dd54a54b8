use std::{sync::Arc, time::Duration};

use assert_matches::assert_matches;
use futures_util::StreamExt;
use noteleaf_sdk::{
    api::{NewAccount, Plan, Role},
    store::{MemoryTokenStore, TokenStore},
    test_utils::{
        init_tracing_for_tests, logged_in_client, logged_in_client_with_server,
        test_client_builder_with_server, test_client_with_server, TEST_TOKEN,
    },
    SessionChange, SessionStatus, SessionTokens,
};
use serde_json::json;
use wiremock::{
    matchers::{header, method, path},
    Mock, ResponseTemplate,
};

use crate::{login_json, whoami_json};

fn stored_tokens(access_token: &str) -> SessionTokens {
    SessionTokens { access_token: access_token.to_owned() }
}

#[tokio::test]
async fn restore_with_valid_token_populates_session() {
    init_tracing_for_tests();
    let (builder, server) = test_client_builder_with_server().await;
    let store = Arc::new(MemoryTokenStore::with_tokens(stored_tokens("tok-1")));
    let client = builder.token_store(store.clone()).build().unwrap();

    Mock::given(method("POST"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(whoami_json("member", "free")))
        .mount(&server)
        .await;

    assert_eq!(client.status(), SessionStatus::Restoring);
    client.auth().restore().await.unwrap();

    assert_eq!(client.status(), SessionStatus::Ready);
    assert!(client.logged_in());
    assert_eq!(client.access_token().as_deref(), Some("tok-1"));

    let session = client.session().unwrap();
    assert_eq!(session.user.email, "alice@acme.test");
    assert_eq!(session.user.role, Role::Member);
    assert_eq!(session.tenant.slug, "acme");
}

#[tokio::test]
async fn restore_with_rejected_token_removes_it() {
    init_tracing_for_tests();
    let (builder, server) = test_client_builder_with_server().await;
    let store = Arc::new(MemoryTokenStore::with_tokens(stored_tokens("tok-stale")));
    let client = builder.token_store(store.clone()).build().unwrap();

    Mock::given(method("POST"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "jwt expired" })))
        .mount(&server)
        .await;

    client.auth().restore().await.unwrap();

    assert_eq!(client.status(), SessionStatus::Ready);
    assert!(!client.logged_in());
    assert!(client.session().is_none());
    // The rejected token is gone from the store.
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn restore_keeps_token_on_transient_failure() {
    init_tracing_for_tests();
    let (builder, server) = test_client_builder_with_server().await;
    let store = Arc::new(MemoryTokenStore::with_tokens(stored_tokens("tok-1")));
    let client = builder.token_store(store.clone()).build().unwrap();

    Mock::given(method("POST"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    // A transient failure is swallowed; the run starts logged out.
    client.auth().restore().await.unwrap();

    assert_eq!(client.status(), SessionStatus::Ready);
    assert!(!client.logged_in());
    // The stored token survives for the next restart.
    assert_eq!(store.load().await.unwrap(), Some(stored_tokens("tok-1")));
}

#[tokio::test]
async fn restore_without_stored_token_is_ready_immediately() {
    init_tracing_for_tests();
    let (client, _server) = test_client_with_server().await;

    client.auth().restore().await.unwrap();

    assert_eq!(client.status(), SessionStatus::Ready);
    assert!(!client.logged_in());
}

#[tokio::test]
async fn login_populates_session_and_token_atomically() {
    init_tracing_for_tests();
    let (client, server) = test_client_with_server().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_json("tok-login", "member")))
        .mount(&server)
        .await;

    let mut states = Box::pin(client.session_state_stream());

    let session = client.auth().login("alice@acme.test", "hunter22").await.unwrap();
    assert_eq!(session.user.email, "alice@acme.test");

    // The first observable transition already carries both the token and the
    // identity; there is no intermediate half-logged-in state.
    let state = states.next().await.unwrap();
    assert_eq!(state.status(), SessionStatus::Ready);
    assert_eq!(state.access_token(), Some("tok-login"));
    assert!(state.session().is_some());

    assert!(client.logged_in());
}

#[tokio::test]
async fn login_failure_leaves_previous_session_untouched() {
    init_tracing_for_tests();
    let (client, server) = logged_in_client_with_server(Role::Member).await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let err = client.auth().login("alice@acme.test", "wrong").await.unwrap_err();
    assert_eq!(err.api_message(), Some("Invalid credentials"));

    // Still logged in with the previous session.
    assert!(client.logged_in());
    assert_eq!(client.access_token().as_deref(), Some(TEST_TOKEN));
}

#[tokio::test]
async fn login_failure_without_message_has_no_api_message() {
    init_tracing_for_tests();
    let (client, server) = test_client_with_server().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client.auth().login("alice@acme.test", "hunter22").await.unwrap_err();
    assert_eq!(err.api_message(), None);
    assert!(!err.is_unauthorized());
}

#[tokio::test]
async fn register_logs_the_new_admin_in() {
    init_tracing_for_tests();
    let (client, server) = test_client_with_server().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(login_json("tok-new", "admin")))
        .mount(&server)
        .await;

    let session = client
        .auth()
        .register(&NewAccount {
            name: "Alice".to_owned(),
            email: "alice@acme.test".to_owned(),
            password: "hunter22".to_owned(),
            company_name: "Acme".to_owned(),
            company_slug: "acme".to_owned(),
            plan: Plan::Free,
        })
        .await
        .unwrap();

    assert_eq!(session.user.role, Role::Admin);
    assert!(client.logged_in());
    assert_eq!(client.access_token().as_deref(), Some("tok-new"));
}

#[tokio::test]
async fn register_failure_surfaces_the_backend_message() {
    init_tracing_for_tests();
    let (client, server) = test_client_with_server().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({ "message": "Company slug already taken" })),
        )
        .mount(&server)
        .await;

    let err = client
        .auth()
        .register(&NewAccount {
            name: "Alice".to_owned(),
            email: "alice@acme.test".to_owned(),
            password: "hunter22".to_owned(),
            company_name: "Acme".to_owned(),
            company_slug: "acme".to_owned(),
            plan: Plan::Free,
        })
        .await
        .unwrap_err();

    assert_eq!(err.api_message(), Some("Company slug already taken"));
    assert!(!client.logged_in());
}

#[tokio::test]
async fn logout_is_idempotent() {
    init_tracing_for_tests();
    let client = logged_in_client(None, Role::Member);

    client.auth().logout().await.unwrap();
    assert_eq!(client.status(), SessionStatus::Ready);
    assert!(!client.logged_in());
    assert!(client.session().is_none());

    // A second logout produces the same empty state.
    client.auth().logout().await.unwrap();
    assert_eq!(client.status(), SessionStatus::Ready);
    assert!(!client.logged_in());
}

#[tokio::test]
async fn logout_clears_the_token_store() {
    init_tracing_for_tests();
    let store = Arc::new(MemoryTokenStore::with_tokens(stored_tokens("tok-1")));
    let client = noteleaf_sdk::Client::builder()
        .base_url("http://localhost:1234")
        .token_store(store.clone())
        .build()
        .unwrap();

    client.auth().logout().await.unwrap();
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn logout_discards_an_in_flight_restore() {
    init_tracing_for_tests();
    let (builder, server) = test_client_builder_with_server().await;
    let store = Arc::new(MemoryTokenStore::with_tokens(stored_tokens("tok-1")));
    let client = builder.token_store(store.clone()).build().unwrap();

    Mock::given(method("POST"))
        .and(path("/users/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(whoami_json("member", "free"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let restoring = client.clone();
    let task = tokio::spawn(async move { restoring.auth().restore().await });

    // Give the restore time to get its request onto the wire.
    tokio::time::sleep(Duration::from_millis(100)).await;
    client.auth().logout().await.unwrap();

    task.await.unwrap().unwrap();

    // The late restore response must not have repopulated the session.
    assert_eq!(client.status(), SessionStatus::Ready);
    assert!(!client.logged_in());
    assert!(client.session().is_none());
}

#[tokio::test]
async fn session_changes_are_broadcast() {
    init_tracing_for_tests();
    let (client, server) = test_client_with_server().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_json("tok-1", "member")))
        .mount(&server)
        .await;

    let mut changes = client.subscribe_to_session_changes();

    client.auth().login("alice@acme.test", "hunter22").await.unwrap();
    assert_matches!(changes.recv().await, Ok(SessionChange::LoggedIn));

    client.auth().logout().await.unwrap();
    assert_matches!(changes.recv().await, Ok(SessionChange::LoggedOut));
}
