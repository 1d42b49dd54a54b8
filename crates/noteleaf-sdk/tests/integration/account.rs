use assert_matches::assert_matches;
use noteleaf_sdk::{
    api::{NewUser, Plan, Role},
    test_utils::{init_tracing_for_tests, logged_in_client_with_server, test_client},
    Error, SessionChange,
};
use serde_json::json;
use wiremock::{
    matchers::{body_json, method, path},
    Mock, ResponseTemplate,
};

use crate::whoami_json;

#[tokio::test]
async fn whoami_does_not_touch_the_cached_session() {
    init_tracing_for_tests();
    let (client, server) = logged_in_client_with_server(Role::Member).await;

    // The backend reports a newer tenant record than the cached one.
    Mock::given(method("POST"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(whoami_json("member", "pro")))
        .mount(&server)
        .await;

    let fresh = client.account().whoami().await.unwrap();
    assert_eq!(fresh.tenant.plan, Plan::Pro);

    // The cached session still has the old plan; only a session mutation
    // updates it.
    assert_eq!(client.session().unwrap().tenant.plan, Plan::Free);
}

#[tokio::test]
async fn list_users() {
    init_tracing_for_tests();
    let (client, server) = logged_in_client_with_server(Role::Admin).await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "_id": "u-1",
                "name": "Alice",
                "email": "alice@acme.test",
                "role": "admin",
                "status": "Active",
            },
            { "_id": "u-2", "name": "Bob", "email": "bob@acme.test", "role": "member" },
        ])))
        .mount(&server)
        .await;

    let users = client.account().list_users().await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].status.as_deref(), Some("Active"));
    assert_eq!(users[1].role, Role::Member);
    assert_eq!(users[1].status, None);
}

#[tokio::test]
async fn invite_user() {
    init_tracing_for_tests();
    let (client, server) = logged_in_client_with_server(Role::Admin).await;

    Mock::given(method("POST"))
        .and(path("/users/invite"))
        .and(body_json(json!({ "email": "carol@acme.test", "role": "member" })))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    client.account().invite_user("carol@acme.test", Role::Member).await.unwrap();
}

#[tokio::test]
async fn create_user() {
    init_tracing_for_tests();
    let (client, server) = logged_in_client_with_server(Role::Admin).await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "_id": "u-3",
            "name": "Carol",
            "email": "carol@acme.test",
            "role": "member",
        })))
        .mount(&server)
        .await;

    let created = client
        .account()
        .create_user(&NewUser {
            name: "Carol".to_owned(),
            email: "carol@acme.test".to_owned(),
            password: "changeme1".to_owned(),
            role: Role::Member,
        })
        .await
        .unwrap();
    assert_eq!(created.id, "u-3");
}

#[tokio::test]
async fn upgrade_plan_patches_the_cached_tenant() {
    init_tracing_for_tests();
    let (client, server) = logged_in_client_with_server(Role::Admin).await;

    Mock::given(method("POST"))
        .and(path("/tenants/acme/upgrade"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(whoami_json("admin", "pro")))
        .mount(&server)
        .await;

    assert_eq!(client.session().unwrap().tenant.plan, Plan::Free);
    let mut changes = client.subscribe_to_session_changes();

    let tenant = client.account().upgrade_plan().await.unwrap();
    assert_eq!(tenant.plan, Plan::Pro);

    // The cached session now carries the upgraded plan, no reload needed.
    assert_eq!(client.session().unwrap().tenant.plan, Plan::Pro);
    assert_matches!(changes.recv().await, Ok(SessionChange::Refreshed));
}

#[tokio::test]
async fn upgrade_plan_requires_a_logged_in_client() {
    init_tracing_for_tests();
    let client = test_client(None);

    let err = client.account().upgrade_plan().await.unwrap_err();
    assert_matches!(err, Error::AuthenticationRequired);
}

#[tokio::test]
async fn admin_errors_surface_the_backend_message() {
    init_tracing_for_tests();
    let (client, server) = logged_in_client_with_server(Role::Member).await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "message": "Admins only" })),
        )
        .mount(&server)
        .await;

    let err = client.account().list_users().await.unwrap_err();
    assert_eq!(err.api_message(), Some("Admins only"));
}
