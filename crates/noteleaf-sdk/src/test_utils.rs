// Copyright 2025 The Noteleaf Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Testing utilities - DO NOT USE IN PRODUCTION.

#![allow(dead_code)]

use crate::{
    api::{Plan, Role, Tenant, User},
    authentication::{Session, SessionTokens},
    Client, ClientBuilder,
};

/// The access token the test session uses.
pub const TEST_TOKEN: &str = "1234";

/// Set up a `tracing` subscriber honoring `RUST_LOG`, writing to the test
/// output. Calling it more than once is fine.
pub fn init_tracing_for_tests() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// The session every logged-in test client starts with.
pub fn test_session(role: Role) -> Session {
    Session {
        user: User {
            id: "u-1".to_owned(),
            name: "Alice".to_owned(),
            email: "alice@acme.test".to_owned(),
            role,
        },
        tenant: Tenant { name: "Acme".to_owned(), slug: "acme".to_owned(), plan: Plan::Free },
    }
}

/// A [`ClientBuilder`] fit for testing, using the given `base_url` (or
/// localhost:1234).
pub fn test_client_builder(base_url: Option<String>) -> ClientBuilder {
    let base_url = base_url.unwrap_or_else(|| "http://localhost:1234".to_owned());
    Client::builder().base_url(base_url)
}

/// A [`Client`] using the given `base_url` (or localhost:1234), logged out.
pub fn test_client(base_url: Option<String>) -> Client {
    test_client_builder(base_url).build().unwrap()
}

/// A [`Client`] using the given `base_url` (or localhost:1234), already
/// logged in with a hardcoded session of the given role (the token is
/// [`TEST_TOKEN`]).
pub fn logged_in_client(base_url: Option<String>, role: Role) -> Client {
    let client = test_client(base_url);
    client
        .auth()
        .set_session(SessionTokens { access_token: TEST_TOKEN.to_owned() }, test_session(role));
    client
}

/// Like [`test_client_builder`], but with a mocked server too.
pub async fn test_client_builder_with_server() -> (ClientBuilder, wiremock::MockServer) {
    let server = wiremock::MockServer::start().await;
    let builder = test_client_builder(Some(server.uri()));
    (builder, server)
}

/// Like [`test_client`], but with a mocked server too.
pub async fn test_client_with_server() -> (Client, wiremock::MockServer) {
    let server = wiremock::MockServer::start().await;
    let client = test_client(Some(server.uri()));
    (client, server)
}

/// Like [`logged_in_client`], but with a mocked server too.
pub async fn logged_in_client_with_server(role: Role) -> (Client, wiremock::MockServer) {
    let server = wiremock::MockServer::start().await;
    let client = logged_in_client(Some(server.uri()), role);
    (client, server)
}
