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

use std::{fmt, sync::Arc};

use futures_core::Stream;
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::broadcast;
use url::Url;

use crate::{
    account::Account,
    api::{paths, WhoamiResponse},
    authentication::{Auth, AuthCtx, Session, SessionChange, SessionState, SessionStatus},
    config::RequestConfig,
    error::{Error, HttpResult, Result},
    http_client::HttpClient,
    notes::Notes,
};

mod builder;

pub use builder::{ClientBuildError, ClientBuilder};

/// An async client for the Noteleaf REST API.
///
/// All of the state is held in an `Arc` so the `Client` can be cloned freely.
#[derive(Clone)]
pub struct Client {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    /// The base URL of the Noteleaf deployment, always ending in a `/` so
    /// endpoint paths can be joined onto it.
    base_url: Url,
    /// The underlying HTTP client.
    http_client: HttpClient,
    /// Session and authentication state.
    auth_ctx: AuthCtx,
}

impl fmt::Debug for Client {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Client").field("base_url", &self.inner.base_url.as_str()).finish()
    }
}

impl Client {
    /// Create a new [`Client`] for the deployment at the given base URL.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The URL the API is served under, e.g.
    ///   `https://api.noteleaf.example/api/v1/`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, ClientBuildError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new [`ClientBuilder`].
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn new_inner(base_url: Url, http_client: HttpClient, auth_ctx: AuthCtx) -> Self {
        Self { inner: Arc::new(ClientInner { base_url, http_client, auth_ctx }) }
    }

    pub(crate) fn auth_ctx(&self) -> &AuthCtx {
        &self.inner.auth_ctx
    }

    /// The base URL of the deployment this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Get a copy of the default request config.
    pub fn request_config(&self) -> RequestConfig {
        self.inner.http_client.request_config
    }

    /// Access the session management API.
    pub fn auth(&self) -> Auth {
        Auth::new(self.clone())
    }

    /// Access the notes API of the logged-in tenant.
    pub fn notes(&self) -> Notes {
        Notes::new(self.clone())
    }

    /// Access the account and tenant administration API.
    pub fn account(&self) -> Account {
        Account::new(self.clone())
    }

    /// A snapshot of the current session state.
    pub fn session_state(&self) -> SessionState {
        self.inner.auth_ctx.state()
    }

    /// The lifecycle phase of the session.
    pub fn status(&self) -> SessionStatus {
        self.session_state().status()
    }

    /// The identity of the logged-in session, if there is one.
    pub fn session(&self) -> Option<Session> {
        self.session_state().session().cloned()
    }

    /// The current access token, if the client is logged in.
    pub fn access_token(&self) -> Option<String> {
        self.session_state().access_token().map(ToOwned::to_owned)
    }

    /// Is the client logged in.
    pub fn logged_in(&self) -> bool {
        self.session_state().is_logged_in()
    }

    /// [`Stream`] of session state snapshots.
    ///
    /// The stream yields a snapshot for every transition after subscription
    /// time; get the current state with
    /// [`session_state()`](Self::session_state) first. Useful to drive UI
    /// that mirrors the session, e.g. a navbar that appears once logged in.
    pub fn session_state_stream(&self) -> impl Stream<Item = SessionState> {
        self.inner.auth_ctx.subscribe()
    }

    /// Subscribe to discrete session changes (logins and logouts).
    pub fn subscribe_to_session_changes(&self) -> broadcast::Receiver<SessionChange> {
        self.inner.auth_ctx.session_change_sender.subscribe()
    }

    fn endpoint(&self, path: &str) -> HttpResult<Url> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Send a request without credentials, e.g. a login.
    pub(crate) async fn send_anonymous<B, R>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        Ok(self.inner.http_client.send(method, url, Some(body), None, None).await?)
    }

    /// Send a request with the current session's bearer token attached.
    ///
    /// Fails fast with [`Error::AuthenticationRequired`] when the client is
    /// not logged in.
    pub(crate) async fn send_authenticated<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let token = self.access_token().ok_or(Error::AuthenticationRequired)?;
        let url = self.endpoint(path)?;
        Ok(self.inner.http_client.send(method, url, body, Some(&token), None).await?)
    }

    /// Like [`send_authenticated`](Self::send_authenticated), discarding the
    /// response body.
    pub(crate) async fn send_authenticated_unit<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let token = self.access_token().ok_or(Error::AuthenticationRequired)?;
        let url = self.endpoint(path)?;
        Ok(self.inner.http_client.send_unit(method, url, body, Some(&token), None).await?)
    }

    /// Fetch the identity behind an explicit token, bypassing the session
    /// state. This is the primitive behind session restore, where the token
    /// comes from the store rather than from a logged-in session.
    pub(crate) async fn whoami_with_token(&self, access_token: &str) -> Result<WhoamiResponse> {
        let url = self.endpoint(paths::WHOAMI)?;
        Ok(self
            .inner
            .http_client
            .send(Method::POST, url, Some(&serde_json::json!({})), Some(access_token), None)
            .await?)
    }
}
