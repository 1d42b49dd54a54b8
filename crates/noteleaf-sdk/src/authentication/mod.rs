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

//! Types and a high-level API to manage the authentication session.
//!
//! The session lifecycle is owned by [`Auth`], which is obtained from
//! [`Client::auth()`](crate::Client::auth). There is a single writer: all
//! session mutations go through the operations on `Auth`, and readers observe
//! the result either through the getters on `Client` or through
//! [`Client::session_state_stream()`](crate::Client::session_state_stream).

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
};

use eyeball::SharedObservable;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::{
    api::{paths, LoginRequest, LoginResponse, NewAccount, Tenant, User},
    error::Result,
    store::TokenStore,
    Client,
};

/// The tokens of an authentication session.
///
/// The access token is an opaque bearer credential; the client never
/// interprets it.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionTokens {
    /// The opaque bearer token presented on every authenticated request.
    #[serde(rename = "accessToken", alias = "access_token")]
    pub access_token: String,
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens").finish_non_exhaustive()
    }
}

/// The resolved identity of a logged-in session.
///
/// User and tenant always travel together: they are fetched in one request
/// and published in one state update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The logged-in user.
    pub user: User,
    /// The tenant the user belongs to.
    pub tenant: Tenant,
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Self { user: response.user, tenant: response.tenant }
    }
}

/// The lifecycle phase of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// The client is still finding out whether a previous session can be
    /// restored. Consumers should hold off on navigation decisions.
    Restoring,
    /// The client knows whether it is logged in or not.
    Ready,
}

/// A snapshot of the whole session state.
///
/// Snapshots are immutable; a new one is published for every transition, so
/// an observer can never see a token without the matching identity or vice
/// versa.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionState {
    status: SessionStatus,
    tokens: Option<SessionTokens>,
    session: Option<Session>,
}

impl SessionState {
    pub(crate) fn restoring() -> Self {
        Self { status: SessionStatus::Restoring, tokens: None, session: None }
    }

    pub(crate) fn ready_empty() -> Self {
        Self { status: SessionStatus::Ready, tokens: None, session: None }
    }

    pub(crate) fn logged_in(tokens: SessionTokens, session: Session) -> Self {
        Self { status: SessionStatus::Ready, tokens: Some(tokens), session: Some(session) }
    }

    /// The lifecycle phase of the session.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// The resolved identity, if the session is logged in.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The access token, if the session is logged in.
    pub fn access_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.access_token.as_str())
    }

    /// Whether the session is logged in, i.e. both token and identity are
    /// present.
    pub fn is_logged_in(&self) -> bool {
        self.tokens.is_some() && self.session.is_some()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        // The session starts out restoring; `Auth::restore()` moves it to
        // `Ready` even when there is nothing to restore.
        Self::restoring()
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("status", &self.status)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// A change of the session, as sent out over
/// [`Client::subscribe_to_session_changes()`](crate::Client::subscribe_to_session_changes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionChange {
    /// The client became logged in, either through a login or a successful
    /// session restore.
    LoggedIn,
    /// The client was logged out.
    LoggedOut,
    /// The identity of the logged-in session was re-fetched and the cached
    /// copy updated, e.g. after a plan upgrade.
    Refreshed,
}

/// Authentication state shared by all clones of a [`Client`].
pub(crate) struct AuthCtx {
    pub(crate) token_store: Arc<dyn TokenStore>,
    /// The authoritative session state. All writes go through
    /// [`AuthCtx::apply_if_current`] or [`AuthCtx::force_set`].
    state: RwLock<SessionState>,
    /// Mirror of `state` for subscribers.
    observable: SharedObservable<SessionState>,
    /// Bumped on logout. A session-mutating operation records the value
    /// before its network round-trip and discards the response when the value
    /// moved on in the meantime.
    generation: AtomicU64,
    /// Serializes restore, login and register so a stale restore cannot
    /// overwrite a fresher login.
    operation_lock: Mutex<()>,
    pub(crate) session_change_sender: broadcast::Sender<SessionChange>,
}

impl AuthCtx {
    pub(crate) fn new(token_store: Arc<dyn TokenStore>) -> Self {
        let (session_change_sender, _) = broadcast::channel(8);
        Self {
            token_store,
            state: RwLock::new(SessionState::default()),
            observable: SharedObservable::new(SessionState::default()),
            generation: AtomicU64::new(0),
            operation_lock: Mutex::new(()),
            session_change_sender,
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state.read().expect("session state lock poisoned").clone()
    }

    pub(crate) fn subscribe(&self) -> eyeball::Subscriber<SessionState> {
        self.observable.subscribe()
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Publish `new` unless the session generation moved past `generation`,
    /// in which case the update is discarded. Returns whether the update was
    /// applied.
    fn apply_if_current(&self, generation: u64, new: SessionState) -> bool {
        let mut state = self.state.write().expect("session state lock poisoned");
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        *state = new.clone();
        self.observable.set(new);
        true
    }

    /// Publish `new` unconditionally.
    fn force_set(&self, new: SessionState) {
        let mut state = self.state.write().expect("session state lock poisoned");
        *state = new.clone();
        self.observable.set(new);
    }
}

/// A high-level API to log in, restore and end the authentication session.
///
/// To access this API, use [`Client::auth()`](crate::Client::auth).
#[derive(Debug, Clone)]
pub struct Auth {
    client: Client,
}

impl Auth {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Restore the session persisted by a previous run.
    ///
    /// Intended to be called once at application start. The session state
    /// ends up `Ready` in every case:
    ///
    /// * No stored token: ready and logged out.
    /// * Stored token accepted by the backend: ready and logged in, with the
    ///   identity from the backend response.
    /// * Stored token rejected with 401/403: the token is removed from the
    ///   store; ready and logged out.
    /// * Any other failure (network, server error): the stored token is kept
    ///   so a later restart can try again, but this run comes up logged out.
    ///   The error is not propagated; a flaky network must not look like a
    ///   logout to the user.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<()> {
        let ctx = self.client.auth_ctx();
        let _guard = ctx.operation_lock.lock().await;
        let generation = ctx.current_generation();

        let tokens = match ctx.token_store.load().await {
            Ok(Some(tokens)) => tokens,
            Ok(None) => {
                debug!("No stored token, starting logged out");
                ctx.apply_if_current(generation, SessionState::ready_empty());
                return Ok(());
            }
            Err(e) => {
                warn!("Could not read the token store: {e}");
                ctx.apply_if_current(generation, SessionState::ready_empty());
                return Err(e.into());
            }
        };

        ctx.apply_if_current(generation, SessionState::restoring());
        debug!("Restoring session from stored token");

        match self.client.whoami_with_token(&tokens.access_token).await {
            Ok(response) => {
                let session = Session { user: response.user, tenant: response.tenant };
                if ctx.apply_if_current(generation, SessionState::logged_in(tokens, session)) {
                    debug!("Session restored");
                    let _ = ctx.session_change_sender.send(SessionChange::LoggedIn);
                } else {
                    debug!("Logged out while restoring, discarding the response");
                }
            }
            Err(e) if e.is_unauthorized() => {
                info!("Stored token was rejected by the backend, discarding it");
                if let Err(e) = ctx.token_store.remove().await {
                    warn!("Could not remove the rejected token: {e}");
                }
                ctx.apply_if_current(generation, SessionState::ready_empty());
            }
            Err(e) => {
                warn!("Could not restore the session, starting logged out: {e}");
                ctx.apply_if_current(generation, SessionState::ready_empty());
            }
        }

        Ok(())
    }

    /// Log in with an email address and password.
    ///
    /// On success the token is persisted to the token store and the session
    /// state is updated in a single transition. On failure the previous
    /// session state is left untouched and the returned error carries the
    /// backend's message, see [`Error::api_message`](crate::Error::api_message).
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let ctx = self.client.auth_ctx();
        let _guard = ctx.operation_lock.lock().await;
        let generation = ctx.current_generation();

        let response: LoginResponse = self
            .client
            .send_anonymous(reqwest::Method::POST, paths::LOGIN, &LoginRequest { email, password })
            .await?;

        self.finish_login(generation, response, "logging in").await
    }

    /// Register a new tenant together with its first, administrating user.
    ///
    /// On success the backend returns a session token and the client is
    /// logged in, exactly as after [`login`](Self::login).
    #[instrument(skip(self, account), fields(company_slug = %account.company_slug))]
    pub async fn register(&self, account: &NewAccount) -> Result<Session> {
        let ctx = self.client.auth_ctx();
        let _guard = ctx.operation_lock.lock().await;
        let generation = ctx.current_generation();

        let response: LoginResponse =
            self.client.send_anonymous(reqwest::Method::POST, paths::REGISTER, account).await?;

        self.finish_login(generation, response, "registering").await
    }

    async fn finish_login(
        &self,
        generation: u64,
        response: LoginResponse,
        what: &str,
    ) -> Result<Session> {
        let ctx = self.client.auth_ctx();
        let tokens = SessionTokens { access_token: response.access_token.clone() };
        let session = Session::from(response);

        if !ctx.apply_if_current(generation, SessionState::logged_in(tokens.clone(), session.clone()))
        {
            debug!("Logged out while {what}, discarding the response");
            return Ok(session);
        }

        info!("Logged in as {}", session.user.email);
        let _ = ctx.session_change_sender.send(SessionChange::LoggedIn);

        // The in-memory session is already usable at this point; a failure to
        // persist only means the session won't survive a restart.
        if let Err(e) = ctx.token_store.save(&tokens).await {
            warn!("Could not persist the session token: {e}");
        }

        Ok(session)
    }

    /// Log out, clearing the stored token and the in-memory session.
    ///
    /// This is unconditional and idempotent. A restore or login that is still
    /// in flight when this is called will have its response discarded instead
    /// of repopulating the session.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let ctx = self.client.auth_ctx();

        // Invalidate in-flight session mutations before touching any state.
        ctx.generation.fetch_add(1, Ordering::SeqCst);

        let removed = ctx.token_store.remove().await;

        ctx.force_set(SessionState::ready_empty());
        let _ = ctx.session_change_sender.send(SessionChange::LoggedOut);
        info!("Logged out");

        removed.map_err(Into::into)
    }

    /// Replace the cached tenant of the logged-in session.
    ///
    /// Used after a plan upgrade, when the identity endpoint reports a newer
    /// tenant record. Discarded when the session changed in the meantime.
    pub(crate) fn update_tenant(&self, tenant: Tenant) {
        let ctx = self.client.auth_ctx();
        let generation = ctx.current_generation();
        let state = ctx.state();

        let (Some(tokens), Some(mut session)) =
            (state.tokens.clone(), state.session().cloned())
        else {
            return;
        };

        session.tenant = tenant;
        if ctx.apply_if_current(generation, SessionState::logged_in(tokens, session)) {
            let _ = ctx.session_change_sender.send(SessionChange::Refreshed);
        }
    }

    /// Set the session directly, without a network round-trip.
    ///
    /// Used by the testing helpers.
    #[cfg(any(test, feature = "testing"))]
    pub(crate) fn set_session(&self, tokens: SessionTokens, session: Session) {
        let ctx = self.client.auth_ctx();
        let generation = ctx.current_generation();
        ctx.apply_if_current(generation, SessionState::logged_in(tokens, session));
    }
}
