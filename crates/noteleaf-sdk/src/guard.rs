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

//! Role-gated routing decisions derived from the session state.

use crate::{api::Role, authentication::SessionState, SessionStatus};

/// What a router should do with a guarded route, given the current session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    /// The session is still restoring; show a loading placeholder and make
    /// no navigation decision yet.
    Loading,
    /// Nobody is logged in; redirect to the login entry point.
    RedirectToLogin,
    /// The user is logged in but lacks the required role; redirect to the
    /// default authenticated landing view.
    RedirectToLanding,
    /// Render the guarded content.
    Render,
}

/// A guard for a route that requires a logged-in user, optionally with a
/// specific role.
///
/// Deciding is a pure function of the session state; the guard holds no state
/// of its own and performs no IO.
///
/// # Examples
///
/// ```
/// use noteleaf_sdk::{api::Role, RouteDecision, RouteGuard};
/// # fn render() {}
/// # fn redirect(_: &str) {}
/// # let client = noteleaf_sdk::Client::new("https://api.noteleaf.example/").unwrap();
///
/// let guard = RouteGuard::with_role(Role::Admin);
/// match guard.decide(&client.session_state()) {
///     RouteDecision::Render => render(),
///     RouteDecision::Loading => { /* spinner */ }
///     RouteDecision::RedirectToLogin => redirect("/login"),
///     RouteDecision::RedirectToLanding => redirect("/dashboard"),
/// }
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouteGuard {
    required_role: Option<Role>,
}

impl RouteGuard {
    /// A guard that only requires a logged-in user, regardless of role.
    pub fn new() -> Self {
        Self::default()
    }

    /// A guard that requires a logged-in user with the given role.
    pub fn with_role(role: Role) -> Self {
        Self { required_role: Some(role) }
    }

    /// Decide what to do with the guarded route under the given session
    /// state.
    pub fn decide(&self, state: &SessionState) -> RouteDecision {
        if state.status() == SessionStatus::Restoring {
            return RouteDecision::Loading;
        }

        let Some(session) = state.session() else {
            return RouteDecision::RedirectToLogin;
        };

        match self.required_role {
            Some(required) if session.user.role != required => RouteDecision::RedirectToLanding,
            _ => RouteDecision::Render,
        }
    }
}
