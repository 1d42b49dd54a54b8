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

//! Types describing the wire format of the Noteleaf REST API.

use serde::{Deserialize, Serialize};

/// The authorization level of a user within their tenant.
///
/// Roles are enforced server-side; the client only uses them for routing
/// decisions, see [`RouteGuard`](crate::RouteGuard).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A regular member of the tenant.
    Member,
    /// An administrator of the tenant.
    Admin,
}

/// The subscription tier of a tenant.
///
/// Usage limits attached to a plan (e.g. the note cap on the free plan) are
/// enforced server-side and surface as API errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// The free tier.
    Free,
    /// The paid tier.
    Pro,
}

/// The identity of the logged-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique ID of the user.
    #[serde(alias = "_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address, also the login identifier.
    pub email: String,
    /// The user's role within the tenant.
    pub role: Role,
}

/// The company/organization account the user belongs to.
///
/// The tenant is the unit of data isolation; every authenticated request is
/// implicitly scoped to it through the bearer token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Human readable tenant name.
    pub name: String,
    /// URL-safe unique identifier of the tenant.
    pub slug: String,
    /// The tenant's subscription plan.
    pub plan: Plan,
}

/// A note, the primary resource of the service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique ID of the note.
    #[serde(alias = "_id")]
    pub id: String,
    /// Title of the note.
    pub title: String,
    /// Body of the note.
    pub content: String,
    /// Server-side creation timestamp, if the deployment provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Server-side last-modified timestamp, if the deployment provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A row of the tenant's user directory, as returned by `GET /users`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgUser {
    /// Unique ID of the user.
    #[serde(alias = "_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// The user's role within the tenant.
    pub role: Role,
    /// Account status, e.g. `"Active"` or `"Invited"`. Optional because older
    /// deployments don't return it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Request body of `POST /auth/login`.
#[derive(Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response body of `POST /auth/login` and `POST /auth/register`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    pub access_token: String,
    #[serde(alias = "User")]
    pub user: User,
    pub tenant: Tenant,
}

/// Response body of `POST /users/me`.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct WhoamiResponse {
    #[serde(alias = "User")]
    pub user: User,
    pub tenant: Tenant,
}

/// Data needed to register a new tenant together with its first (admin) user.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    /// Display name of the admin user.
    pub name: String,
    /// Email address of the admin user.
    pub email: String,
    /// Password of the admin user.
    pub password: String,
    /// Human readable name of the new tenant.
    pub company_name: String,
    /// URL-safe identifier of the new tenant; lowercase letters, digits and
    /// hyphens.
    pub company_slug: String,
    /// The plan to start on.
    pub plan: Plan,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("company_name", &self.company_name)
            .field("company_slug", &self.company_slug)
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

/// Data needed to create an additional user within the current tenant.
#[derive(Clone, Serialize)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Role to assign.
    pub role: Role,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct InviteUserRequest<'a> {
    pub email: &'a str,
    pub role: Role,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct NoteContentRequest<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

/// The error payload the backend attaches to non-2xx responses.
///
/// Some deployments use `message`, older ones `error`; both carry a human
/// readable string.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.message.or(self.error)
    }
}

/// Endpoint paths, relative to the configured base URL.
///
/// Exact paths are deployment configuration rather than part of the API
/// contract, which is why they are collected here instead of being spread
/// over the request sites.
pub(crate) mod paths {
    pub(crate) const LOGIN: &str = "auth/login";
    pub(crate) const REGISTER: &str = "auth/register";
    pub(crate) const WHOAMI: &str = "users/me";
    pub(crate) const USERS: &str = "users";
    pub(crate) const INVITE_USER: &str = "users/invite";
    pub(crate) const NOTES: &str = "notes";

    pub(crate) fn note(id: &str) -> String {
        format!("notes/{id}")
    }

    pub(crate) fn upgrade_tenant(slug: &str) -> String {
        format!("tenants/{slug}/upgrade")
    }
}
