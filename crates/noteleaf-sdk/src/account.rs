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

//! A high-level API for account and tenant administration.

use reqwest::Method;
use tracing::{info, instrument};

use crate::{
    api::{paths, InviteUserRequest, NewUser, OrgUser, Role, Tenant, WhoamiResponse},
    authentication::Session,
    error::{Error, Result},
    Client,
};

/// A high-level API for the logged-in user's account and, for admins, the
/// user directory and subscription of their tenant.
///
/// Role checks happen server-side; calling an admin operation as a member
/// fails with a 403 carrying the backend's message. To access this API, use
/// [`Client::account()`](crate::Client::account).
#[derive(Debug, Clone)]
pub struct Account {
    client: Client,
}

impl Account {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch the identity behind the current session token from the backend.
    ///
    /// This is the same endpoint session restore uses; it does not touch the
    /// cached session.
    pub async fn whoami(&self) -> Result<Session> {
        let response: WhoamiResponse = self
            .client
            .send_authenticated(Method::POST, paths::WHOAMI, Some(&serde_json::json!({})))
            .await?;
        Ok(Session { user: response.user, tenant: response.tenant })
    }

    /// List the users of the tenant.
    pub async fn list_users(&self) -> Result<Vec<OrgUser>> {
        self.client.send_authenticated::<(), _>(Method::GET, paths::USERS, None).await
    }

    /// Invite a user to the tenant by email.
    pub async fn invite_user(&self, email: &str, role: Role) -> Result<()> {
        self.client
            .send_authenticated_unit(
                Method::POST,
                paths::INVITE_USER,
                Some(&InviteUserRequest { email, role }),
            )
            .await
    }

    /// Create a user account within the tenant directly, with a password set
    /// by the admin.
    pub async fn create_user(&self, user: &NewUser) -> Result<OrgUser> {
        self.client.send_authenticated(Method::POST, paths::USERS, Some(user)).await
    }

    /// Upgrade the tenant to the pro plan.
    ///
    /// On success the identity endpoint is re-fetched and the cached tenant
    /// of the session is patched in place, so readers of the session state
    /// see the new plan without a full reload.
    #[instrument(skip(self))]
    pub async fn upgrade_plan(&self) -> Result<Tenant> {
        let session = self.client.session().ok_or(Error::AuthenticationRequired)?;

        self.client
            .send_authenticated_unit::<serde_json::Value>(
                Method::POST,
                &paths::upgrade_tenant(&session.tenant.slug),
                Some(&serde_json::json!({})),
            )
            .await?;

        // The upgrade endpoint's response shape varies between deployments;
        // the identity endpoint is the authoritative source for the plan.
        let refreshed = self.whoami().await?;
        info!("Tenant {} is now on the {:?} plan", refreshed.tenant.slug, refreshed.tenant.plan);

        self.client.auth().update_tenant(refreshed.tenant.clone());
        Ok(refreshed.tenant)
    }
}
