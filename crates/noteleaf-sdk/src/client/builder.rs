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

use thiserror::Error;
use url::Url;

use super::Client;
use crate::{
    authentication::AuthCtx,
    config::RequestConfig,
    http_client::HttpClient,
    store::{MemoryTokenStore, TokenStore},
};

/// Builder that allows creating and configuring various parts of a
/// [`Client`].
///
/// # Examples
///
/// ```no_run
/// use noteleaf_sdk::Client;
///
/// let client = Client::builder()
///     .base_url("https://api.noteleaf.example/api/v1/")
///     .user_agent("MyApp/3.0")
///     .build()?;
/// # anyhow::Ok(())
/// ```
#[must_use]
pub struct ClientBuilder {
    base_url: Option<String>,
    request_config: RequestConfig,
    http_client: Option<reqwest::Client>,
    user_agent: Option<String>,
    token_store: Option<Arc<dyn TokenStore>>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("request_config", &self.request_config)
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    pub(crate) fn new() -> Self {
        Self {
            base_url: None,
            request_config: Default::default(),
            http_client: None,
            user_agent: None,
            token_store: None,
        }
    }

    /// Set the base URL of the Noteleaf deployment.
    ///
    /// A trailing slash is added when missing, so endpoint paths always join
    /// below the configured prefix.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Self {
        self.base_url = Some(url.as_ref().to_owned());
        self
    }

    /// Set the default timeout and concurrency limits for all HTTP requests.
    pub fn request_config(mut self, request_config: RequestConfig) -> Self {
        self.request_config = request_config;
        self
    }

    /// Set a custom [`reqwest::Client`] to use for HTTP.
    ///
    /// Note: setting a custom client ignores [`user_agent`](Self::user_agent);
    /// configure that on the client you pass in.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Set a custom HTTP user agent for the client.
    pub fn user_agent(mut self, user_agent: impl AsRef<str>) -> Self {
        self.user_agent = Some(user_agent.as_ref().to_owned());
        self
    }

    /// Set the store the session token is persisted to.
    ///
    /// Defaults to an in-memory store, i.e. the session ends with the
    /// process. Use a [`FileTokenStore`](crate::store::FileTokenStore) to
    /// make sessions survive restarts.
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Create a [`Client`] with the options set on this builder.
    pub fn build(self) -> Result<Client, ClientBuildError> {
        let base_url = self.base_url.ok_or(ClientBuildError::MissingBaseUrl)?;
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let inner_http_client = match self.http_client {
            Some(client) => client,
            None => {
                let user_agent = self
                    .user_agent
                    .unwrap_or_else(|| {
                        concat!("noteleaf-sdk/", env!("CARGO_PKG_VERSION")).to_owned()
                    });
                reqwest::Client::builder().user_agent(user_agent).build()?
            }
        };

        let token_store =
            self.token_store.unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));

        let http_client = HttpClient::new(inner_http_client, self.request_config);
        let auth_ctx = AuthCtx::new(token_store);

        Ok(Client::new_inner(base_url, http_client, auth_ctx))
    }
}

/// Errors that can happen when building a `Client`.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// No base URL was configured.
    #[error("no base URL was configured")]
    MissingBaseUrl,

    /// The base URL could not be parsed.
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// Building the underlying HTTP client failed.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
