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

use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, instrument};
use url::Url;

use crate::{
    api::ApiErrorBody,
    config::RequestConfig,
    error::{ApiError, HttpError},
};

pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
struct MaybeSemaphore(Arc<Option<Semaphore>>);

#[allow(dead_code)] // false-positive lint: we never use it but only hold it for the drop
struct MaybeSemaphorePermit<'a>(Option<SemaphorePermit<'a>>);

impl MaybeSemaphore {
    fn new(max: Option<NonZeroUsize>) -> Self {
        let inner = max.map(|i| Semaphore::new(i.into()));
        MaybeSemaphore(Arc::new(inner))
    }

    async fn acquire(&self) -> MaybeSemaphorePermit<'_> {
        match self.0.as_ref() {
            Some(inner) => {
                // This can only ever error if the semaphore was closed,
                // which we never do, so we can safely ignore any error case
                MaybeSemaphorePermit(inner.acquire().await.ok())
            }
            None => MaybeSemaphorePermit(None),
        }
    }
}

/// Thin wrapper around [`reqwest::Client`] that attaches the bearer token
/// explicitly per request.
///
/// The token is always an argument to [`send`](Self::send) rather than an
/// ambient default header, so no request can accidentally go out with the
/// credentials of a previous session.
#[derive(Clone, Debug)]
pub(crate) struct HttpClient {
    pub(crate) inner: reqwest::Client,
    pub(crate) request_config: RequestConfig,
    concurrent_request_semaphore: MaybeSemaphore,
    next_request_id: Arc<AtomicU64>,
}

impl HttpClient {
    pub(crate) fn new(inner: reqwest::Client, request_config: RequestConfig) -> Self {
        HttpClient {
            inner,
            request_config,
            concurrent_request_semaphore: MaybeSemaphore::new(
                request_config.max_concurrent_requests,
            ),
            next_request_id: AtomicU64::new(0).into(),
        }
    }

    fn get_request_id(&self) -> String {
        let request_id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        format!("REQ-{request_id}")
    }

    /// Send a request and deserialize the response body.
    pub(crate) async fn send<B, R>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        access_token: Option<&str>,
        config: Option<RequestConfig>,
    ) -> Result<R, HttpError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let bytes = self.send_raw(method, url, body, access_token, config).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send a request, discarding the response body.
    pub(crate) async fn send_unit<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        access_token: Option<&str>,
        config: Option<RequestConfig>,
    ) -> Result<(), HttpError>
    where
        B: Serialize + ?Sized,
    {
        self.send_raw(method, url, body, access_token, config).await?;
        Ok(())
    }

    #[instrument(
        skip(self, body, access_token, config),
        fields(request_id, status, response_size)
    )]
    async fn send_raw<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        access_token: Option<&str>,
        config: Option<RequestConfig>,
    ) -> Result<Vec<u8>, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let config = config.unwrap_or(self.request_config);

        let span = tracing::Span::current();
        span.record("request_id", self.get_request_id());

        let mut request = self.inner.request(method, url).timeout(config.timeout);
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        // will be automatically dropped at the end of this function
        let _handle = self.concurrent_request_semaphore.acquire().await;

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Error while sending request: {e:?}");
                return Err(e.into());
            }
        };

        let status = response.status();
        span.record("status", status.as_u16());

        let bytes = response.bytes().await?;
        span.record("response_size", bytes.len());

        if status.is_success() {
            debug!("Got response");
            Ok(bytes.to_vec())
        } else {
            let message =
                serde_json::from_slice::<ApiErrorBody>(&bytes).ok().and_then(ApiErrorBody::into_message);
            debug!("Got error response: {status}");
            Err(ApiError { status, message }.into())
        }
    }
}
