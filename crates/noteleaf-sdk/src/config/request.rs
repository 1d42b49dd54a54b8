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

use std::{fmt, num::NonZeroUsize, time::Duration};

use crate::http_client::DEFAULT_REQUEST_TIMEOUT;

/// Configuration for requests the `Client` makes.
///
/// This sets how long a request is allowed to take and how many requests may
/// be in flight at once. Requests are never retried automatically; a failed
/// request surfaces as an error and it is up to the caller to decide whether
/// to repeat it.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use noteleaf_sdk::config::RequestConfig;
///
/// let request_config = RequestConfig::new().timeout(Duration::from_secs(10));
/// ```
#[derive(Copy, Clone)]
pub struct RequestConfig {
    pub(crate) timeout: Duration,
    pub(crate) max_concurrent_requests: Option<NonZeroUsize>,
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { timeout, max_concurrent_requests } = self;

        let mut res = fmt.debug_struct("RequestConfig");
        res.field("timeout", timeout);
        if let Some(max_concurrent_requests) = max_concurrent_requests {
            res.field("max_concurrent_requests", max_concurrent_requests);
        }
        res.finish()
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { timeout: DEFAULT_REQUEST_TIMEOUT, max_concurrent_requests: None }
    }
}

impl RequestConfig {
    /// Create a new default `RequestConfig`.
    #[must_use]
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the timeout duration for all HTTP requests.
    ///
    /// Defaults to 30 seconds.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The total limit of requests that are pending or run concurrently.
    /// Any additional request beyond that number will be waiting until another
    /// concurrent request finished. Requests are queued fairly.
    #[must_use]
    pub fn max_concurrent_requests(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.max_concurrent_requests = limit;
        self
    }
}
