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

//! Error conditions.

use reqwest::{Error as ReqwestError, StatusCode};
use serde_json::Error as JsonError;
use thiserror::Error;
use url::ParseError as UrlParseError;

use crate::store::StoreError;

/// Result type of the noteleaf-sdk.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Result type of a pure HTTP request.
pub type HttpResult<T> = std::result::Result<T, HttpError>;

/// A non-2xx response from the Noteleaf API.
///
/// The backend is expected to attach a human readable `message` field to
/// error payloads; when it does, the message is carried here verbatim so it
/// can be shown to the user as-is (e.g. "Free plan limit reached" or
/// "Invalid credentials").
#[derive(Clone, Debug, Error)]
pub struct ApiError {
    /// The HTTP status code of the response.
    pub status: StatusCode,
    /// The human readable message extracted from the response body, if any.
    pub message: Option<String>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.status),
            None => write!(f, "{}", self.status),
        }
    }
}

impl ApiError {
    /// Whether this error means the presented credentials were rejected
    /// (HTTP 401 or 403).
    ///
    /// During session restore such an error invalidates the stored token,
    /// while any other failure is treated as transient.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
    }
}

/// An HTTP error, representing either a connection error or an error response
/// returned by the Noteleaf API.
#[derive(Debug, Error)]
pub enum HttpError {
    /// An error at the HTTP transport layer.
    #[error(transparent)]
    Reqwest(#[from] ReqwestError),

    /// Queried endpoint requires authentication but was called on an
    /// anonymous client.
    #[error("the queried endpoint requires authentication but was called before logging in")]
    AuthenticationRequired,

    /// The API returned a non-2xx response.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The endpoint path could not be joined onto the base URL.
    #[error(transparent)]
    Url(#[from] UrlParseError),

    /// The response body could not be deserialized.
    #[error(transparent)]
    Json(#[from] JsonError),
}

impl HttpError {
    /// If `self` is [`Api`](Self::Api), returns the inner [`ApiError`].
    ///
    /// Otherwise, returns `None`.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Whether this error is a rejection of the presented credentials
    /// (HTTP 401 or 403).
    pub fn is_unauthorized(&self) -> bool {
        self.as_api_error().is_some_and(ApiError::is_unauthorized)
    }
}

/// Internal representation of errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Error doing an HTTP request.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Queried endpoint requires authentication but was called on an
    /// anonymous client.
    #[error("the queried endpoint requires authentication but was called before logging in")]
    AuthenticationRequired,

    /// An error de/serializing JSON.
    #[error(transparent)]
    SerdeJson(#[from] JsonError),

    /// An error occurred in the token store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An error encountered when trying to parse a URL.
    #[error(transparent)]
    Url(#[from] UrlParseError),
}

impl Error {
    /// If this error carries an API error payload, returns it.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Http(e) => e.as_api_error(),
            _ => None,
        }
    }

    /// The human readable message the backend attached to this error, if any.
    ///
    /// Callers rendering errors to a user should fall back to an
    /// operation-specific generic message when this returns `None`; transport
    /// errors in particular never carry a backend message.
    pub fn api_message(&self) -> Option<&str> {
        self.as_api_error()?.message.as_deref()
    }

    /// Whether this error is a rejection of the presented credentials
    /// (HTTP 401 or 403).
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Http(e) => e.is_unauthorized(),
            _ => false,
        }
    }
}
