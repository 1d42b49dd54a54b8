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

#![doc = include_str!("../README.md")]
#![warn(missing_debug_implementations, missing_docs)]

pub use async_trait::async_trait;
pub use reqwest;

mod account;
pub mod api;
mod authentication;
mod client;
pub mod config;
mod error;
mod guard;
mod http_client;
mod notes;
pub mod store;

pub use account::Account;
pub use authentication::{
    Auth, Session, SessionChange, SessionState, SessionStatus, SessionTokens,
};
pub use client::{Client, ClientBuildError, ClientBuilder};
pub use error::{ApiError, Error, HttpError, HttpResult, Result};
pub use guard::{RouteDecision, RouteGuard};
pub use notes::Notes;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;
