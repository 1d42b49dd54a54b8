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

//! Durable client-side storage for the session token.
//!
//! The bearer token is the only piece of state this crate persists. Where it
//! lives is up to the application: the default [`MemoryTokenStore`] keeps it
//! for the lifetime of the process, while [`FileTokenStore`] writes it to a
//! well-known path so a session survives restarts.

use std::{io, path::PathBuf, sync::RwLock};

use async_trait::async_trait;
use thiserror::Error;

use crate::authentication::SessionTokens;

/// Errors the token store can run into.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An IO error happened while reading or writing the backing storage.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The stored token document could not be de/serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Abstraction over the place the bearer token is persisted to.
///
/// Implementations must be cheap to call repeatedly; `load` runs once per
/// [`restore`](crate::Auth::restore) and `save`/`remove` once per login and
/// logout respectively.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the previously stored tokens, if any.
    async fn load(&self) -> Result<Option<SessionTokens>, StoreError>;

    /// Persist the given tokens, replacing anything stored before.
    async fn save(&self, tokens: &SessionTokens) -> Result<(), StoreError>;

    /// Remove the stored tokens. Removing an empty store is not an error.
    async fn remove(&self) -> Result<(), StoreError>;
}

/// A [`TokenStore`] that keeps the token in process memory.
///
/// This is the default store; a session backed by it ends with the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Option<SessionTokens>>,
}

impl MemoryTokenStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an in-memory store that already holds the given tokens, as if a
    /// previous session had saved them.
    pub fn with_tokens(tokens: SessionTokens) -> Self {
        Self { tokens: RwLock::new(Some(tokens)) }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<SessionTokens>, StoreError> {
        Ok(self.tokens.read().expect("store lock poisoned").clone())
    }

    async fn save(&self, tokens: &SessionTokens) -> Result<(), StoreError> {
        *self.tokens.write().expect("store lock poisoned") = Some(tokens.clone());
        Ok(())
    }

    async fn remove(&self) -> Result<(), StoreError> {
        *self.tokens.write().expect("store lock poisoned") = None;
        Ok(())
    }
}

/// A [`TokenStore`] that writes the token to a single JSON document on disk.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store backed by the given path.
    ///
    /// The file and missing parent directories are created on the first
    /// `save`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<SessionTokens>, StoreError> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&contents)?))
    }

    async fn save(&self, tokens: &SessionTokens) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_vec(tokens)?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }

    async fn remove(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
