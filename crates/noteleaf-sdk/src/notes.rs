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

//! A high-level API to work with the notes of the logged-in tenant.

use reqwest::Method;

use crate::{
    api::{paths, Note, NoteContentRequest},
    error::Result,
    Client,
};

/// A high-level API to create, read, update and delete notes.
///
/// All operations are implicitly scoped to the logged-in tenant through the
/// bearer token; there is no way to address another tenant's notes. To access
/// this API, use [`Client::notes()`](crate::Client::notes).
#[derive(Debug, Clone)]
pub struct Notes {
    client: Client,
}

impl Notes {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// List all notes of the tenant.
    pub async fn list(&self) -> Result<Vec<Note>> {
        self.client.send_authenticated::<(), _>(Method::GET, paths::NOTES, None).await
    }

    /// Create a new note.
    ///
    /// On the free plan the backend enforces a note cap; hitting it fails
    /// with a 403 whose message (e.g. "Free plan limit reached") is carried
    /// on the returned error verbatim, see
    /// [`Error::api_message`](crate::Error::api_message).
    pub async fn create(&self, title: &str, content: &str) -> Result<Note> {
        self.client
            .send_authenticated(Method::POST, paths::NOTES, Some(&NoteContentRequest { title, content }))
            .await
    }

    /// Replace title and content of an existing note.
    pub async fn update(&self, id: &str, title: &str, content: &str) -> Result<Note> {
        self.client
            .send_authenticated(
                Method::PUT,
                &paths::note(id),
                Some(&NoteContentRequest { title, content }),
            )
            .await
    }

    /// Delete a note.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.send_authenticated_unit::<()>(Method::DELETE, &paths::note(id), None).await
    }
}
