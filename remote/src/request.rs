// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Request bodies for the contents API.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use crate::types::VersionToken;

/// Body of a create-or-update (`PUT`) request.
#[derive(Debug, Clone, Serialize)]
pub struct WriteRequest<'a> {
    /// Commit message.
    pub message: String,
    /// Base64 encoded file content.
    pub content: String,
    /// Target branch.
    pub branch: &'a str,
    /// Version token of the replaced file; omitted on creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
}

impl<'a> WriteRequest<'a> {
    /// Builds a write request for raw bytes.
    #[must_use]
    pub fn new(path: &str, bytes: &[u8], branch: &'a str, sha: Option<&'a VersionToken>) -> Self {
        Self {
            message: format!("Update {path}"),
            content: STANDARD.encode(bytes),
            branch,
            sha: sha.map(VersionToken::as_str),
        }
    }

    /// Serializes the request to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn build(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Body of a `DELETE` request.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteRequest<'a> {
    /// Commit message.
    pub message: String,
    /// Version token of the deleted file.
    pub sha: &'a str,
    /// Target branch.
    pub branch: &'a str,
}

impl<'a> DeleteRequest<'a> {
    /// Builds a delete request.
    #[must_use]
    pub fn new(path: &str, sha: &'a VersionToken, branch: &'a str) -> Self {
        Self {
            message: format!("Delete {path}"),
            sha: sha.as_str(),
            branch,
        }
    }

    /// Serializes the request to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn build(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
