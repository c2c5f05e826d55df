// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Response parsers for the contents API.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use crate::error::RemoteError;
use crate::types::{EntryKind, RemoteEntry, RemotePath, VersionToken};

/// `GET /contents/{path}` answers with an object for files and an array for
/// directories.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ContentsResponse {
    /// Directory listing.
    Dir(Vec<DirEntryResponse>),
    /// Single file.
    File(FileResponse),
}

/// File payload.
#[derive(Debug, Clone, Deserialize)]
pub struct FileResponse {
    /// Path of the file.
    pub path: Option<String>,
    /// Version token.
    pub sha: String,
    /// Encoded content; absent or empty for large files.
    #[serde(default)]
    pub content: Option<String>,
    /// Content encoding, `base64` in practice.
    #[serde(default)]
    pub encoding: Option<String>,
}

impl FileResponse {
    /// Decodes the file content into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is missing or not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, RemoteError> {
        let content = self.content.as_deref().unwrap_or_default();
        match self.encoding.as_deref() {
            Some("base64") | None => {
                // the server wraps base64 payloads every 60 columns
                let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
                Ok(STANDARD.decode(compact)?)
            }
            Some(other) => Err(RemoteError::InvalidResponse(format!(
                "unsupported content encoding '{other}'"
            ))),
        }
    }

    /// Decodes the file content as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_text(&self) -> Result<String, RemoteError> {
        Ok(String::from_utf8(self.decode()?)?)
    }

    /// The version token.
    #[must_use]
    pub fn token(&self) -> VersionToken {
        VersionToken::new(self.sha.clone())
    }
}

/// Directory listing item.
#[derive(Debug, Clone, Deserialize)]
pub struct DirEntryResponse {
    /// Path of the entry.
    pub path: String,
    /// Version token of the entry.
    pub sha: String,
    /// Entry type (`file`, `dir`, `symlink`, `submodule`).
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl From<DirEntryResponse> for RemoteEntry {
    fn from(entry: DirEntryResponse) -> Self {
        let kind = match entry.kind.as_deref() {
            Some("file") | None => EntryKind::File,
            Some("dir") => EntryKind::Dir,
            Some(_) => EntryKind::Other,
        };
        Self {
            path: RemotePath::new(entry.path),
            token: VersionToken::new(entry.sha),
            kind,
        }
    }
}

/// Create-or-update payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WriteResponse {
    /// Stored file description.
    pub content: WrittenContent,
}

/// The `content` object of a write response.
#[derive(Debug, Clone, Deserialize)]
pub struct WrittenContent {
    /// New version token.
    pub sha: String,
}

/// Error payload returned with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Human readable message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Extracts a short message from an error body.
pub fn error_message(body: &str) -> String {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.to_string());
    message.trim().chars().take(180).collect()
}
