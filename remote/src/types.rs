// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::ops::Deref;

/// Path of a file inside the repository.
///
/// A `RemotePath` is relative to the repository root, such as
/// `cards/card-1234.md`, and never starts with a slash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RemotePath(String);

impl RemotePath {
    /// Creates a new `RemotePath`, stripping leading and trailing slashes.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let trimmed = path.trim_matches('/');
        if trimmed.len() == path.len() {
            Self(path)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Joins a directory and a file name.
    #[must_use]
    pub fn join(dir: &str, name: &str) -> Self {
        let dir = dir.trim_matches('/');
        if dir.is_empty() {
            Self::new(name)
        } else {
            Self::new(format!("{dir}/{name}"))
        }
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last path segment.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The path without its last segment, empty for top-level files.
    #[must_use]
    pub fn parent(&self) -> &str {
        self.0.rsplit_once('/').map_or("", |(dir, _)| dir)
    }
}

impl Deref for RemotePath {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for RemotePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RemotePath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<&str> for RemotePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Version token of a stored file.
///
/// A `VersionToken` is the content hash (`sha`) returned by the server. It is
/// used for optimistic concurrency: writes and deletes must present the token
/// of the version they replace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    /// Creates a new `VersionToken` from a string.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A short prefix suitable for file names and log lines.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl Deref for VersionToken {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for VersionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for VersionToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for VersionToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

/// Kind of a directory listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Sub-directory.
    Dir,
    /// Anything else the server reports (symlinks, submodules).
    Other,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Path of the entry.
    pub path: RemotePath,
    /// Version token of the entry.
    pub token: VersionToken,
    /// Entry kind.
    pub kind: EntryKind,
}

impl RemoteEntry {
    /// Creates a new file entry.
    #[must_use]
    pub const fn file(path: RemotePath, token: VersionToken) -> Self {
        Self {
            path,
            token,
            kind: EntryKind::File,
        }
    }
}

/// A text file read from the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Path of the file.
    pub path: RemotePath,
    /// UTF-8 content.
    pub content: String,
    /// Version token of this content.
    pub token: VersionToken,
}

impl RemoteFile {
    /// Creates a new `RemoteFile`.
    #[must_use]
    pub const fn new(path: RemotePath, content: String, token: VersionToken) -> Self {
        Self {
            path,
            content,
            token,
        }
    }
}
