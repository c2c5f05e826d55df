// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use cardsync_remote::{
    ContentsClient, RemoteEntry, RemoteError, RemoteFile, RemotePath, VersionToken,
};

/// Versioned file store the engine synchronizes with.
///
/// Writes and deletes are guarded by the [`VersionToken`] of the replaced
/// version; a stale token yields [`RemoteError::VersionConflict`].
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Reads a text file.
    async fn read(&self, path: &RemotePath) -> Result<RemoteFile, RemoteError>;

    /// Reads a binary file.
    async fn read_binary(&self, path: &RemotePath)
    -> Result<(Vec<u8>, VersionToken), RemoteError>;

    /// Creates (`expected` is `None`) or replaces a text file.
    async fn write(
        &self,
        path: &RemotePath,
        content: &str,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, RemoteError>;

    /// Creates or replaces a binary file.
    async fn write_binary(
        &self,
        path: &RemotePath,
        bytes: &[u8],
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, RemoteError>;

    /// Deletes a file.
    async fn delete(&self, path: &RemotePath, token: &VersionToken) -> Result<(), RemoteError>;

    /// Lists the direct children of a directory.
    async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>, RemoteError>;
}

#[async_trait]
impl RemoteStore for ContentsClient {
    async fn read(&self, path: &RemotePath) -> Result<RemoteFile, RemoteError> {
        ContentsClient::read(self, path).await
    }

    async fn read_binary(
        &self,
        path: &RemotePath,
    ) -> Result<(Vec<u8>, VersionToken), RemoteError> {
        ContentsClient::read_binary(self, path).await
    }

    async fn write(
        &self,
        path: &RemotePath,
        content: &str,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, RemoteError> {
        ContentsClient::write(self, path, content, expected).await
    }

    async fn write_binary(
        &self,
        path: &RemotePath,
        bytes: &[u8],
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, RemoteError> {
        ContentsClient::write_binary(self, path, bytes, expected).await
    }

    async fn delete(&self, path: &RemotePath, token: &VersionToken) -> Result<(), RemoteError> {
        ContentsClient::delete(self, path, token).await
    }

    async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        ContentsClient::list(self, dir).await
    }
}
