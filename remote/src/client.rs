// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Contents API client for file operations.

use std::sync::Arc;

use reqwest::Method;

use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::http::HttpClient;
use crate::request::{DeleteRequest, WriteRequest};
use crate::response::{ContentsResponse, FileResponse, WriteResponse};
use crate::types::{RemoteEntry, RemoteFile, RemotePath, VersionToken};

/// Client for a repository exposed through a GitHub-style contents API.
///
/// Every operation maps to exactly one HTTP call; nothing is retried here.
///
/// # Example
///
/// ```ignore
/// use cardsync_remote::{AuthMethod, ContentsClient, RemoteConfig, RemotePath};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RemoteConfig {
///     repository: "user/cards".to_string(),
///     auth: AuthMethod::Token { token: "ghp_...".to_string() },
///     ..Default::default()
/// };
///
/// let client = ContentsClient::new(config)?;
/// let file = client.read(&RemotePath::new("cards/card-1.md")).await?;
/// println!("{} @ {}", file.path, file.token);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ContentsClient {
    http: Arc<HttpClient>,
    config: RemoteConfig,
    base: String,
}

impl ContentsClient {
    /// Creates a new contents API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository identity is malformed or HTTP client
    /// initialization fails.
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        let (owner, repo) = config.owner_and_repo()?;
        let base = format!(
            "{}/repos/{}/{}/contents",
            config.base_url.trim_end_matches('/'),
            urlencoding::encode(owner),
            urlencoding::encode(repo),
        );
        let http = HttpClient::new(config.clone())?;
        Ok(Self {
            http: Arc::new(http),
            config,
            base,
        })
    }

    /// The branch this client reads from and writes to.
    #[must_use]
    pub fn branch(&self) -> &str {
        &self.config.branch
    }

    /// Reads a text file.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::NotFound`] if the file doesn't exist, or an error
    /// if the request fails or the content is not UTF-8.
    #[tracing::instrument(skip(self), fields(path = %path))]
    pub async fn read(&self, path: &RemotePath) -> Result<RemoteFile, RemoteError> {
        let file = self.get_file(path).await?;
        let content = file.decode_text()?;
        Ok(RemoteFile::new(path.clone(), content, file.token()))
    }

    /// Reads a binary file.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::NotFound`] if the file doesn't exist, or an error
    /// if the request fails.
    #[tracing::instrument(skip(self), fields(path = %path))]
    pub async fn read_binary(
        &self,
        path: &RemotePath,
    ) -> Result<(Vec<u8>, VersionToken), RemoteError> {
        let file = self.get_file(path).await?;
        Ok((file.decode()?, file.token()))
    }

    /// Creates or updates a text file.
    ///
    /// Passing `expected` replaces exactly that version; omitting it creates
    /// the file.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::VersionConflict`] on a stale or missing token.
    pub async fn write(
        &self,
        path: &RemotePath,
        content: &str,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, RemoteError> {
        self.write_binary(path, content.as_bytes(), expected).await
    }

    /// Creates or updates a binary file.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::VersionConflict`] on a stale or missing token.
    #[tracing::instrument(skip(self, bytes), fields(path = %path, len = bytes.len()))]
    pub async fn write_binary(
        &self,
        path: &RemotePath,
        bytes: &[u8],
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, RemoteError> {
        let url = self.contents_url(path);
        let body = WriteRequest::new(path, bytes, &self.config.branch, expected)
            .build()
            .map_err(|e| RemoteError::InvalidResponse(format!("Failed to encode request: {e}")))?;

        let resp = self
            .http
            .execute(
                self.http
                    .build_request(Method::PUT, &url)
                    .header("Content-Type", "application/json")
                    .body(body),
                path,
            )
            .await?;

        let written: WriteResponse = resp.json().await?;
        tracing::debug!(token = %written.content.sha, "file written");
        Ok(VersionToken::new(written.content.sha))
    }

    /// Deletes a file.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    #[tracing::instrument(skip(self), fields(path = %path, token = %token))]
    pub async fn delete(&self, path: &RemotePath, token: &VersionToken) -> Result<(), RemoteError> {
        let url = self.contents_url(path);
        let body = DeleteRequest::new(path, token, &self.config.branch)
            .build()
            .map_err(|e| RemoteError::InvalidResponse(format!("Failed to encode request: {e}")))?;

        self.http
            .execute(
                self.http
                    .build_request(Method::DELETE, &url)
                    .header("Content-Type", "application/json")
                    .body(body),
                path,
            )
            .await?;

        Ok(())
    }

    /// Lists a directory. An empty `dir` lists the repository root.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or `dir` names a file.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        let dir = RemotePath::new(dir);
        let url = self.contents_url(&dir);
        let resp = self
            .http
            .execute(
                self.http
                    .build_request(Method::GET, &url)
                    .query(&[("ref", self.config.branch.as_str())]),
                &dir,
            )
            .await?;

        match resp.json::<ContentsResponse>().await? {
            ContentsResponse::Dir(entries) => {
                tracing::debug!(count = entries.len(), "directory listed");
                Ok(entries.into_iter().map(Into::into).collect())
            }
            ContentsResponse::File(_) => Err(RemoteError::InvalidResponse(format!(
                "{dir} is a file, not a directory"
            ))),
        }
    }

    async fn get_file(&self, path: &RemotePath) -> Result<FileResponse, RemoteError> {
        let url = self.contents_url(path);
        let resp = self
            .http
            .execute(
                self.http
                    .build_request(Method::GET, &url)
                    .query(&[("ref", self.config.branch.as_str())]),
                path,
            )
            .await?;

        match resp.json::<ContentsResponse>().await? {
            ContentsResponse::File(file) => Ok(file),
            ContentsResponse::Dir(_) => Err(RemoteError::InvalidResponse(format!(
                "{path} is a directory, not a file"
            ))),
        }
    }

    /// Builds the full URL of a path, escaping each segment.
    fn contents_url(&self, path: &RemotePath) -> String {
        if path.is_empty() {
            return self.base.clone();
        }

        let escaped = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.base, escaped)
    }
}
