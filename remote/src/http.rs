// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP client wrapper with authentication and status mapping.

use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::config::{AuthMethod, RemoteConfig};
use crate::error::RemoteError;
use crate::response::error_message;

/// HTTP client for contents API operations.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    config: RemoteConfig,
}

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client creation fails.
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client, config })
    }

    /// Builds a request with authentication headers.
    pub fn build_request(&self, method: reqwest::Method, url: &str) -> RequestBuilder {
        let mut req = self
            .client
            .request(method, url)
            .header("Accept", "application/vnd.github+json");

        match &self.config.auth {
            AuthMethod::Token { token } => {
                req = req.header("Authorization", format!("token {token}"));
            }
            AuthMethod::Bearer { token } => {
                req = req.bearer_auth(token);
            }
            AuthMethod::Basic { username, password } => {
                req = req.basic_auth(username, Some(password));
            }
            AuthMethod::None => {}
        }

        req
    }

    /// Executes a request and maps error statuses.
    ///
    /// `path` names the addressed file in the returned errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or returns an error status code.
    pub async fn execute(&self, req: RequestBuilder, path: &str) -> Result<Response, RemoteError> {
        let resp = req.send().await?;

        match resp.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => Ok(resp),
            StatusCode::NOT_FOUND => Err(RemoteError::NotFound(path.to_string())),
            StatusCode::CONFLICT => Err(RemoteError::VersionConflict(path.to_string())),
            status => {
                let text = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read response".to_string());
                let message = error_message(&text);

                // a missing `sha` on an existing file is reported as 422
                if status == StatusCode::UNPROCESSABLE_ENTITY && message.contains("sha") {
                    tracing::debug!(path, %message, "treating 422 as version conflict");
                    return Err(RemoteError::VersionConflict(path.to_string()));
                }

                Err(RemoteError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}
