// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::RemoteError;

/// Authentication method for the contents API.
#[derive(Clone, Default, serde::Deserialize)]
#[serde(tag = "type")]
pub enum AuthMethod {
    /// No authentication.
    #[serde(rename = "none")]
    #[default]
    None,
    /// Personal access token, sent as `Authorization: token <token>`.
    #[serde(rename = "token")]
    Token {
        /// Access token.
        token: String,
    },
    /// Bearer token authentication (OAuth / GitHub App).
    #[serde(rename = "bearer")]
    Bearer {
        /// Bearer token.
        token: String,
    },
    /// Basic authentication (username/password).
    #[serde(rename = "basic")]
    Basic {
        /// Username for authentication.
        username: String,
        /// Password for authentication.
        password: String,
    },
}

impl AuthMethod {
    /// Whether any credential is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        match self {
            Self::None => false,
            Self::Token { token } | Self::Bearer { token } => !token.trim().is_empty(),
            Self::Basic { username, .. } => !username.trim().is_empty(),
        }
    }
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Token { .. } => f.debug_struct("Token").field("token", &"[REDACTED]").finish(),
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"[REDACTED]")
                .finish(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Remote repository configuration.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the contents API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Repository identity in `owner/repo` form.
    pub repository: String,
    /// Branch that holds the artifacts.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Authentication method.
    #[serde(default)]
    pub auth: AuthMethod,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl RemoteConfig {
    /// Splits the repository identity into owner and name.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository is not in `owner/repo` form.
    pub fn owner_and_repo(&self) -> Result<(&str, &str), RemoteError> {
        match self.repository.trim().split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok((owner, repo))
            }
            _ => Err(RemoteError::Config(format!(
                "repository must be in owner/repo form, got '{}'",
                self.repository
            ))),
        }
    }
}

fn default_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

const fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("cardsync-remote/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            repository: String::new(),
            branch: default_branch(),
            auth: AuthMethod::default(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}
