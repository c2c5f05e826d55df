// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

/// Contents API client errors.
#[non_exhaustive]
#[derive(Debug)]
pub enum RemoteError {
    /// Transport layer error (connection, timeout, TLS).
    Http(String),

    /// Server answered with an unexpected status code.
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, shortened.
        message: String,
    },

    /// Resource not found.
    NotFound(String),

    /// Version token mismatch (stale or missing `sha`).
    VersionConflict(String),

    /// Invalid response from server.
    InvalidResponse(String),

    /// Content could not be decoded (base64 or UTF-8).
    Decode(String),

    /// Configuration error.
    Config(String),
}

impl RemoteError {
    /// Whether retrying the same request later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429 || *status == 403,
            _ => false,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {e}"),
            Self::Status { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::NotFound(path) => write!(f, "Resource not found: {path}"),
            Self::VersionConflict(path) => write!(f, "Version conflict: {path}"),
            Self::InvalidResponse(e) => write!(f, "Invalid server response: {e}"),
            Self::Decode(e) => write!(f, "Decode error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}

impl From<base64::DecodeError> for RemoteError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Decode(format!("base64: {e}"))
    }
}

impl From<std::string::FromUtf8Error> for RemoteError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::Decode(format!("UTF-8: {e}"))
    }
}
