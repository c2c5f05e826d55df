// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use cardsync_remote::RemoteError;

/// Failure to read a card artifact.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactError {
    /// The leading `---` metadata block is missing.
    #[error("artifact has no metadata block")]
    MissingMetadata,

    /// The metadata block is not a valid key/value document.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// The question or answer marker is missing, or they are out of order.
    #[error("artifact has no question/answer section")]
    MissingQuestionAnswer,
}

/// Failure reported by the host application.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    /// Creates a new host error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<sqlx::Error> for HostError {
    fn from(e: sqlx::Error) -> Self {
        Self(format!("database error: {e}"))
    }
}

impl From<serde_json::Error> for HostError {
    fn from(e: serde_json::Error) -> Self {
        Self(format!("invalid stored value: {e}"))
    }
}

/// Errors raised by the synchronization engine.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A remote artifact could not be parsed. Not retried.
    #[error("malformed artifact: {0}")]
    MalformedArtifact(#[from] ArtifactError),

    /// The remote version changed since it was last seen.
    #[error("version conflict at {0}")]
    VersionConflict(String),

    /// Network or server failure. Retried later.
    #[error("transport error: {0}")]
    Transport(RemoteError),

    /// The remote artifact does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Required configuration is absent.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    /// The host application failed.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// The identity map or retry queue could not be loaded or saved.
    #[error("state error: {0}")]
    State(String),

    /// An identity map entry was rejected.
    #[error("invalid identity entry: {0}")]
    InvalidEntry(String),
}

impl SyncError {
    /// Whether a failed push should be queued for a later attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::VersionConflict(_) | Self::Host(_) | Self::State(_)
        )
    }
}

impl From<RemoteError> for SyncError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::NotFound(path) => Self::NotFound(path),
            RemoteError::VersionConflict(path) => Self::VersionConflict(path),
            RemoteError::Config(message) => Self::ConfigurationMissing(message),
            e => Self::Transport(e),
        }
    }
}
