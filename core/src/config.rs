// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cardsync_remote::{AuthMethod, RemoteConfig, RemotePath};

use crate::card::CardId;
use crate::error::SyncError;
use crate::identity::file_name;
use crate::resolver::ConflictPolicy;

/// The name of the cardsync application.
pub const APP_NAME: &str = "cardsync";

/// Side directory for conflict records, relative to the artifact directory.
pub const CONFLICTS_DIR: &str = "conflicts";

/// How artifact file names are chosen for new cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilenameStrategy {
    /// `<id>.md`
    #[default]
    Id,
    /// `<slug>--<id>.md`, slug derived from the question.
    Slug,
}

/// What happens to a local card whose remote artifact was deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemoteDeleteAction {
    /// Tag the card as archived.
    #[default]
    Archive,
    /// Delete the card.
    Delete,
    /// Leave the card alone.
    Keep,
}

/// Configuration of the synchronization engine.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SyncConfig {
    /// Repository identity in `owner/repo` form.
    #[serde(default)]
    pub repository: String,

    /// Branch that holds the artifacts.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Base URL of the contents API, if not the public GitHub API.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Directory of the artifacts inside the repository.
    #[serde(default)]
    pub subdir: String,

    /// Credentials.
    #[serde(default)]
    pub auth: AuthMethod,

    /// Conflict resolution policy.
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,

    /// Push cards as soon as they change.
    #[serde(default = "default_true")]
    pub auto_push: bool,

    /// Pull periodically.
    #[serde(default = "default_true")]
    pub auto_pull: bool,

    /// Minutes between periodic pulls.
    #[serde(default = "default_interval")]
    pub pull_interval_minutes: u64,

    /// Minutes between retry queue drains.
    #[serde(default = "default_interval")]
    pub retry_interval_minutes: u64,

    /// Seconds to wait for more changes before pushing.
    #[serde(default = "default_debounce")]
    pub debounce_secs: u64,

    /// File names of new artifacts.
    #[serde(default)]
    pub filename_strategy: FilenameStrategy,

    /// Maximum number of cards synchronized concurrently.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Reaction to remote deletions.
    #[serde(default)]
    pub on_remote_delete: RemoteDeleteAction,

    /// Directory for storing application state.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            repository: String::new(),
            branch: default_branch(),
            base_url: None,
            subdir: String::new(),
            auth: AuthMethod::None,
            conflict_policy: ConflictPolicy::default(),
            auto_push: true,
            auto_pull: true,
            pull_interval_minutes: default_interval(),
            retry_interval_minutes: default_interval(),
            debounce_secs: default_debounce(),
            filename_strategy: FilenameStrategy::default(),
            workers: default_workers(),
            on_remote_delete: RemoteDeleteAction::default(),
            state_dir: None,
        }
    }
}

impl SyncConfig {
    /// Checks that everything needed to talk to the remote is present.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ConfigurationMissing`] naming the missing setting.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.repository.trim().is_empty() {
            return Err(SyncError::ConfigurationMissing(
                "repository is not set".to_string(),
            ));
        }
        self.remote_config()
            .owner_and_repo()
            .map_err(|e| SyncError::ConfigurationMissing(e.to_string()))?;
        if !self.auth.is_configured() {
            return Err(SyncError::ConfigurationMissing(
                "access token is not set".to_string(),
            ));
        }
        if self.branch.trim().is_empty() {
            return Err(SyncError::ConfigurationMissing(
                "branch is not set".to_string(),
            ));
        }
        Ok(())
    }

    /// Normalize the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured path cannot be expanded.
    pub fn normalize(&mut self) -> Result<(), Box<dyn Error>> {
        self.subdir = self.subdir.trim_matches('/').to_string();
        self.workers = self.workers.max(1);

        match &self.state_dir {
            Some(a) => {
                self.state_dir = Some(
                    expand_path(a)
                        .map_err(|e| format!("Failed to expand state directory path: {e}"))?,
                );
            }
            None => match get_state_dir() {
                Ok(a) => self.state_dir = Some(a.join(APP_NAME)),
                Err(e) => tracing::warn!("Failed to get state directory: {e}"),
            },
        }

        Ok(())
    }

    /// Settings of the remote client.
    #[must_use]
    pub fn remote_config(&self) -> RemoteConfig {
        let mut config = RemoteConfig {
            repository: self.repository.trim().to_string(),
            branch: self.branch.clone(),
            auth: self.auth.clone(),
            ..Default::default()
        };
        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
        }
        config
    }

    /// Directory of the artifacts, without slashes at either end.
    #[must_use]
    pub fn artifact_dir(&self) -> &str {
        self.subdir.trim_matches('/')
    }

    /// Path of the artifact for a new card.
    #[must_use]
    pub fn artifact_path(&self, id: &CardId, slug: Option<&str>) -> RemotePath {
        let slug = match self.filename_strategy {
            FilenameStrategy::Slug => slug,
            FilenameStrategy::Id => None,
        };
        RemotePath::join(self.artifact_dir(), &file_name(id, slug))
    }

    /// Directory of conflict records.
    #[must_use]
    pub fn conflicts_dir(&self) -> String {
        RemotePath::join(self.artifact_dir(), CONFLICTS_DIR).to_string()
    }

    /// Interval of periodic pulls, `None` when disabled.
    #[must_use]
    pub fn pull_interval(&self) -> Option<Duration> {
        (self.auto_pull && self.pull_interval_minutes > 0)
            .then(|| Duration::from_secs(self.pull_interval_minutes * 60))
    }

    /// Interval of retry queue drains.
    #[must_use]
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_minutes.max(1) * 60)
    }

    /// Quiet period before pushing changed cards.
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }
}

fn default_branch() -> String {
    "main".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_interval() -> u64 {
    5
}

const fn default_debounce() -> u64 {
    2
}

const fn default_workers() -> usize {
    4
}

/// Handle tilde (~) and environment variables in the path
pub fn expand_path(path: &Path) -> Result<PathBuf, Box<dyn Error>> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }

    let path = path.to_str().ok_or("Invalid path")?;

    // Handle tilde and home directory
    let home_prefixes: &[&str] = if cfg!(unix) {
        &["~/", "$HOME/", "${HOME}/"]
    } else {
        &[r"~\", "~/", r"%UserProfile%\", r"%UserProfile%/"]
    };
    for prefix in home_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_home_dir()?.join(stripped));
        }
    }

    // Handle config directories
    let config_prefixes: &[&str] = if cfg!(unix) {
        &["$XDG_CONFIG_HOME/", "${XDG_CONFIG_HOME}/"]
    } else {
        &[r"%LOCALAPPDATA%\", "%LOCALAPPDATA%/"]
    };
    for prefix in config_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_config_dir()?.join(stripped));
        }
    }

    Ok(path.into())
}

fn get_home_dir() -> Result<PathBuf, Box<dyn Error>> {
    dirs::home_dir().ok_or_else(|| "User-specific home directory not found".into())
}

/// User-specific configuration directory.
///
/// # Errors
///
/// Returns an error if the platform reports no such directory.
pub fn get_config_dir() -> Result<PathBuf, Box<dyn Error>> {
    #[cfg(unix)]
    let config_dir = xdg::BaseDirectories::new().get_config_home();
    #[cfg(windows)]
    let config_dir = dirs::config_dir();
    config_dir.ok_or_else(|| "User-specific config directory not found".into())
}

fn get_state_dir() -> Result<PathBuf, Box<dyn Error>> {
    #[cfg(unix)]
    let state_dir = xdg::BaseDirectories::new().get_state_home();
    #[cfg(windows)]
    let state_dir = dirs::data_dir();
    state_dir.ok_or_else(|| "User-specific state directory not found".into())
}
