// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Push and pull protocols between the host and the remote store.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use cardsync_remote::{EntryKind, RemoteEntry, RemoteError, RemoteFile, RemotePath, VersionToken};
use futures::{StreamExt, TryStreamExt, stream};
use jiff::Timestamp;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::artifact::{self, ParsedArtifact};
use crate::card::{ARCHIVED_TAG, Card, CardId, CardPatch};
use crate::config::{RemoteDeleteAction, SyncConfig};
use crate::error::{ArtifactError, SyncError};
use crate::host::{AlwaysConfirm, CardHost, ConfirmDeletion, KvStore};
use crate::identity::{IdentityEntry, IdentityMap, slugify, split_file_name};
use crate::locks::CardLocks;
use crate::media::{HttpFetcher, MediaFetcher, MediaTranslator};
use crate::resolver::{ConflictPolicy, Resolution, resolve};
use crate::retry::RetryQueue;
use crate::store::RemoteStore;

/// Result of pushing one card.
#[derive(Debug)]
pub enum PushOutcome {
    /// The artifact was written.
    Written {
        /// Path of the artifact.
        path: RemotePath,
        /// New version token.
        token: VersionToken,
    },
    /// The remote already holds this version of the card.
    Unchanged,
    /// The card is archived and not tracked remotely, so it was not pushed.
    Skipped,
    /// The card no longer exists locally.
    Missing,
    /// The remote version won a conflict and was applied locally.
    RemoteApplied {
        /// Version token of the applied artifact.
        token: VersionToken,
    },
    /// Both sides changed and neither won; a conflict record was written.
    Conflict {
        /// Path of the conflict record.
        record: RemotePath,
    },
    /// The push failed and the card was queued for retry.
    Queued(SyncError),
    /// The push failed and will not be retried.
    Failed(SyncError),
}

impl PushOutcome {
    /// Whether the attempt ended in a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Queued(_) | Self::Failed(_))
    }
}

impl fmt::Display for PushOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written { path, .. } => write!(f, "written to {path}"),
            Self::Unchanged => f.write_str("unchanged"),
            Self::Skipped => f.write_str("skipped (archived)"),
            Self::Missing => f.write_str("missing locally"),
            Self::RemoteApplied { .. } => f.write_str("remote version applied"),
            Self::Conflict { record } => write!(f, "conflict recorded at {record}"),
            Self::Queued(e) => write!(f, "queued for retry: {e}"),
            Self::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// What happened to a local card whose artifact was deleted remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// The card was tagged as archived.
    Archived,
    /// The card was deleted.
    Deleted,
    /// The card was left alone by configuration.
    Kept,
    /// Deletion was not confirmed.
    Declined,
    /// The card did not exist locally.
    Missing,
}

/// Summary of a pull.
#[derive(Debug, Default)]
pub struct PullReport {
    /// Cards created from new artifacts.
    pub created: Vec<CardId>,
    /// Cards updated from remote artifacts.
    pub updated: Vec<CardId>,
    /// Cards whose local version won; they are overwritten on the next push.
    pub kept_local: Vec<CardId>,
    /// Conflict records written.
    pub conflicts: Vec<RemotePath>,
    /// Listed artifacts that had not changed.
    pub unchanged: usize,
    /// Cards whose artifact disappeared.
    pub removed: Vec<(CardId, DeletionOutcome)>,
    /// Artifacts that could not be processed.
    pub failed: Vec<(RemotePath, SyncError)>,
}

impl PullReport {
    fn sort(&mut self) {
        self.created.sort();
        self.updated.sort();
        self.kept_local.sort();
        self.conflicts.sort();
        self.removed.sort_by(|a, b| a.0.cmp(&b.0));
        self.failed.sort_by(|a, b| a.0.cmp(&b.0));
    }
}

/// Summary of a full synchronization pass.
#[derive(Debug)]
pub struct SyncReport {
    /// Pull phase.
    pub pull: PullReport,
    /// Push phase.
    pub push: Vec<(CardId, PushOutcome)>,
}

/// Snapshot of the engine state.
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// Repository identity.
    pub repository: String,
    /// Artifact directory.
    pub directory: String,
    /// Conflict policy in effect.
    pub policy: ConflictPolicy,
    /// Number of cards with an identity entry.
    pub tracked: usize,
    /// Cards waiting for a retry.
    pub queued: Vec<CardId>,
}

/// Identity map and retry queue, persisted through the host key-value store.
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    /// Identity map.
    pub identity: IdentityMap,
    /// Retry queue.
    pub retry: RetryQueue,
}

impl SyncState {
    /// Loads both parts of the state.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::State`] if a stored value is unreadable.
    pub async fn load(kv: &dyn KvStore) -> Result<Self, SyncError> {
        Ok(Self {
            identity: IdentityMap::load(kv).await?,
            retry: RetryQueue::load(kv).await?,
        })
    }

    /// Persists both parts of the state.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::State`] if the store rejects a write.
    pub async fn persist(&self, kv: &dyn KvStore) -> Result<(), SyncError> {
        self.identity.persist(kv).await?;
        self.retry.persist(kv).await
    }
}

enum PullStep {
    Unchanged,
    Created(CardId),
    Updated(CardId),
    KeptLocal(CardId),
    Conflict(RemotePath),
}

/// The synchronization engine.
///
/// Operations on the same card are serialized; different cards proceed
/// concurrently up to the configured number of workers.
pub struct SyncEngine {
    config: SyncConfig,
    store: Arc<dyn RemoteStore>,
    host: Arc<dyn CardHost>,
    kv: Arc<dyn KvStore>,
    confirm: Arc<dyn ConfirmDeletion>,
    fetcher: Arc<dyn MediaFetcher>,
    state: Mutex<SyncState>,
    locks: CardLocks,
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Creates an engine, loading the persisted state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be loaded.
    pub async fn new(
        config: SyncConfig,
        store: Arc<dyn RemoteStore>,
        host: Arc<dyn CardHost>,
        kv: Arc<dyn KvStore>,
    ) -> Result<Self, SyncError> {
        let state = SyncState::load(kv.as_ref()).await?;
        tracing::debug!(
            tracked = state.identity.len(),
            queued = state.retry.len(),
            "sync state loaded"
        );
        Ok(Self {
            config,
            store,
            host,
            kv,
            confirm: Arc::new(AlwaysConfirm(true)),
            fetcher: Arc::new(HttpFetcher::new()?),
            state: Mutex::new(state),
            locks: CardLocks::default(),
        })
    }

    /// Replaces the remote deletion confirmation.
    #[must_use]
    pub fn with_confirmation(mut self, confirm: Arc<dyn ConfirmDeletion>) -> Self {
        self.confirm = confirm;
        self
    }

    /// Replaces the fetcher for external media.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn MediaFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// A copy of the current state.
    pub async fn state(&self) -> SyncState {
        self.state.lock().await.clone()
    }

    /// Pushes one card.
    ///
    /// Per-card failures are reported in the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or state cannot be saved.
    pub async fn push(&self, id: &CardId) -> Result<PushOutcome, SyncError> {
        self.config.validate()?;
        self.push_card(id, true).await
    }

    /// Pushes several cards concurrently.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or state cannot be saved.
    pub async fn push_many(
        &self,
        ids: impl IntoIterator<Item = CardId>,
    ) -> Result<Vec<(CardId, PushOutcome)>, SyncError> {
        self.config.validate()?;
        self.push_batch(ids.into_iter().collect(), true).await
    }

    /// Pushes every local card. Archived cards without an artifact are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing, the host cannot list
    /// cards, or state cannot be saved.
    pub async fn push_all(&self) -> Result<Vec<(CardId, PushOutcome)>, SyncError> {
        self.config.validate()?;
        let ids = self.host.list_card_ids().await?;
        tracing::info!(count = ids.len(), "pushing all cards");
        self.push_batch(ids, false).await
    }

    /// Pushes every queued card once.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or state cannot be saved.
    pub async fn retry_failed(&self) -> Result<Vec<(CardId, PushOutcome)>, SyncError> {
        self.config.validate()?;
        let ids = self.state.lock().await.retry.ids();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(count = ids.len(), "retrying failed pushes");
        self.push_batch(ids, true).await
    }

    /// Deletes the artifact of a card removed locally.
    ///
    /// Returns `false` if the card was never pushed.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::VersionConflict`] if the artifact changed since it
    /// was last seen; the identity entry is kept in that case.
    #[tracing::instrument(skip(self), fields(card_id = %id))]
    pub async fn delete_remote(&self, id: &CardId) -> Result<bool, SyncError> {
        self.config.validate()?;
        let _guard = self.locks.lock(id).await;
        let Some(entry) = self.state.lock().await.identity.get(id).cloned() else {
            return Ok(false);
        };

        match self.store.delete(&entry.remote_path, &entry.token).await {
            Ok(()) | Err(RemoteError::NotFound(_)) => {
                self.forget(id).await?;
                self.dequeue(id).await?;
                tracing::info!(path = %entry.remote_path, "remote artifact deleted");
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Pulls remote changes.
    ///
    /// Per-artifact failures are collected in the report.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or the listing fails.
    #[tracing::instrument(skip(self))]
    pub async fn pull(&self) -> Result<PullReport, SyncError> {
        self.config.validate()?;
        let dir = self.config.artifact_dir();
        // taken before listing so that cards pushed meanwhile are not seen as deleted
        let tracked: Vec<(CardId, IdentityEntry)> = {
            let state = self.state.lock().await;
            state
                .identity
                .entries()
                .filter(|(_, e)| e.remote_path.parent() == dir)
                .map(|(id, e)| (id.clone(), e.clone()))
                .collect()
        };
        let listing = self.list_artifacts(dir).await?;

        let conflicts_dir = self.config.conflicts_dir();
        let files: Vec<RemoteEntry> = listing
            .iter()
            .filter(|e| e.kind == EntryKind::File && e.path.ends_with(".md"))
            .filter(|e| e.path.parent() != conflicts_dir)
            .cloned()
            .collect();

        let mut report = PullReport::default();
        let steps: Vec<(RemotePath, Result<PullStep, SyncError>)> = stream::iter(files)
            .map(|file| async move {
                let path = file.path.clone();
                (path, self.pull_entry(file).await)
            })
            .buffer_unordered(self.workers())
            .collect()
            .await;

        for (path, step) in steps {
            match step {
                Ok(PullStep::Unchanged) => report.unchanged += 1,
                Ok(PullStep::Created(id)) => report.created.push(id),
                Ok(PullStep::Updated(id)) => report.updated.push(id),
                Ok(PullStep::KeptLocal(id)) => report.kept_local.push(id),
                Ok(PullStep::Conflict(record)) => report.conflicts.push(record),
                Err(e) => {
                    tracing::warn!(%path, error = %e, "failed to pull artifact");
                    report.failed.push((path, e));
                }
            }
        }

        let listed: HashSet<&RemotePath> = listing.iter().map(|e| &e.path).collect();
        let gone = tracked
            .into_iter()
            .filter(|(_, e)| !listed.contains(&e.remote_path));
        for (id, entry) in gone {
            match self.handle_remote_deletion(&id, &entry).await {
                Ok(Some(outcome)) => report.removed.push((id, outcome)),
                Ok(None) => tracing::debug!(card_id = %id, "artifact moved on since listing"),
                Err(e) => {
                    tracing::warn!(card_id = %id, error = %e, "failed to handle remote deletion");
                    report.failed.push((entry.remote_path, e));
                }
            }
        }

        report.sort();
        tracing::info!(
            created = report.created.len(),
            updated = report.updated.len(),
            conflicts = report.conflicts.len(),
            removed = report.removed.len(),
            failed = report.failed.len(),
            "pull finished"
        );
        Ok(report)
    }

    /// Pulls, then pushes every local card.
    ///
    /// # Errors
    ///
    /// Returns an error if either phase fails as a whole.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let pull = self.pull().await?;
        let push = self.push_all().await?;
        Ok(SyncReport { pull, push })
    }

    /// Reports what the engine is tracking.
    pub async fn status(&self) -> StatusReport {
        let state = self.state.lock().await;
        StatusReport {
            repository: self.config.repository.clone(),
            directory: self.config.artifact_dir().to_string(),
            policy: self.config.conflict_policy,
            tracked: state.identity.len(),
            queued: state.retry.ids(),
        }
    }

    /// Persists the state.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::State`] if the store rejects a write.
    pub async fn flush(&self) -> Result<(), SyncError> {
        self.state.lock().await.persist(self.kv.as_ref()).await
    }

    /// Lists the artifact directory.
    ///
    /// Git drops empty directories, so a missing directory is empty only when
    /// its nearest existing ancestor lists fine without it. A `NotFound` from
    /// the root, such as for a wrong branch or a revoked token, aborts the pull.
    async fn list_artifacts(&self, dir: &str) -> Result<Vec<RemoteEntry>, SyncError> {
        let err = match self.store.list(dir).await {
            Ok(listing) => return Ok(listing),
            Err(e @ RemoteError::NotFound(_)) if !dir.is_empty() => e,
            Err(e) => return Err(e.into()),
        };

        let mut missing = dir;
        loop {
            let parent = missing.rsplit_once('/').map_or("", |(parent, _)| parent);
            match self.store.list(parent).await {
                Ok(siblings) if siblings.iter().any(|e| e.path.as_str() == missing) => {
                    return Err(err.into());
                }
                Ok(_) => break,
                Err(RemoteError::NotFound(_)) if !parent.is_empty() => missing = parent,
                Err(e) => return Err(e.into()),
            }
        }

        tracing::debug!(dir, "artifact directory does not exist");
        Ok(Vec::new())
    }

    async fn push_batch(
        &self,
        ids: Vec<CardId>,
        include_archived: bool,
    ) -> Result<Vec<(CardId, PushOutcome)>, SyncError> {
        stream::iter(ids)
            .map(|id| async move {
                let outcome = self.push_card(&id, include_archived).await?;
                Ok::<_, SyncError>((id, outcome))
            })
            .buffer_unordered(self.workers())
            .try_collect()
            .await
    }

    #[tracing::instrument(skip(self), fields(card_id = %id))]
    async fn push_card(&self, id: &CardId, include_archived: bool) -> Result<PushOutcome, SyncError> {
        let _guard = self.locks.lock(id).await;
        match self.try_push(id, include_archived).await {
            Ok(outcome) => Ok(outcome),
            Err(e @ SyncError::ConfigurationMissing(_)) => Err(e),
            Err(e) if e.is_retryable() => {
                tracing::warn!(error = %e, "push failed, queued for retry");
                self.enqueue(id).await?;
                Ok(PushOutcome::Queued(e))
            }
            Err(e) => {
                tracing::warn!(error = %e, "push failed");
                Ok(PushOutcome::Failed(e))
            }
        }
    }

    async fn try_push(&self, id: &CardId, include_archived: bool) -> Result<PushOutcome, SyncError> {
        let Some(card) = self.host.get_card(id).await? else {
            tracing::debug!("card no longer exists");
            self.dequeue(id).await?;
            return Ok(PushOutcome::Missing);
        };

        let entry = self.state.lock().await.identity.get(id).cloned();
        if !include_archived && entry.is_none() && card.is_archived() {
            return Ok(PushOutcome::Skipped);
        }

        let local = artifact::serialize(&card)?;
        let digest = digest(&local);
        if let Some(entry) = &entry {
            if entry.digest.as_deref() == Some(digest.as_str()) {
                tracing::debug!("card unchanged since last push");
                self.dequeue(id).await?;
                return Ok(PushOutcome::Unchanged);
            }
        }

        let path = match &entry {
            Some(entry) => entry.remote_path.clone(),
            None => self.config.artifact_path(id, slugify(&card.front).as_deref()),
        };
        let content = self.remote_artifact(&card).await?;
        let expected = entry.as_ref().map(|e| &e.token);

        match self.store.write(&path, &content, expected).await {
            Ok(token) => {
                self.record_push(id, &path, token.clone(), digest).await?;
                tracing::info!(%path, %token, "card pushed");
                Ok(PushOutcome::Written { path, token })
            }
            Err(RemoteError::VersionConflict(_)) => {
                tracing::debug!(%path, "version conflict on push");
                self.settle_push_conflict(&card, &path, &local, &content, digest)
                    .await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn settle_push_conflict(
        &self,
        card: &Card,
        path: &RemotePath,
        local: &str,
        content: &str,
        digest: String,
    ) -> Result<PushOutcome, SyncError> {
        let id = &card.id;
        let remote = match self.store.read(path).await {
            Ok(file) => file,
            Err(RemoteError::NotFound(_)) => {
                tracing::info!(%path, "remote artifact vanished, recreating");
                let token = self.store.write(path, content, None).await?;
                self.record_push(id, path, token.clone(), digest).await?;
                return Ok(PushOutcome::Written {
                    path: path.clone(),
                    token,
                });
            }
            Err(e) => return Err(e.into()),
        };

        if remote.content == content {
            self.record_push(id, path, remote.token, digest).await?;
            return Ok(PushOutcome::Unchanged);
        }

        let parsed = artifact::parse(&remote.content)?;
        match resolve(card.updated_at, parsed.updated_at, self.config.conflict_policy) {
            Resolution::UseRemote => {
                tracing::info!(%path, "remote version wins");
                let digest = self.apply_remote(id, parsed).await?;
                let entry = self
                    .entry_for(path, remote.token.clone())
                    .with_digest(digest);
                self.record(id, entry).await?;
                self.dequeue(id).await?;
                Ok(PushOutcome::RemoteApplied {
                    token: remote.token,
                })
            }
            Resolution::UseLocal => {
                tracing::info!(%path, "local version wins, overwriting remote");
                let token = self.store.write(path, content, Some(&remote.token)).await?;
                self.record_push(id, path, token.clone(), digest).await?;
                Ok(PushOutcome::Written {
                    path: path.clone(),
                    token,
                })
            }
            Resolution::Tie => {
                let record = self.record_conflict(id, path, local, &remote).await?;
                self.dequeue(id).await?;
                Ok(PushOutcome::Conflict { record })
            }
        }
    }

    #[tracing::instrument(skip(self, file), fields(path = %file.path))]
    async fn pull_entry(&self, file: RemoteEntry) -> Result<PullStep, SyncError> {
        let known = {
            let state = self.state.lock().await;
            state.identity.find_by_path(&file.path).map(|(id, _)| id.clone())
        };
        let (id, mut fetched) = match known {
            Some(id) => (id, None),
            None => {
                // untracked artifacts name their card only in their content
                let remote = self.store.read(&file.path).await?;
                let parsed = artifact::parse(&remote.content)?;
                let id = artifact_id(&file.path, &parsed)?;
                (id, Some((remote, parsed)))
            }
        };

        let _guard = self.locks.lock(&id).await;
        let tracked = self.state.lock().await.identity.get(&id).cloned();
        if let Some(entry) = &tracked {
            if entry.remote_path == file.path && entry.token == file.token {
                return Ok(PullStep::Unchanged);
            }
            // a push may have moved the artifact on since the first read
            fetched = None;
        }

        let (remote, parsed) = match fetched {
            Some(fetched) => fetched,
            None => {
                let remote = self.store.read(&file.path).await?;
                let parsed = artifact::parse(&remote.content)?;
                (remote, parsed)
            }
        };
        if tracked
            .as_ref()
            .is_some_and(|e| e.remote_path == file.path && e.token == remote.token)
        {
            return Ok(PullStep::Unchanged);
        }

        let slug = split_file_name(file.path.file_name())
            .and_then(|(slug, _)| slug)
            .map(ToString::to_string);
        let Some(local) = self.host.get_card(&id).await? else {
            let card = self.local_card_from(parsed, id.clone()).await;
            let new_id = self.host.create_card(&card).await?;
            if new_id != id {
                self.forget(&id).await?;
            }
            let digest = self.local_digest(&new_id).await?;
            let entry = self
                .entry_for(&file.path, remote.token)
                .with_slug(slug)
                .with_digest(digest);
            self.record(&new_id, entry).await?;
            tracing::info!(card_id = %new_id, "card created from remote");
            return Ok(PullStep::Created(new_id));
        };

        let local_text = artifact::serialize(&local)?;
        match resolve(local.updated_at, parsed.updated_at, self.config.conflict_policy) {
            Resolution::UseRemote => {
                let digest = self.apply_remote(&id, parsed).await?;
                let entry = self
                    .entry_for(&file.path, remote.token)
                    .with_slug(slug)
                    .with_digest(digest);
                self.record(&id, entry).await?;
                tracing::info!(card_id = %id, "card updated from remote");
                Ok(PullStep::Updated(id))
            }
            Resolution::UseLocal => {
                let entry = self.entry_for(&file.path, remote.token).with_slug(slug);
                self.record(&id, entry).await?;
                tracing::debug!(card_id = %id, "local version is newer");
                Ok(PullStep::KeptLocal(id))
            }
            Resolution::Tie => {
                let mut remote_card = parsed.clone().into_card(id.clone());
                remote_card.id = id.clone();
                let same = local_text == remote.content || remote_card == local;
                if same {
                    let entry = self
                        .entry_for(&file.path, remote.token)
                        .with_slug(slug)
                        .with_digest(Some(digest(&local_text)));
                    self.record(&id, entry).await?;
                    return Ok(PullStep::Unchanged);
                }

                let record = self
                    .record_conflict(&id, &file.path, &local_text, &remote)
                    .await?;
                Ok(PullStep::Conflict(record))
            }
        }
    }

    /// Returns `None` if a push replaced the entry after the listing was taken.
    async fn handle_remote_deletion(
        &self,
        id: &CardId,
        entry: &IdentityEntry,
    ) -> Result<Option<DeletionOutcome>, SyncError> {
        let _guard = self.locks.lock(id).await;
        if self.state.lock().await.identity.get(id) != Some(entry) {
            return Ok(None);
        }

        let outcome = self.apply_remote_deletion(id, entry).await;
        // a vanished artifact is never resurrected from the map
        self.forget(id).await?;
        outcome.map(Some)
    }

    async fn apply_remote_deletion(
        &self,
        id: &CardId,
        entry: &IdentityEntry,
    ) -> Result<DeletionOutcome, SyncError> {
        let Some(card) = self.host.get_card(id).await? else {
            return Ok(DeletionOutcome::Missing);
        };

        if !self
            .confirm
            .confirm_remote_deletion(&card, &entry.remote_path)
            .await
        {
            tracing::info!(card_id = %id, "remote deletion not confirmed");
            return Ok(DeletionOutcome::Declined);
        }

        let outcome = match self.config.on_remote_delete {
            RemoteDeleteAction::Archive => {
                self.host.ensure_tag(ARCHIVED_TAG).await?;
                if !card.is_archived() {
                    let patch = CardPatch::add_tag(&card.tags, ARCHIVED_TAG);
                    self.host.update_card(id, &patch).await?;
                }
                DeletionOutcome::Archived
            }
            RemoteDeleteAction::Delete => {
                self.host.delete_card(id).await?;
                DeletionOutcome::Deleted
            }
            RemoteDeleteAction::Keep => DeletionOutcome::Kept,
        };
        tracing::info!(card_id = %id, path = %entry.remote_path, ?outcome, "artifact deleted remotely");
        Ok(outcome)
    }

    /// Applies remote fields to a local card and returns the new local digest.
    async fn apply_remote(
        &self,
        id: &CardId,
        parsed: ParsedArtifact,
    ) -> Result<Option<String>, SyncError> {
        let media = self.media();
        let patch = CardPatch {
            rem_id: parsed.rem_id.map(Some),
            front: Some(media.internalize(&parsed.question).await),
            back: Some(media.internalize(&parsed.answer).await),
            tags: Some(parsed.tags),
            schedule: Some(parsed.schedule),
            updated_at: Some(parsed.updated_at),
        };
        self.host.update_card(id, &patch).await?;
        self.local_digest(id).await
    }

    async fn local_card_from(&self, parsed: ParsedArtifact, id: CardId) -> Card {
        let media = self.media();
        let front = media.internalize(&parsed.question).await;
        let back = media.internalize(&parsed.answer).await;
        let mut card = parsed.into_card(id.clone());
        card.id = id;
        card.front = front;
        card.back = back;
        card
    }

    async fn local_digest(&self, id: &CardId) -> Result<Option<String>, SyncError> {
        match self.host.get_card(id).await? {
            Some(card) => Ok(Some(digest(&artifact::serialize(&card)?))),
            None => Ok(None),
        }
    }

    /// Serializes a card with its media externalized.
    async fn remote_artifact(&self, card: &Card) -> Result<String, SyncError> {
        let media = self.media();
        let mut remote = card.clone();
        remote.front = media.externalize(&card.front).await;
        remote.back = media.externalize(&card.back).await;
        Ok(artifact::serialize(&remote)?)
    }

    async fn record_conflict(
        &self,
        id: &CardId,
        path: &RemotePath,
        local: &str,
        remote: &RemoteFile,
    ) -> Result<RemotePath, SyncError> {
        let record_path = RemotePath::join(
            &self.config.conflicts_dir(),
            &format!("{id}-{}.md", remote.token.short()),
        );
        let text = conflict_record(id, path, &remote.token, local, &remote.content)?;

        match self.store.write(&record_path, &text, None).await {
            Ok(_) => {
                tracing::warn!(card_id = %id, %path, record = %record_path, "conflict recorded");
            }
            Err(RemoteError::VersionConflict(_)) => {
                tracing::debug!(record = %record_path, "conflict already recorded");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(record_path)
    }

    fn entry_for(&self, path: &RemotePath, token: VersionToken) -> IdentityEntry {
        let slug = split_file_name(path.file_name())
            .and_then(|(slug, _)| slug)
            .map(ToString::to_string);
        IdentityEntry::new(path.clone(), token).with_slug(slug)
    }

    async fn record_push(
        &self,
        id: &CardId,
        path: &RemotePath,
        token: VersionToken,
        digest: String,
    ) -> Result<(), SyncError> {
        let entry = self.entry_for(path, token).with_digest(Some(digest));
        self.record(id, entry).await?;
        self.dequeue(id).await
    }

    async fn record(&self, id: &CardId, entry: IdentityEntry) -> Result<(), SyncError> {
        let mut state = self.state.lock().await;
        state.identity.upsert(id.clone(), entry)?;
        state.identity.persist(self.kv.as_ref()).await
    }

    async fn forget(&self, id: &CardId) -> Result<(), SyncError> {
        let mut state = self.state.lock().await;
        if state.identity.remove(id).is_some() {
            state.identity.persist(self.kv.as_ref()).await?;
        }
        Ok(())
    }

    async fn enqueue(&self, id: &CardId) -> Result<(), SyncError> {
        let mut state = self.state.lock().await;
        if state.retry.enqueue(id.clone()) {
            state.retry.persist(self.kv.as_ref()).await?;
        }
        Ok(())
    }

    async fn dequeue(&self, id: &CardId) -> Result<(), SyncError> {
        let mut state = self.state.lock().await;
        if state.retry.remove(id) {
            state.retry.persist(self.kv.as_ref()).await?;
        }
        Ok(())
    }

    fn media(&self) -> MediaTranslator<'_> {
        MediaTranslator::new(
            self.store.as_ref(),
            self.fetcher.as_ref(),
            self.config.artifact_dir(),
        )
    }

    fn workers(&self) -> usize {
        self.config.workers.max(1)
    }
}

/// The card id of an artifact, from its metadata or else its file name.
fn artifact_id(path: &RemotePath, parsed: &ParsedArtifact) -> Result<CardId, SyncError> {
    parsed
        .card_id
        .clone()
        .or_else(|| split_file_name(path.file_name()).map(|(_, id)| id))
        .ok_or_else(|| {
            SyncError::MalformedArtifact(ArtifactError::InvalidMetadata(
                "no card id in metadata or file name".to_string(),
            ))
        })
}

/// SHA-256 hex digest of an artifact.
#[must_use]
pub fn digest(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConflictHeader<'a> {
    card_id: &'a str,
    path: &'a str,
    remote_token: &'a str,
    detected: Timestamp,
}

fn conflict_record(
    id: &CardId,
    path: &RemotePath,
    token: &VersionToken,
    local: &str,
    remote: &str,
) -> Result<String, SyncError> {
    let header = serde_yaml::to_string(&ConflictHeader {
        card_id: id,
        path,
        remote_token: token,
        detected: Timestamp::now(),
    })
    .map_err(|e| ArtifactError::InvalidMetadata(e.to_string()))?;

    Ok(format!(
        "---\n{header}---\n## Local\n\n{}\n\n## Remote\n\n{}\n",
        local.trim_end(),
        remote.trim_end()
    ))
}
