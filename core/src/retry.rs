// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;

use crate::card::CardId;
use crate::error::SyncError;
use crate::host::KvStore;

/// Key under which the retry queue is persisted.
pub const RETRY_QUEUE_KEY: &str = "retry-queue";

/// Cards whose last push failed and must be attempted again.
///
/// Each id appears at most once; ids drain in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryQueue {
    ids: BTreeSet<CardId>,
}

impl RetryQueue {
    /// Adds an id, returning `false` if it was already queued.
    pub fn enqueue(&mut self, id: CardId) -> bool {
        self.ids.insert(id)
    }

    /// Removes an id, returning `true` if it was queued.
    pub fn remove(&mut self, id: &CardId) -> bool {
        self.ids.remove(id)
    }

    /// Whether an id is queued.
    #[must_use]
    pub fn contains(&self, id: &CardId) -> bool {
        self.ids.contains(id)
    }

    /// Snapshot of the queued ids.
    #[must_use]
    pub fn ids(&self) -> Vec<CardId> {
        self.ids.iter().cloned().collect()
    }

    /// Number of queued ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Loads the queue, empty if nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::State`] if the stored value is unreadable.
    pub async fn load(kv: &dyn KvStore) -> Result<Self, SyncError> {
        let raw = kv
            .get(RETRY_QUEUE_KEY)
            .await
            .map_err(|e| SyncError::State(format!("failed to read retry queue: {e}")))?;
        match raw {
            Some(raw) => serde_json::from_str(&raw)
                .map(|ids| Self { ids })
                .map_err(|e| SyncError::State(format!("corrupt retry queue: {e}"))),
            None => Ok(Self::default()),
        }
    }

    /// Persists the queue.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::State`] if the store rejects the write.
    pub async fn persist(&self, kv: &dyn KvStore) -> Result<(), SyncError> {
        let raw = serde_json::to_string(&self.ids)
            .map_err(|e| SyncError::State(format!("failed to encode retry queue: {e}")))?;
        kv.set(RETRY_QUEUE_KEY, &raw)
            .await
            .map_err(|e| SyncError::State(format!("failed to save retry queue: {e}")))
    }
}
