// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Per-card mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::card::CardId;

/// Keyed async locks. An entry lives only while a task holds or awaits it.
#[derive(Debug, Default)]
pub(crate) struct CardLocks {
    locks: StdMutex<HashMap<CardId, Arc<Mutex<()>>>>,
}

impl CardLocks {
    /// Waits until no other task holds the lock of `id`.
    pub(crate) async fn lock(&self, id: &CardId) -> CardGuard<'_> {
        let lock = Arc::clone(self.map().entry(id.clone()).or_default());
        let guard = lock.lock_owned().await;
        CardGuard {
            locks: self,
            id: id.clone(),
            guard: Some(guard),
        }
    }

    /// Number of ids currently held or awaited.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.map().len()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<CardId, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the card on drop and evicts its entry when nobody waits for it.
pub(crate) struct CardGuard<'a> {
    locks: &'a CardLocks,
    id: CardId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for CardGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut map = self.locks.map();
        // the map holds the only reference once every waiter is gone
        if map
            .get(&self.id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            map.remove(&self.id);
        }
    }
}
