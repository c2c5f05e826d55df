// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Background loop driving the engine: debounced pushes of changed cards,
//! periodic pulls and retry queue drains.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::card::CardId;
use crate::engine::SyncEngine;
use crate::error::SyncError;

/// Runs an engine until shutdown.
#[derive(Debug, Clone)]
pub struct SyncScheduler {
    engine: Arc<SyncEngine>,
}

impl SyncScheduler {
    /// Creates a scheduler for `engine`.
    #[must_use]
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self { engine }
    }

    /// Runs until `shutdown` resolves.
    ///
    /// Ids received on `changes` are pushed once no further change arrived
    /// for the debounce period. Pending changes are pushed before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing, or if state cannot be
    /// saved on shutdown. Failures of individual passes are only logged.
    pub async fn run(
        &self,
        mut changes: mpsc::Receiver<CardId>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), SyncError> {
        let config = self.engine.config();
        config.validate()?;

        let pull_every = config.pull_interval();
        let mut pull_timer = time::interval(pull_every.unwrap_or(config.retry_interval()));
        pull_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut retry_timer = time::interval_at(
            Instant::now() + config.retry_interval(),
            config.retry_interval(),
        );
        retry_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let debounce = config.debounce();
        let mut pending: BTreeSet<CardId> = BTreeSet::new();
        let mut deadline: Option<Instant> = None;
        let mut changes_open = config.auto_push;

        tracing::info!(
            auto_push = config.auto_push,
            pull_interval = ?pull_every,
            "sync scheduler started"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => break,

                _ = pull_timer.tick(), if pull_every.is_some() => {
                    if let Err(e) = self.engine.pull().await {
                        tracing::warn!(error = %e, "periodic pull failed");
                    }
                }

                _ = retry_timer.tick() => {
                    if let Err(e) = self.engine.retry_failed().await {
                        tracing::warn!(error = %e, "retry pass failed");
                    }
                }

                change = changes.recv(), if changes_open => match change {
                    Some(id) => {
                        tracing::trace!(card_id = %id, "card changed");
                        pending.insert(id);
                        deadline = Some(Instant::now() + debounce);
                    }
                    None => changes_open = false,
                },

                () = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    self.push_pending(&mut pending).await;
                }
            }
        }

        tracing::info!(pending = pending.len(), "sync scheduler stopping");
        self.push_pending(&mut pending).await;
        self.engine.flush().await
    }

    async fn push_pending(&self, pending: &mut BTreeSet<CardId>) {
        if pending.is_empty() {
            return;
        }

        let ids = std::mem::take(pending);
        match self.engine.push_many(ids).await {
            Ok(outcomes) => {
                let failed = outcomes.iter().filter(|(_, o)| o.is_failure()).count();
                tracing::debug!(pushed = outcomes.len(), failed, "debounced push finished");
            }
            Err(e) => tracing::warn!(error = %e, "debounced push failed"),
        }
    }
}
