// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Test data factories and engine setup.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cardsync_core::{
    AlwaysConfirm, AuthMethod, Card, CardHost, CardId, CardPatch, LocalDb, MediaFetcher,
    RemoteStore, SyncConfig, SyncEngine, SyncError,
};
use jiff::Timestamp;

use super::{MemoryRemote, ScriptedRemote};

/// Configuration pointing at `owner/cards`, artifacts under `cards/`.
pub fn test_config() -> SyncConfig {
    SyncConfig {
        repository: "owner/cards".to_string(),
        subdir: "cards".to_string(),
        auth: AuthMethod::Token {
            token: "secret".to_string(),
        },
        workers: 2,
        ..Default::default()
    }
}

/// Parses an RFC 3339 timestamp.
pub fn ts(s: &str) -> Timestamp {
    s.parse().expect("valid timestamp")
}

/// A card with no timestamp.
pub fn card(id: &str, front: &str, back: &str) -> Card {
    Card::new(CardId::new(id), front, back)
}

/// A card last updated at `updated`.
pub fn card_at(id: &str, front: &str, back: &str, updated: &str) -> Card {
    let mut card = card(id, front, back);
    card.updated_at = Some(ts(updated));
    card
}

/// A hand-written artifact.
pub fn artifact_text(id: &str, question: &str, answer: &str, updated: &str) -> String {
    format!("---\ncardId: {id}\nupdated: {updated}\n---\n**Q:** {question}\n\n**A:** {answer}\n")
}

/// Fetcher that serves the same bytes for every URL.
#[derive(Debug, Clone, Copy)]
pub struct StaticFetcher;

#[async_trait]
impl MediaFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, SyncError> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}

/// An engine wired to an in-memory remote and an in-memory SQLite host.
pub struct Harness {
    pub remote: Arc<MemoryRemote>,
    pub db: Arc<LocalDb>,
    pub engine: SyncEngine,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: SyncConfig) -> Self {
        let db = LocalDb::open(None).await.expect("open database");
        Self::build(config, Arc::new(MemoryRemote::new()), Arc::new(db)).await
    }

    /// A second device sharing the remote of `self`.
    pub async fn peer(&self) -> Self {
        let db = LocalDb::open(None).await.expect("open database");
        Self::build(self.engine.config().clone(), self.remote.clone(), Arc::new(db)).await
    }

    /// A harness over a database file.
    pub async fn on_disk(path: &Path, remote: Arc<MemoryRemote>) -> Self {
        let db = LocalDb::open(Some(path)).await.expect("open database");
        Self::build(test_config(), remote, Arc::new(db)).await
    }

    pub async fn build(config: SyncConfig, remote: Arc<MemoryRemote>, db: Arc<LocalDb>) -> Self {
        Self::assemble(config, remote.clone(), remote, db).await
    }

    /// An engine talking to `store`; `remote` is the storage behind it.
    pub async fn scripted(config: SyncConfig, store: Arc<ScriptedRemote>) -> Self {
        let db = LocalDb::open(None).await.expect("open database");
        Self::assemble(config, store.clone(), store.inner(), Arc::new(db)).await
    }

    async fn assemble(
        config: SyncConfig,
        store: Arc<dyn RemoteStore>,
        remote: Arc<MemoryRemote>,
        db: Arc<LocalDb>,
    ) -> Self {
        let engine = SyncEngine::new(config, store, db.clone(), db.clone())
            .await
            .expect("create engine")
            .with_fetcher(Arc::new(StaticFetcher));
        Self { remote, db, engine }
    }

    /// Creates a card in the host.
    pub async fn add(&self, card: &Card) -> CardId {
        self.db.create_card(card).await.expect("create card")
    }

    /// Reads a card that must exist.
    pub async fn card(&self, id: &CardId) -> Card {
        self.db
            .get_card(id)
            .await
            .expect("read card")
            .expect("card exists")
    }

    pub async fn try_card(&self, id: &CardId) -> Option<Card> {
        self.db.get_card(id).await.expect("read card")
    }

    /// Edits the question locally, stamping the given time.
    pub async fn edit(&self, id: &CardId, front: &str, updated: &str) {
        let patch = CardPatch {
            front: Some(front.to_string()),
            updated_at: Some(Some(ts(updated))),
            ..Default::default()
        };
        self.db.update_card(id, &patch).await.expect("update card");
    }

    /// Replaces the remote deletion confirmation.
    pub fn confirm(mut self, answer: bool) -> Self {
        self.engine = self
            .engine
            .with_confirmation(Arc::new(AlwaysConfirm(answer)));
        self
    }
}
