// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! SQLite-backed card host, used by the command line front end.

mod cards;
mod kv;

use std::error::Error;
use std::path::Path;

use async_trait::async_trait;
use jiff::Timestamp;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::card::{Card, CardId, CardPatch};
use crate::error::HostError;
use crate::host::{CardHost, KvStore};
use crate::localdb::cards::{CardRecord, Cards};
use crate::localdb::kv::{Kv, Tags};

#[derive(Debug, Clone)]
pub struct LocalDb {
    pool: SqlitePool,

    cards: Cards,
    tags: Tags,
    kv: Kv,
}

impl LocalDb {
    /// Opens a sqlite database connection.
    /// If `filename` is `None`, it opens an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn open(filename: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        let (options, pool_options) = if let Some(filename) = filename {
            tracing::info!(path = %filename.display(), "connecting to SQLite database");
            let options = SqliteConnectOptions::new()
                .filename(filename.to_str().ok_or("Invalid path encoding")?)
                .create_if_missing(true);
            (options, SqlitePoolOptions::new())
        } else {
            tracing::info!("connecting to in-memory SQLite database");
            // every connection would see its own empty database
            let pool_options = SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
            (SqliteConnectOptions::new().in_memory(true), pool_options)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| format!("Failed to connect to SQLite database: {e}"))?;

        sqlx::migrate!("src/localdb/migrations") // relative path from the crate root
            .run(&pool)
            .await
            .map_err(|e| format!("Failed to run migrations: {e}"))?;

        Ok(LocalDb {
            cards: Cards::new(pool.clone()),
            tags: Tags::new(pool.clone()),
            kv: Kv::new(pool.clone()),
            pool,
        })
    }

    /// Lists every card, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if a row cannot be read.
    pub async fn list_cards(&self) -> Result<Vec<Card>, HostError> {
        self.cards
            .list()
            .await?
            .into_iter()
            .map(CardRecord::into_card)
            .collect()
    }

    /// Lists every known tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_tags(&self) -> Result<Vec<String>, HostError> {
        Ok(self.tags.list().await?)
    }

    pub async fn close(self) -> Result<(), Box<dyn Error>> {
        tracing::debug!("closing database connection");
        self.pool.close().await;
        Ok(())
    }

    async fn save(&self, card: &Card) -> Result<(), HostError> {
        for tag in &card.tags {
            self.tags.ensure(tag).await?;
        }
        self.cards.upsert(&CardRecord::from_card(card)?).await?;
        Ok(())
    }
}

#[async_trait]
impl CardHost for LocalDb {
    async fn get_card(&self, id: &CardId) -> Result<Option<Card>, HostError> {
        self.cards
            .get(id)
            .await?
            .map(CardRecord::into_card)
            .transpose()
    }

    async fn list_card_ids(&self) -> Result<Vec<CardId>, HostError> {
        let ids = self.cards.list_ids().await?;
        Ok(ids.into_iter().map(CardId::new).collect())
    }

    async fn create_card(&self, card: &Card) -> Result<CardId, HostError> {
        let mut card = card.clone();
        if card.id.is_empty() || self.cards.exists(&card.id).await? {
            card.id = CardId::generate();
        }
        self.save(&card).await?;
        tracing::debug!(card_id = %card.id, "card created");
        Ok(card.id)
    }

    async fn update_card(&self, id: &CardId, patch: &CardPatch) -> Result<(), HostError> {
        let mut card = self
            .get_card(id)
            .await?
            .ok_or_else(|| HostError::new(format!("card not found: {id}")))?;

        patch.apply_to(&mut card);
        if patch.updated_at.is_none() {
            card.updated_at = Some(Timestamp::now());
        }
        self.save(&card).await
    }

    async fn ensure_tag(&self, name: &str) -> Result<(), HostError> {
        Ok(self.tags.ensure(name).await?)
    }

    async fn delete_card(&self, id: &CardId) -> Result<(), HostError> {
        if !self.cards.delete(id).await? {
            tracing::debug!(card_id = %id, "card to delete does not exist");
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for LocalDb {
    async fn get(&self, key: &str) -> Result<Option<String>, HostError> {
        Ok(self.kv.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), HostError> {
        Ok(self.kv.set(key, value).await?)
    }
}
