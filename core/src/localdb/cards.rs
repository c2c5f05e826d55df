// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;

use jiff::Timestamp;
use sqlx::SqlitePool;

use crate::card::{Card, CardId, Schedule};
use crate::error::HostError;

#[derive(Debug, Clone)]
pub struct Cards {
    pool: SqlitePool,
}

impl Cards {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, card: &CardRecord) -> Result<(), sqlx::Error> {
        const SQL: &str = "\
INSERT INTO cards (id, rem_id, front, back, tags, schedule, updated_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(id) DO UPDATE SET
    rem_id     = excluded.rem_id,
    front      = excluded.front,
    back       = excluded.back,
    tags       = excluded.tags,
    schedule   = excluded.schedule,
    updated_at = excluded.updated_at;
";

        sqlx::query(SQL)
            .bind(&card.id)
            .bind(&card.rem_id)
            .bind(&card.front)
            .bind(&card.back)
            .bind(&card.tags)
            .bind(&card.schedule)
            .bind(&card.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<CardRecord>, sqlx::Error> {
        const SQL: &str = "\
SELECT id, rem_id, front, back, tags, schedule, updated_at
FROM cards
WHERE id = ?;
";

        sqlx::query_as(SQL)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn exists(&self, id: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM cards WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn list(&self) -> Result<Vec<CardRecord>, sqlx::Error> {
        const SQL: &str = "\
SELECT id, rem_id, front, back, tags, schedule, updated_at
FROM cards
ORDER BY updated_at DESC, id;
";

        sqlx::query_as(SQL).fetch_all(&self.pool).await
    }

    pub async fn list_ids(&self) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM cards ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Returns whether a row was deleted.
    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cards WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// A card row. Tags and schedule are stored as JSON, timestamps as RFC 3339.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CardRecord {
    id: String,
    rem_id: Option<String>,
    front: String,
    back: String,
    tags: String,
    schedule: String,
    updated_at: Option<String>,
}

impl CardRecord {
    pub fn from_card(card: &Card) -> Result<Self, HostError> {
        Ok(Self {
            id: card.id.to_string(),
            rem_id: card.rem_id.clone(),
            front: card.front.clone(),
            back: card.back.clone(),
            tags: serde_json::to_string(&card.tags)?,
            schedule: serde_json::to_string(&card.schedule)?,
            updated_at: card.updated_at.map(|t| t.to_string()),
        })
    }

    pub fn into_card(self) -> Result<Card, HostError> {
        let tags: BTreeSet<String> = serde_json::from_str(&self.tags)?;
        let schedule: Schedule = serde_json::from_str(&self.schedule)?;
        let updated_at = match self.updated_at {
            Some(t) => Some(
                t.parse::<Timestamp>()
                    .map_err(|e| HostError::new(format!("invalid timestamp {t:?}: {e}")))?,
            ),
            None => None,
        };

        Ok(Card {
            id: CardId::new(self.id),
            rem_id: self.rem_id,
            front: self.front,
            back: self.back,
            tags,
            schedule,
            updated_at,
        })
    }
}
