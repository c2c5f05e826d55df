// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Capabilities the host application provides to the engine.

use async_trait::async_trait;
use cardsync_remote::RemotePath;

use crate::card::{Card, CardId, CardPatch};
use crate::error::HostError;

/// Card storage owned by the host application.
#[async_trait]
pub trait CardHost: Send + Sync {
    /// Looks up a card, `None` if it doesn't exist.
    async fn get_card(&self, id: &CardId) -> Result<Option<Card>, HostError>;

    /// Lists the ids of every card.
    async fn list_card_ids(&self) -> Result<Vec<CardId>, HostError>;

    /// Creates a card and returns the id the host assigned to it.
    async fn create_card(&self, card: &Card) -> Result<CardId, HostError>;

    /// Applies a partial update.
    async fn update_card(&self, id: &CardId, patch: &CardPatch) -> Result<(), HostError>;

    /// Makes sure a tag with this name exists.
    async fn ensure_tag(&self, name: &str) -> Result<(), HostError>;

    /// Deletes a card.
    async fn delete_card(&self, id: &CardId) -> Result<(), HostError>;
}

/// Small persistent string store for engine state.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads a value.
    async fn get(&self, key: &str) -> Result<Option<String>, HostError>;

    /// Writes a value.
    async fn set(&self, key: &str, value: &str) -> Result<(), HostError>;
}

/// Asks whether a card whose remote artifact vanished may be removed locally.
#[async_trait]
pub trait ConfirmDeletion: Send + Sync {
    /// Returns `true` to proceed with the configured deletion action.
    async fn confirm_remote_deletion(&self, card: &Card, path: &RemotePath) -> bool;
}

/// [`ConfirmDeletion`] with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct AlwaysConfirm(pub bool);

#[async_trait]
impl ConfirmDeletion for AlwaysConfirm {
    async fn confirm_remote_deletion(&self, card: &Card, path: &RemotePath) -> bool {
        tracing::debug!(card_id = %card.id, %path, answer = self.0, "remote deletion confirmation");
        self.0
    }
}
