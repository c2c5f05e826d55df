// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use cardsync_remote::{RemotePath, VersionToken};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::card::CardId;
use crate::error::SyncError;
use crate::host::KvStore;

/// Key under which the identity map is persisted.
pub const IDENTITY_MAP_KEY: &str = "identity-map";

/// Separator between slug and id in slug file names.
const SLUG_SEPARATOR: &str = "--";

const MAX_SLUG_LEN: usize = 48;

/// Last known remote state of one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityEntry {
    /// Path of the artifact.
    pub remote_path: RemotePath,
    /// Version token last written or seen.
    pub token: VersionToken,
    /// Time of the last successful exchange.
    pub last_sync: Timestamp,
    /// Slug used in the file name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Digest of the local artifact the token corresponds to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl IdentityEntry {
    /// Creates an entry synced now.
    #[must_use]
    pub fn new(remote_path: RemotePath, token: VersionToken) -> Self {
        Self {
            remote_path,
            token,
            last_sync: Timestamp::now(),
            slug: None,
            digest: None,
        }
    }

    /// Sets the slug.
    #[must_use]
    pub fn with_slug(mut self, slug: Option<String>) -> Self {
        self.slug = slug;
        self
    }

    /// Sets the local artifact digest.
    #[must_use]
    pub fn with_digest(mut self, digest: Option<String>) -> Self {
        self.digest = digest;
        self
    }
}

/// Local card id to remote artifact mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMap {
    entries: BTreeMap<CardId, IdentityEntry>,
}

impl IdentityMap {
    /// Looks up the entry of a card.
    #[must_use]
    pub fn get(&self, id: &CardId) -> Option<&IdentityEntry> {
        self.entries.get(id)
    }

    /// Inserts or replaces an entry, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidEntry`] if the remote path is empty.
    pub fn upsert(
        &mut self,
        id: CardId,
        entry: IdentityEntry,
    ) -> Result<Option<IdentityEntry>, SyncError> {
        if entry.remote_path.is_empty() {
            return Err(SyncError::InvalidEntry(format!(
                "empty remote path for card {id}"
            )));
        }
        Ok(self.entries.insert(id, entry))
    }

    /// Removes an entry.
    pub fn remove(&mut self, id: &CardId) -> Option<IdentityEntry> {
        self.entries.remove(id)
    }

    /// Iterates over all entries in id order.
    pub fn entries(&self) -> impl Iterator<Item = (&CardId, &IdentityEntry)> {
        self.entries.iter()
    }

    /// Finds the card whose artifact lives at `path`.
    #[must_use]
    pub fn find_by_path(&self, path: &RemotePath) -> Option<(&CardId, &IdentityEntry)> {
        self.entries.iter().find(|(_, e)| &e.remote_path == path)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loads the map, empty if nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::State`] if the stored value is unreadable.
    pub async fn load(kv: &dyn KvStore) -> Result<Self, SyncError> {
        let Some(raw) = kv
            .get(IDENTITY_MAP_KEY)
            .await
            .map_err(|e| SyncError::State(format!("failed to read identity map: {e}")))?
        else {
            return Ok(Self::default());
        };

        let entries: BTreeMap<CardId, IdentityEntry> = serde_json::from_str(&raw)
            .map_err(|e| SyncError::State(format!("corrupt identity map: {e}")))?;
        for (id, entry) in &entries {
            if entry.remote_path.is_empty() {
                tracing::warn!(card_id = %id, "dropping identity entry without a path");
            }
        }
        Ok(Self {
            entries: entries
                .into_iter()
                .filter(|(_, e)| !e.remote_path.is_empty())
                .collect(),
        })
    }

    /// Persists the map.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::State`] if the store rejects the write.
    pub async fn persist(&self, kv: &dyn KvStore) -> Result<(), SyncError> {
        let raw = serde_json::to_string(&self.entries)
            .map_err(|e| SyncError::State(format!("failed to encode identity map: {e}")))?;
        kv.set(IDENTITY_MAP_KEY, &raw)
            .await
            .map_err(|e| SyncError::State(format!("failed to save identity map: {e}")))
    }
}

/// Derives a file name slug from question text.
///
/// Returns `None` when the text has no usable characters.
#[must_use]
pub fn slugify(text: &str) -> Option<String> {
    let mut slug = String::new();
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
        if slug.chars().count() >= MAX_SLUG_LEN {
            break;
        }
    }
    let slug = slug.trim_matches('-');
    (!slug.is_empty()).then(|| slug.to_string())
}

/// Builds the artifact file name of a card.
#[must_use]
pub fn file_name(id: &CardId, slug: Option<&str>) -> String {
    match slug {
        Some(slug) => format!("{slug}{SLUG_SEPARATOR}{id}.md"),
        None => format!("{id}.md"),
    }
}

/// Splits an artifact file name into slug and card id.
///
/// `<slug>--<id>.md` yields both, `<id>.md` only the id.
#[must_use]
pub fn split_file_name(name: &str) -> Option<(Option<&str>, CardId)> {
    let stem = name.strip_suffix(".md")?;
    let (slug, id) = match stem.rsplit_once(SLUG_SEPARATOR) {
        Some((slug, id)) if !slug.is_empty() => (Some(slug), id),
        _ => (None, stem),
    };
    (!id.is_empty()).then(|| (slug, CardId::new(id)))
}
