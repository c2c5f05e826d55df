// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Deref;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Tag added to cards whose remote artifact was deleted.
pub const ARCHIVED_TAG: &str = "Archived";

/// Identifier of a card in the host application.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    /// Creates a new `CardId` from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for CardId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for CardId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CardId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Spaced-repetition algorithm a card is scheduled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerKind {
    /// Free Spaced Repetition Scheduler.
    #[serde(rename = "FSRS", alias = "fsrs")]
    Fsrs,
    /// SuperMemo 2.
    #[serde(rename = "SM2", alias = "sm2")]
    Sm2,
}

impl SchedulerKind {
    /// Canonical name as written to artifacts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fsrs => "FSRS",
            Self::Sm2 => "SM2",
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduler parameters; only the active algorithm's fields exist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheduler")]
pub enum SchedulerState {
    /// FSRS memory state.
    #[serde(rename = "FSRS")]
    Fsrs {
        /// Card difficulty.
        difficulty: Option<f64>,
        /// Memory stability in days.
        stability: Option<f64>,
    },
    /// SM2 parameters.
    #[serde(rename = "SM2")]
    Sm2 {
        /// Ease factor.
        ease: Option<f64>,
        /// Interval in days.
        interval: Option<f64>,
    },
}

impl SchedulerState {
    /// The algorithm of this state.
    #[must_use]
    pub const fn kind(&self) -> SchedulerKind {
        match self {
            Self::Fsrs { .. } => SchedulerKind::Fsrs,
            Self::Sm2 { .. } => SchedulerKind::Sm2,
        }
    }
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self::Sm2 {
            ease: None,
            interval: None,
        }
    }
}

/// Review schedule of a card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// Algorithm parameters.
    #[serde(flatten)]
    pub state: SchedulerState,
    /// Time of the last review.
    pub last_reviewed: Option<Timestamp>,
    /// Time the card is next due.
    pub next_due: Option<Timestamp>,
}

/// A flashcard as exposed by the host application.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Local identifier.
    pub id: CardId,
    /// Identifier of the parent note in the host, if any.
    pub rem_id: Option<String>,
    /// Question text, in markdown.
    pub front: String,
    /// Answer text, in markdown.
    pub back: String,
    /// Tags attached to the card.
    pub tags: BTreeSet<String>,
    /// Review schedule.
    pub schedule: Schedule,
    /// Last modification time.
    pub updated_at: Option<Timestamp>,
}

impl Card {
    /// Creates a card with the given text and no metadata.
    #[must_use]
    pub fn new(id: CardId, front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            id,
            rem_id: None,
            front: front.into(),
            back: back.into(),
            tags: BTreeSet::new(),
            schedule: Schedule::default(),
            updated_at: None,
        }
    }

    /// Whether the card carries the archive tag.
    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.tags.contains(ARCHIVED_TAG)
    }
}

/// Partial update of a card. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardPatch {
    /// New parent note identifier.
    pub rem_id: Option<Option<String>>,
    /// New question text.
    pub front: Option<String>,
    /// New answer text.
    pub back: Option<String>,
    /// New tag set.
    pub tags: Option<BTreeSet<String>>,
    /// New schedule.
    pub schedule: Option<Schedule>,
    /// New modification time.
    pub updated_at: Option<Option<Timestamp>>,
}

impl CardPatch {
    /// A patch that replaces every field of a card except its id.
    #[must_use]
    pub fn replace_with(card: &Card) -> Self {
        Self {
            rem_id: Some(card.rem_id.clone()),
            front: Some(card.front.clone()),
            back: Some(card.back.clone()),
            tags: Some(card.tags.clone()),
            schedule: Some(card.schedule),
            updated_at: Some(card.updated_at),
        }
    }

    /// A patch that only adds a tag to the given tag set.
    #[must_use]
    pub fn add_tag(current: &BTreeSet<String>, tag: &str) -> Self {
        let mut tags = current.clone();
        tags.insert(tag.to_string());
        Self {
            tags: Some(tags),
            ..Default::default()
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies the patch in place.
    pub fn apply_to(&self, card: &mut Card) {
        if let Some(rem_id) = &self.rem_id {
            card.rem_id.clone_from(rem_id);
        }
        if let Some(front) = &self.front {
            card.front.clone_from(front);
        }
        if let Some(back) = &self.back {
            card.back.clone_from(back);
        }
        if let Some(tags) = &self.tags {
            card.tags.clone_from(tags);
        }
        if let Some(schedule) = self.schedule {
            card.schedule = schedule;
        }
        if let Some(updated_at) = self.updated_at {
            card.updated_at = updated_at;
        }
    }
}
