// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Canonical text form of a card.
//!
//! An artifact is a YAML metadata block followed by a question and an answer
//! section:
//!
//! ```text
//! ---
//! remId: r1
//! cardId: c1
//! tags:
//! - math
//! scheduler: FSRS
//! difficulty: 5.0
//! stability: null
//! lastReviewed: null
//! nextDue: 2025-01-02T00:00:00Z
//! updated: 2025-01-01T00:00:00Z
//! ---
//! **Q:** What is 2 + 2?
//!
//! **A:** 4
//! ```

use std::collections::BTreeSet;
use std::sync::OnceLock;

use jiff::Timestamp;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::card::{Card, CardId, Schedule, SchedulerKind, SchedulerState};
use crate::error::ArtifactError;

/// Marker that starts the question section.
pub const QUESTION_MARKER: &str = "**Q:**";

/// Marker that starts the answer section.
pub const ANSWER_MARKER: &str = "**A:**";

/// Prefix of media references in path form.
pub const MEDIA_PREFIX: &str = "media/";

/// Matches markdown image references, capturing alt text and target.
pub(crate) fn media_regex() -> &'static Regex {
    const RE: &str = r"!\[(.*?)\]\((.*?)\)";
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(RE).unwrap())
}

/// Fields decoded from an artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArtifact {
    /// Card id from metadata; hand-written artifacts may omit it.
    pub card_id: Option<CardId>,
    /// Parent note id from metadata.
    pub rem_id: Option<String>,
    /// Tags.
    pub tags: BTreeSet<String>,
    /// Review schedule, with the scheduler inferred when not stated.
    pub schedule: Schedule,
    /// Last modification time.
    pub updated_at: Option<Timestamp>,
    /// Question text.
    pub question: String,
    /// Answer text.
    pub answer: String,
    /// Path-form media references found in question and answer.
    pub media_paths: Vec<String>,
}

impl ParsedArtifact {
    /// Builds a card, using `fallback` when the artifact names no id.
    #[must_use]
    pub fn into_card(self, fallback: CardId) -> Card {
        Card {
            id: self.card_id.unwrap_or(fallback),
            rem_id: self.rem_id,
            front: self.question,
            back: self.answer,
            tags: self.tags,
            schedule: self.schedule,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    #[serde(default, deserialize_with = "lenient_id")]
    rem_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    card_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scheduler: Option<SchedulerKind>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    difficulty: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    stability: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    ease: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    interval: Option<Option<f64>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    last_reviewed: Option<Timestamp>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    next_due: Option<Timestamp>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    updated: Option<Timestamp>,
}

impl Metadata {
    fn from_card(card: &Card) -> Self {
        let mut meta = Self {
            rem_id: card.rem_id.clone(),
            card_id: Some(card.id.to_string()),
            tags: card.tags.iter().cloned().collect(),
            scheduler: Some(card.schedule.state.kind()),
            last_reviewed: card.schedule.last_reviewed,
            next_due: card.schedule.next_due,
            updated: card.updated_at,
            ..Default::default()
        };
        match card.schedule.state {
            SchedulerState::Fsrs {
                difficulty,
                stability,
            } => {
                meta.difficulty = Some(difficulty);
                meta.stability = Some(stability);
            }
            SchedulerState::Sm2 { ease, interval } => {
                meta.ease = Some(ease);
                meta.interval = Some(interval);
            }
        }
        meta
    }

    fn schedule(&self) -> Schedule {
        let kind = self.scheduler.unwrap_or_else(|| {
            if self.difficulty.is_some() || self.stability.is_some() {
                SchedulerKind::Fsrs
            } else {
                SchedulerKind::Sm2
            }
        });

        let state = match kind {
            SchedulerKind::Fsrs => SchedulerState::Fsrs {
                difficulty: self.difficulty.flatten(),
                stability: self.stability.flatten(),
            },
            SchedulerKind::Sm2 => SchedulerState::Sm2 {
                ease: self.ease.flatten(),
                interval: self.interval.flatten(),
            },
        };

        Schedule {
            state,
            last_reviewed: self.last_reviewed,
            next_due: self.next_due,
        }
    }
}

/// Serializes a card to its artifact text.
///
/// # Errors
///
/// Returns an error if the metadata cannot be encoded.
pub fn serialize(card: &Card) -> Result<String, ArtifactError> {
    let meta = serde_yaml::to_string(&Metadata::from_card(card))
        .map_err(|e| ArtifactError::InvalidMetadata(e.to_string()))?;

    Ok(format!(
        "---\n{meta}---\n{QUESTION_MARKER} {}\n\n{ANSWER_MARKER} {}\n",
        card.front, card.back
    ))
}

/// Parses artifact text.
///
/// # Errors
///
/// Returns an [`ArtifactError`] describing the first structural problem.
pub fn parse(text: &str) -> Result<ParsedArtifact, ArtifactError> {
    let text = text.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let rest = text
        .strip_prefix("---\n")
        .ok_or(ArtifactError::MissingMetadata)?;

    let (meta, body) = if let Some(body) = rest.strip_prefix("---\n") {
        ("", body)
    } else if let Some((meta, body)) = rest.split_once("\n---\n") {
        (meta, body)
    } else if let Some(meta) = rest.strip_suffix("\n---") {
        (meta, "")
    } else {
        return Err(ArtifactError::MissingMetadata);
    };

    let meta: Metadata = if meta.trim().is_empty() {
        Metadata::default()
    } else {
        serde_yaml::from_str(meta).map_err(|e| ArtifactError::InvalidMetadata(e.to_string()))?
    };

    let (question, answer) = split_sections(body)?;
    let media_paths = [&question, &answer]
        .into_iter()
        .flat_map(|part| media_regex().captures_iter(part))
        .filter_map(|caps| caps.get(2))
        .map(|target| target.as_str())
        .filter(|target| target.starts_with(MEDIA_PREFIX))
        .map(ToString::to_string)
        .collect();

    Ok(ParsedArtifact {
        card_id: meta.card_id.clone().map(CardId::from),
        rem_id: meta.rem_id.clone(),
        tags: meta.tags.iter().cloned().collect(),
        schedule: meta.schedule(),
        updated_at: meta.updated,
        question,
        answer,
        media_paths,
    })
}

fn split_sections(body: &str) -> Result<(String, String), ArtifactError> {
    let lines: Vec<&str> = body.split('\n').collect();
    let q = lines.iter().position(|l| l.starts_with(QUESTION_MARKER));
    let a = lines.iter().position(|l| l.starts_with(ANSWER_MARKER));
    let (Some(q), Some(a)) = (q, a) else {
        return Err(ArtifactError::MissingQuestionAnswer);
    };
    if a < q {
        return Err(ArtifactError::MissingQuestionAnswer);
    }

    let section = |lines: &[&str], marker: &str| {
        let joined = lines.join("\n");
        joined
            .strip_prefix(marker)
            .unwrap_or(&joined)
            .trim()
            .to_string()
    };
    let question = section(lines.get(q..a).unwrap_or_default(), QUESTION_MARKER);
    let answer = section(lines.get(a..).unwrap_or_default(), ANSWER_MARKER);
    Ok((question, answer))
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = Option::<Vec<serde_yaml::Value>>::deserialize(deserializer)?;
    tags.unwrap_or_default()
        .into_iter()
        .map(|v| scalar_to_string(v).map_err(serde::de::Error::custom))
        .filter_map(Result::transpose)
        .collect()
}

/// Accepts ids written as strings or as bare numbers.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    let id = scalar_to_string(value).map_err(serde::de::Error::custom)?;
    Ok(id.filter(|s| !s.trim().is_empty()))
}

/// Accepts full timestamps and bare dates (taken as midnight UTC).
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Ok(Some(ts));
    }
    raw.parse::<jiff::civil::Date>()
        .and_then(|date| date.to_zoned(jiff::tz::TimeZone::UTC))
        .map(|zoned| Some(zoned.timestamp()))
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{raw}': {e}")))
}

fn scalar_to_string(value: serde_yaml::Value) -> Result<Option<String>, String> {
    match value {
        serde_yaml::Value::Null => Ok(None),
        serde_yaml::Value::String(s) => Ok(Some(s)),
        serde_yaml::Value::Number(n) => Ok(Some(n.to_string())),
        serde_yaml::Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(format!("expected a scalar, got {other:?}")),
    }
}
