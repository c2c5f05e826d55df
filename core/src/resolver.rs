// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// How to settle a card changed on both sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// The later modification wins; equal times tie.
    #[default]
    Newer,
    /// The remote artifact always wins.
    #[serde(alias = "prefer-github")]
    PreferRemote,
    /// The local card always wins.
    #[serde(alias = "prefer-remnote")]
    PreferLocal,
}

impl ConflictPolicy {
    /// Canonical configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newer => "newer",
            Self::PreferRemote => "prefer-remote",
            Self::PreferLocal => "prefer-local",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newer" => Ok(Self::Newer),
            "prefer-remote" | "prefer-github" => Ok(Self::PreferRemote),
            "prefer-local" | "prefer-remnote" => Ok(Self::PreferLocal),
            other => Err(format!("unknown conflict policy '{other}'")),
        }
    }
}

/// Outcome of conflict resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Keep the local card and overwrite the remote.
    UseLocal,
    /// Apply the remote artifact to the local card.
    UseRemote,
    /// Neither side wins; record the conflict.
    Tie,
}

/// Decides which side of a conflict wins.
///
/// Under [`ConflictPolicy::Newer`] a missing timestamp is older than any
/// present one, and two missing timestamps tie.
#[must_use]
pub fn resolve(
    local: Option<Timestamp>,
    remote: Option<Timestamp>,
    policy: ConflictPolicy,
) -> Resolution {
    match policy {
        ConflictPolicy::PreferRemote => Resolution::UseRemote,
        ConflictPolicy::PreferLocal => Resolution::UseLocal,
        ConflictPolicy::Newer => match local.cmp(&remote) {
            std::cmp::Ordering::Greater => Resolution::UseLocal,
            std::cmp::Ordering::Less => Resolution::UseRemote,
            std::cmp::Ordering::Equal => Resolution::Tie,
        },
    }
}
