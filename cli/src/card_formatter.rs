// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{borrow::Cow, fmt};

use cardsync_core::{Card, SyncState};
use colored::Color;

use crate::table::{PaddingDirection, Table, TableColumn, TableStyleBasic, TableStyleJson};
use crate::util::{OutputFormat, format_timestamp, truncate_line};

const FRONT_WIDTH: usize = 48;

/// Where a card stands relative to the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMark {
    /// Has a remote artifact.
    Tracked,
    /// Waiting in the retry queue.
    Queued,
    /// Never pushed.
    Local,
}

impl SyncMark {
    fn as_str(self) -> &'static str {
        match self {
            SyncMark::Tracked => "synced",
            SyncMark::Queued => "queued",
            SyncMark::Local => "local",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CardWithMark {
    pub card: Card,
    pub mark: SyncMark,
}

impl CardWithMark {
    pub fn with(state: &SyncState, card: Card) -> Self {
        let mark = if state.retry.contains(&card.id) {
            SyncMark::Queued
        } else if state.identity.get(&card.id).is_some() {
            SyncMark::Tracked
        } else {
            SyncMark::Local
        };
        Self { card, mark }
    }
}

#[derive(Debug)]
pub struct CardFormatter {
    columns: Vec<CardColumn>,
    format: OutputFormat,
}

impl CardFormatter {
    pub fn new() -> Self {
        Self {
            columns: vec![
                CardColumn::Mark,
                CardColumn::Id,
                CardColumn::Updated,
                CardColumn::Tags,
                CardColumn::Front,
            ],
            format: OutputFormat::Table,
        }
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format<'a>(&'a self, cards: &'a [CardWithMark]) -> Display<'a> {
        Display {
            cards,
            formatter: self,
        }
    }
}

#[derive(Debug)]
pub struct Display<'a> {
    cards: &'a [CardWithMark],
    formatter: &'a CardFormatter,
}

impl fmt::Display for Display<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = &self.formatter.columns;
        match self.formatter.format {
            OutputFormat::Json => {
                // full text in json, no truncation
                let columns: Vec<_> = columns
                    .iter()
                    .map(|c| match c {
                        CardColumn::Front => CardColumn::FrontFull,
                        c => *c,
                    })
                    .chain([CardColumn::Back])
                    .collect();
                write!(
                    f,
                    "{}",
                    Table::new(TableStyleJson::new(), &columns, self.cards)
                )
            }
            OutputFormat::Table => write!(
                f,
                "{}",
                Table::new(TableStyleBasic::new(), columns, self.cards)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum CardColumn {
    Mark,
    Id,
    Updated,
    Tags,
    Front,
    FrontFull,
    Back,
}

impl TableColumn<CardWithMark> for CardColumn {
    fn name(&self) -> Cow<'_, str> {
        match self {
            CardColumn::Mark => "Sync",
            CardColumn::Id => "Id",
            CardColumn::Updated => "Updated",
            CardColumn::Tags => "Tags",
            CardColumn::Front | CardColumn::FrontFull => "Front",
            CardColumn::Back => "Back",
        }
        .into()
    }

    fn format<'a>(&self, data: &'a CardWithMark) -> Cow<'a, str> {
        let card = &data.card;
        match self {
            CardColumn::Mark => data.mark.as_str().into(),
            CardColumn::Id => card.id.as_str().into(),
            CardColumn::Updated => format_timestamp(card.updated_at).into(),
            CardColumn::Tags => card
                .tags
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(",")
                .into(),
            CardColumn::Front => truncate_line(&card.front, FRONT_WIDTH).into(),
            CardColumn::FrontFull => card.front.as_str().into(),
            CardColumn::Back => card.back.as_str().into(),
        }
    }

    fn padding_direction(&self) -> PaddingDirection {
        PaddingDirection::Left
    }

    fn get_color(&self, data: &CardWithMark) -> Option<Color> {
        match self {
            CardColumn::Mark => match data.mark {
                SyncMark::Tracked => Some(Color::Green),
                SyncMark::Queued => Some(Color::Yellow),
                SyncMark::Local => None,
            },
            CardColumn::Id if data.card.is_archived() => Some(Color::BrightBlack),
            _ => None,
        }
    }
}
