// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{borrow::Cow, fmt};

use cardsync_core::{CardId, DeletionOutcome, PullReport, PushOutcome};
use colored::Color;

use crate::table::{PaddingDirection, Table, TableColumn, TableStyleBasic, TableStyleJson};
use crate::util::OutputFormat;

/// One line of a sync report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub action: Action,
    pub target: String,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Created,
    Updated,
    KeptLocal,
    Conflict,
    Removed,
    Deleted,
    Pushed,
    Unchanged,
    Skipped,
    Queued,
    Failed,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Action::Created => "created",
            Action::Updated => "updated",
            Action::KeptLocal => "kept",
            Action::Conflict => "conflict",
            Action::Removed => "removed",
            Action::Deleted => "deleted",
            Action::Pushed => "pushed",
            Action::Unchanged => "unchanged",
            Action::Skipped => "skipped",
            Action::Queued => "queued",
            Action::Failed => "failed",
        }
    }

    fn color(self) -> Option<Color> {
        match self {
            Action::Created | Action::Updated | Action::Pushed => Some(Color::Green),
            Action::Conflict | Action::Queued | Action::KeptLocal => Some(Color::Yellow),
            Action::Failed => Some(Color::Red),
            Action::Removed | Action::Deleted => Some(Color::Magenta),
            Action::Unchanged | Action::Skipped => None,
        }
    }

    /// Whether the row reports something the user has to look at.
    pub fn is_failure(self) -> bool {
        matches!(self, Action::Failed | Action::Queued)
    }
}

impl ReportRow {
    fn new(action: Action, target: impl fmt::Display, detail: impl Into<String>) -> Self {
        Self {
            action,
            target: target.to_string(),
            detail: detail.into(),
        }
    }

    pub fn deleted(id: &CardId, detail: impl Into<String>) -> Self {
        Self::new(Action::Deleted, id, detail)
    }

    pub fn failed(id: &CardId, detail: impl Into<String>) -> Self {
        Self::new(Action::Failed, id, detail)
    }

    pub fn from_push(id: &CardId, outcome: &PushOutcome) -> Self {
        let action = match outcome {
            PushOutcome::Written { .. } => Action::Pushed,
            PushOutcome::Unchanged => Action::Unchanged,
            PushOutcome::Skipped | PushOutcome::Missing => Action::Skipped,
            PushOutcome::RemoteApplied { .. } => Action::Updated,
            PushOutcome::Conflict { .. } => Action::Conflict,
            PushOutcome::Queued(_) => Action::Queued,
            PushOutcome::Failed(_) => Action::Failed,
        };
        Self::new(action, id, outcome.to_string())
    }

    /// Rows of a pull, unchanged artifacts left out.
    pub fn from_pull(report: &PullReport) -> Vec<Self> {
        let mut rows = Vec::new();
        for id in &report.created {
            rows.push(Self::new(Action::Created, id, "new card from remote"));
        }
        for id in &report.updated {
            rows.push(Self::new(Action::Updated, id, "remote version applied"));
        }
        for id in &report.kept_local {
            rows.push(Self::new(Action::KeptLocal, id, "local version is newer"));
        }
        for path in &report.conflicts {
            rows.push(Self::new(Action::Conflict, path, "both sides changed"));
        }
        for (id, outcome) in &report.removed {
            let detail = match outcome {
                DeletionOutcome::Archived => "deleted remotely, archived",
                DeletionOutcome::Deleted => "deleted remotely, deleted",
                DeletionOutcome::Kept => "deleted remotely, kept",
                DeletionOutcome::Declined => "deleted remotely, declined",
                DeletionOutcome::Missing => "deleted remotely, already gone",
            };
            rows.push(Self::new(Action::Removed, id, detail));
        }
        for (path, err) in &report.failed {
            rows.push(Self::new(Action::Failed, path, err.to_string()));
        }
        rows
    }
}

#[derive(Debug)]
pub struct ReportFormatter {
    columns: Vec<ReportColumn>,
    format: OutputFormat,
}

impl ReportFormatter {
    pub fn new() -> Self {
        Self {
            columns: vec![ReportColumn::Action, ReportColumn::Target, ReportColumn::Detail],
            format: OutputFormat::Table,
        }
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format<'a>(&'a self, rows: &'a [ReportRow]) -> Display<'a> {
        Display {
            rows,
            formatter: self,
        }
    }
}

#[derive(Debug)]
pub struct Display<'a> {
    rows: &'a [ReportRow],
    formatter: &'a ReportFormatter,
}

impl fmt::Display for Display<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = &self.formatter.columns;
        match self.formatter.format {
            OutputFormat::Json => write!(
                f,
                "{}",
                Table::new(TableStyleJson::new(), columns, self.rows)
            ),
            OutputFormat::Table => write!(
                f,
                "{}",
                Table::new(TableStyleBasic::new(), columns, self.rows)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ReportColumn {
    Action,
    Target,
    Detail,
}

impl TableColumn<ReportRow> for ReportColumn {
    fn name(&self) -> Cow<'_, str> {
        match self {
            ReportColumn::Action => "Action",
            ReportColumn::Target => "Target",
            ReportColumn::Detail => "Detail",
        }
        .into()
    }

    fn format<'a>(&self, data: &'a ReportRow) -> Cow<'a, str> {
        match self {
            ReportColumn::Action => data.action.as_str().into(),
            ReportColumn::Target => data.target.as_str().into(),
            ReportColumn::Detail => data.detail.as_str().into(),
        }
    }

    fn padding_direction(&self) -> PaddingDirection {
        PaddingDirection::Left
    }

    fn get_color(&self, data: &ReportRow) -> Option<Color> {
        match self {
            ReportColumn::Action => data.action.color(),
            _ => None,
        }
    }
}
