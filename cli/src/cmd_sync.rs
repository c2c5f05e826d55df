// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use cardsync_core::{CardId, PushOutcome, StatusReport};
use clap::{ArgGroup, ArgMatches, Command, arg};
use colored::{ColoredString, Colorize};

use crate::arg::{CardArgs, CommonArgs};
use crate::report_formatter::{ReportFormatter, ReportRow};
use crate::session::Session;
use crate::util::OutputFormat;

#[derive(Debug, Clone)]
pub struct CmdPush {
    pub ids: Vec<CardId>,
    pub all: bool,
    pub output_format: OutputFormat,
}

impl CmdPush {
    pub const NAME: &str = "push";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Push local cards to the remote repository")
            .arg(CardArgs::ids(false))
            .arg(arg!(-a --all "Push every card"))
            .group(ArgGroup::new("target").args(["id", "all"]).required(true))
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            ids: CardArgs::get_ids(matches),
            all: matches.get_flag("all"),
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, session: &Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "pushing cards...");
        let outcomes = if self.all {
            session.engine.push_all().await?
        } else {
            session.engine.push_many(self.ids).await?
        };
        print_push(&outcomes, self.output_format)
    }
}

#[derive(Debug, Clone)]
pub struct CmdPull {
    pub yes: bool,
    pub output_format: OutputFormat,
}

impl CmdPull {
    pub const NAME: &str = "pull";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Pull remote changes into local cards")
            .arg(CommonArgs::yes())
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            yes: CommonArgs::get_yes(matches),
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, session: &Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "pulling cards...");
        let report = session.engine.pull().await?;

        let rows = ReportRow::from_pull(&report);
        print_rows(&rows, self.output_format);
        if self.output_format == OutputFormat::Table {
            println!("{} unchanged", report.unchanged);
        }
        check_failures(&rows)
    }
}

#[derive(Debug, Clone)]
pub struct CmdSync {
    pub yes: bool,
    pub output_format: OutputFormat,
}

impl CmdSync {
    pub const NAME: &str = "sync";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Pull remote changes, then push every local card")
            .arg(CommonArgs::yes())
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            yes: CommonArgs::get_yes(matches),
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, session: &Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "synchronizing cards...");
        let report = session.engine.sync().await?;

        let mut rows = ReportRow::from_pull(&report.pull);
        rows.extend(
            report
                .push
                .iter()
                .filter(|(_, outcome)| is_notable(outcome))
                .map(|(id, outcome)| ReportRow::from_push(id, outcome)),
        );
        print_rows(&rows, self.output_format);
        check_failures(&rows)
    }
}

#[derive(Debug, Clone)]
pub struct CmdRetry {
    pub output_format: OutputFormat,
}

impl CmdRetry {
    pub const NAME: &str = "retry";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Retry the pushes that failed earlier")
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, session: &Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "draining retry queue...");
        let outcomes = session.engine.retry_failed().await?;
        if outcomes.is_empty() && self.output_format == OutputFormat::Table {
            println!("Nothing to retry");
            return Ok(());
        }
        print_push(&outcomes, self.output_format)
    }
}

#[derive(Debug, Clone)]
pub struct CmdStatus {
    pub output_format: OutputFormat,
}

impl CmdStatus {
    pub const NAME: &str = "status";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Show the synchronization state")
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, session: &Session) -> Result<(), Box<dyn Error>> {
        let status = session.engine.status().await;
        match self.output_format {
            OutputFormat::Json => println!("{}", status_json(&status)),
            OutputFormat::Table => print_status(&status),
        }
        Ok(())
    }
}

fn print_push(
    outcomes: &[(CardId, PushOutcome)],
    output_format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let rows: Vec<_> = outcomes
        .iter()
        .map(|(id, outcome)| ReportRow::from_push(id, outcome))
        .collect();
    print_rows(&rows, output_format);
    check_failures(&rows)
}

fn print_rows(rows: &[ReportRow], output_format: OutputFormat) {
    if rows.is_empty() && output_format == OutputFormat::Table {
        println!("Everything up to date");
        return;
    }
    let formatter = ReportFormatter::new().with_output_format(output_format);
    println!("{}", formatter.format(rows));
}

fn check_failures(rows: &[ReportRow]) -> Result<(), Box<dyn Error>> {
    let failed = rows.iter().filter(|r| r.action.is_failure()).count();
    match failed {
        0 => Ok(()),
        1 => Err("1 card could not be synchronized".into()),
        n => Err(format!("{n} cards could not be synchronized").into()),
    }
}

/// Outcomes of a full push worth showing after a pull.
fn is_notable(outcome: &PushOutcome) -> bool {
    !matches!(outcome, PushOutcome::Unchanged | PushOutcome::Skipped)
}

fn print_status(status: &StatusReport) {
    println!("{}{}", field("repository"), status.repository);
    println!("{}{}", field("directory"), display_dir(&status.directory));
    println!("{}{}", field("policy"), status.policy);
    println!("{}{}", field("tracked"), status.tracked);
    if status.queued.is_empty() {
        println!("{}{}", field("queued"), 0);
    } else {
        let ids: Vec<_> = status.queued.iter().map(CardId::as_str).collect();
        println!(
            "{}{} ({})",
            field("queued"),
            status.queued.len().to_string().yellow(),
            ids.join(", ")
        );
    }
}

fn field(name: &str) -> ColoredString {
    format!("{name:<12}").bold()
}

fn status_json(status: &StatusReport) -> serde_json::Value {
    serde_json::json!({
        "repository": status.repository,
        "directory": status.directory,
        "policy": status.policy.as_str(),
        "tracked": status.tracked,
        "queued": status.queued.iter().map(CardId::as_str).collect::<Vec<_>>(),
    })
}

fn display_dir(dir: &str) -> &str {
    if dir.is_empty() { "/" } else { dir }
}
