// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use cardsync_core::{Card, CardHost, CardId};
use clap::{ArgMatches, Command, arg};
use colored::Colorize;
use jiff::Timestamp;

use crate::arg::{CardArgs, CommonArgs};
use crate::card_formatter::{CardFormatter, CardWithMark};
use crate::report_formatter::{ReportFormatter, ReportRow};
use crate::session::Session;
use crate::util::OutputFormat;

#[derive(Debug, Clone)]
pub struct CmdCardAdd {
    pub id: Option<String>,
    pub front: String,
    pub back: String,
    pub tags: Vec<String>,
    pub output_format: OutputFormat,
}

impl CmdCardAdd {
    pub const NAME: &str = "add";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("new")
            .about("Add a card")
            .arg(arg!(front: <FRONT> "Question, in markdown"))
            .arg(arg!(back: <BACK> "Answer, in markdown"))
            .arg(arg!(--id <ID> "Id of the card, generated if omitted"))
            .arg(CardArgs::tags())
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            id: matches.get_one::<String>("id").cloned(),
            front: matches
                .get_one::<String>("front")
                .cloned()
                .unwrap_or_default(),
            back: matches
                .get_one::<String>("back")
                .cloned()
                .unwrap_or_default(),
            tags: CardArgs::get_tags(matches),
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub fn to_card(&self, now: Timestamp) -> Card {
        let id = self.id.clone().map_or_else(CardId::generate, CardId::new);
        let mut card = Card::new(id, self.front.clone(), self.back.clone());
        card.tags = self.tags.iter().cloned().collect();
        card.updated_at = Some(now);
        card
    }

    pub async fn run(self, session: &Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "adding card...");
        let id = session.db.create_card(&self.to_card(Timestamp::now())).await?;

        if session.engine.config().auto_push {
            match session.engine.push(&id).await {
                Ok(outcome) => tracing::info!(card_id = %id, %outcome, "card pushed"),
                Err(e) => println!("{} card not pushed: {e}", "Warning:".yellow()),
            }
        }

        print_cards(session, &[id], self.output_format).await
    }
}

#[derive(Debug, Clone)]
pub struct CmdCardList {
    pub archived: bool,
    pub output_format: OutputFormat,
}

impl CmdCardList {
    pub const NAME: &str = "list";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("ls")
            .about("List cards")
            .arg(arg!(--archived "Include archived cards"))
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            archived: matches.get_flag("archived"),
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, session: &Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "listing cards...");
        let state = session.engine.state().await;
        let cards: Vec<_> = session
            .db
            .list_cards()
            .await?
            .into_iter()
            .filter(|card| self.archived || !card.is_archived())
            .map(|card| CardWithMark::with(&state, card))
            .collect();

        let formatter = CardFormatter::new().with_output_format(self.output_format);
        println!("{}", formatter.format(&cards));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CmdCardDelete {
    pub ids: Vec<CardId>,
    pub keep_remote: bool,
    pub output_format: OutputFormat,
}

impl CmdCardDelete {
    pub const NAME: &str = "delete";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("rm")
            .about("Delete cards, and their remote artifacts")
            .arg(CardArgs::ids(true))
            .arg(arg!(--"keep-remote" "Only delete the local cards"))
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            ids: CardArgs::get_ids(matches),
            keep_remote: matches.get_flag("keep-remote"),
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, session: &Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "deleting cards...");
        let mut rows = Vec::with_capacity(self.ids.len());
        let mut failed = 0;
        for id in &self.ids {
            session.db.delete_card(id).await?;
            if self.keep_remote {
                rows.push(ReportRow::deleted(id, "deleted locally"));
                continue;
            }

            match session.engine.delete_remote(id).await {
                Ok(true) => rows.push(ReportRow::deleted(id, "deleted locally and remotely")),
                Ok(false) => rows.push(ReportRow::deleted(id, "deleted locally, not tracked")),
                Err(e) => {
                    failed += 1;
                    rows.push(ReportRow::failed(id, format!("remote artifact kept: {e}")));
                }
            }
        }

        let formatter = ReportFormatter::new().with_output_format(self.output_format);
        println!("{}", formatter.format(&rows));
        match failed {
            0 => Ok(()),
            n => Err(format!("{n} remote artifacts could not be deleted").into()),
        }
    }
}

async fn print_cards(
    session: &Session,
    ids: &[CardId],
    output_format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let state = session.engine.state().await;
    let mut cards = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(card) = session.db.get_card(id).await? {
            cards.push(CardWithMark::with(&state, card));
        }
    }
    let formatter = CardFormatter::new().with_output_format(output_format);
    println!("{}", formatter.format(&cards));
    Ok(())
}
