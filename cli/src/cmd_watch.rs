// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{collections::HashMap, error::Error, sync::Arc, time::Duration};

use cardsync_core::{Card, CardId, LocalDb, SyncScheduler};
use clap::{ArgMatches, Command, arg, value_parser};
use colored::Colorize;
use jiff::Timestamp;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};

use crate::arg::CommonArgs;
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct CmdWatch {
    pub poll_secs: u64,
    pub yes: bool,
}

impl CmdWatch {
    pub const NAME: &str = "watch";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Keep synchronizing until interrupted")
            .arg(
                arg!(--poll <SECONDS> "Seconds between checks of the local cards")
                    .value_parser(value_parser!(u64).range(1..))
                    .default_value("2"),
            )
            .arg(CommonArgs::yes())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            poll_secs: matches.get_one::<u64>("poll").copied().unwrap_or(2),
            yes: CommonArgs::get_yes(matches),
        }
    }

    pub async fn run(self, session: &Session) -> Result<(), Box<dyn Error>> {
        let config = session.engine.config();
        tracing::info!(
            repository = %config.repository,
            auto_push = config.auto_push,
            auto_pull = config.auto_pull,
            "watching cards"
        );
        println!(
            "{} {} (press Ctrl-C to stop)",
            "Watching".green().bold(),
            config.repository
        );

        let (tx, rx) = mpsc::channel(64);
        let poller = config.auto_push.then(|| {
            let db = session.db.clone();
            let period = Duration::from_secs(self.poll_secs);
            tokio::spawn(poll_changes(db, period, tx))
        });

        let scheduler = SyncScheduler::new(session.engine.clone());
        let result = scheduler
            .run(rx, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("failed to listen for Ctrl-C: {e}");
                    std::future::pending::<()>().await;
                }
            })
            .await;

        if let Some(poller) = poller {
            poller.abort();
        }
        result?;
        println!("{}", "Stopped".bold());
        Ok(())
    }
}

/// Sends the ids of cards whose modification time changed.
async fn poll_changes(db: Arc<LocalDb>, period: Duration, tx: mpsc::Sender<CardId>) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    let mut tracker = match db.list_cards().await {
        Ok(cards) => ChangeTracker::new(&cards),
        Err(e) => {
            tracing::warn!("failed to list cards: {e}");
            ChangeTracker::default()
        }
    };

    loop {
        ticker.tick().await;
        let cards = match db.list_cards().await {
            Ok(cards) => cards,
            Err(e) => {
                tracing::warn!("failed to list cards: {e}");
                continue;
            }
        };

        for id in tracker.update(&cards) {
            tracing::debug!(card_id = %id, "local card changed");
            if tx.send(id).await.is_err() {
                return; // scheduler stopped
            }
        }
    }
}

/// Remembers the modification time of every card between polls.
#[derive(Debug, Default)]
struct ChangeTracker {
    seen: HashMap<CardId, Option<Timestamp>>,
}

impl ChangeTracker {
    fn new(cards: &[Card]) -> Self {
        Self {
            seen: cards
                .iter()
                .map(|card| (card.id.clone(), card.updated_at))
                .collect(),
        }
    }

    /// Ids of new or modified cards since the last call.
    fn update(&mut self, cards: &[Card]) -> Vec<CardId> {
        let mut changed = Vec::new();
        let mut seen = HashMap::with_capacity(cards.len());
        for card in cards {
            if self.seen.get(&card.id) != Some(&card.updated_at) {
                changed.push(card.id.clone());
            }
            seen.insert(card.id.clone(), card.updated_at);
        }
        self.seen = seen;
        changed
    }
}
