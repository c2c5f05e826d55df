// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::io::{self, BufRead, IsTerminal, Write};

use async_trait::async_trait;
use cardsync_core::{Card, ConfirmDeletion, RemotePath};
use colored::Colorize;
use tokio::sync::Mutex;

/// Asks on the terminal before applying a remote deletion locally.
#[derive(Debug, Default)]
pub struct DeletionPrompt {
    assume_yes: bool,
    lock: Mutex<()>,
}

impl DeletionPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ConfirmDeletion for DeletionPrompt {
    async fn confirm_remote_deletion(&self, card: &Card, path: &RemotePath) -> bool {
        if self.assume_yes {
            return true;
        }
        if !io::stdin().is_terminal() {
            tracing::warn!(
                card_id = %card.id,
                %path,
                "artifact deleted remotely, keeping the card; pass --yes to apply"
            );
            return false;
        }

        // one question at a time
        let _guard = self.lock.lock().await;
        let question = format!(
            "{} {} ({}) was deleted remotely. Apply locally? [y/N] ",
            "?".yellow().bold(),
            card.id,
            path,
        );
        match tokio::task::spawn_blocking(move || ask(&question)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                tracing::warn!(card_id = %card.id, "failed to read answer: {e}");
                false
            }
            Err(e) => {
                tracing::warn!(card_id = %card.id, "prompt task failed: {e}");
                false
            }
        }
    }
}

fn ask(question: &str) -> io::Result<bool> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(question.as_bytes())?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(is_yes(&line))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
