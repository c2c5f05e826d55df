// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

mod arg;
mod card_formatter;
mod cli;
mod cmd_card;
mod cmd_generate_completion;
mod cmd_sync;
mod cmd_watch;
mod config;
mod prompt;
mod report_formatter;
mod session;
mod table;
mod util;

pub use crate::cli::{Cli, Commands, run};
