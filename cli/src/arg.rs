// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use cardsync_core::CardId;
use clap::{Arg, ArgAction, ArgMatches, arg, value_parser};

use crate::util::OutputFormat;

#[derive(Debug, Clone, Copy)]
pub struct CommonArgs;

impl CommonArgs {
    pub fn verbose() -> Arg {
        arg!(-v --verbose "Show more detailed information").global(true)
    }

    pub fn get_verbose(matches: &ArgMatches) -> bool {
        matches.get_flag("verbose")
    }

    pub fn output_format() -> Arg {
        arg!(--"output-format" <FORMAT> "Output format")
            .value_parser(value_parser!(OutputFormat))
            .default_value("table")
    }

    pub fn get_output_format(matches: &ArgMatches) -> OutputFormat {
        matches
            .get_one("output-format")
            .copied()
            .unwrap_or(OutputFormat::Table)
    }

    pub fn yes() -> Arg {
        arg!(-y --yes "Apply remote deletions without asking")
    }

    pub fn get_yes(matches: &ArgMatches) -> bool {
        matches.get_flag("yes")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CardArgs;

impl CardArgs {
    pub fn ids(required: bool) -> Arg {
        arg!(id: [ID] "Ids of the cards")
            .num_args(1..)
            .required(required)
    }

    pub fn get_ids(matches: &ArgMatches) -> Vec<CardId> {
        matches
            .get_many::<String>("id")
            .map(|ids| ids.map(CardId::new).collect())
            .unwrap_or_default()
    }

    pub fn tags() -> Arg {
        arg!(-t --tag <TAG> "Tag to attach, may be repeated").action(ArgAction::Append)
    }

    pub fn get_tags(matches: &ArgMatches) -> Vec<String> {
        matches
            .get_many::<String>("tag")
            .map(|tags| tags.cloned().collect())
            .unwrap_or_default()
    }
}
