// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, ffi::OsString, path::PathBuf};

use cardsync_core::APP_NAME;
use clap::{ArgMatches, Command, ValueHint, arg, builder::styling, crate_version, value_parser};
use colored::Colorize;
use futures::{FutureExt, future::BoxFuture};
use tracing_subscriber::EnvFilter;

use crate::arg::CommonArgs;
use crate::cmd_card::{CmdCardAdd, CmdCardDelete, CmdCardList};
use crate::cmd_generate_completion::CmdGenerateCompletion;
use crate::cmd_sync::{CmdPull, CmdPush, CmdRetry, CmdStatus, CmdSync};
use crate::cmd_watch::CmdWatch;
use crate::config::parse_config;
use crate::session::Session;

/// Run the cardsync command-line interface.
pub async fn run() -> Result<(), Box<dyn Error>> {
    let cli = match Cli::parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            std::process::exit(2);
        }
    };

    init_tracing(cli.verbose);
    if let Err(e) = cli.run().await {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
    Ok(())
}

/// `RUST_LOG` wins unless `--verbose` asks for debug output.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,cardsync=debug,cardsync_core=debug,cardsync_remote=debug,cardsync_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Command-line interface
#[derive(Debug)]
pub struct Cli {
    /// Path to the configuration file
    pub config: Option<PathBuf>,

    /// Show debug logs
    pub verbose: bool,

    /// The command to execute
    pub command: Commands,
}

impl Cli {
    /// Create the command-line interface
    pub fn command() -> Command {
        const STYLES: styling::Styles = styling::Styles::styled()
            .header(styling::AnsiColor::Green.on_default().bold())
            .usage(styling::AnsiColor::Green.on_default().bold())
            .literal(styling::AnsiColor::Blue.on_default().bold())
            .placeholder(styling::AnsiColor::Cyan.on_default());

        Command::new(APP_NAME)
            .about("Keep flashcards in sync with a versioned remote repository.")
            .author("Zexin Yuan <aim@yzx9.xyz>")
            .version(crate_version!())
            .styles(STYLES)
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                arg!(-c --config [CONFIG] "Path to the configuration file")
                    .long_help(
                        "\
Path to the configuration file. Defaults to $XDG_CONFIG_HOME/cardsync/config.toml on Linux and MacOS, \
%LOCALAPPDATA%/cardsync/config.toml on Windows.",
                    )
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath)
                    .global(true),
            )
            .arg(CommonArgs::verbose())
            .subcommand(CmdPush::command())
            .subcommand(CmdPull::command())
            .subcommand(CmdSync::command())
            .subcommand(CmdRetry::command())
            .subcommand(CmdStatus::command())
            .subcommand(CmdWatch::command())
            .subcommand(
                Command::new("card")
                    .alias("c")
                    .about("Manage local cards")
                    .arg_required_else_help(true)
                    .subcommand_required(true)
                    .subcommand(CmdCardAdd::command())
                    .subcommand(CmdCardList::command())
                    .subcommand(CmdCardDelete::command()),
            )
            .subcommand(CmdGenerateCompletion::command())
    }

    /// Parse the command-line arguments
    pub fn parse() -> Result<Self, Box<dyn Error>> {
        let commands = Self::command();
        let matches = commands.get_matches();
        Self::from(matches)
    }

    /// Parse the specified arguments
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, Box<dyn Error>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let commands = Self::command();
        let matches = commands.try_get_matches_from(args)?;
        Self::from(matches)
    }

    /// Create a CLI instance from the `ArgMatches`
    pub fn from(matches: ArgMatches) -> Result<Self, Box<dyn Error>> {
        use Commands::*;
        let command = match matches.subcommand() {
            Some((CmdPush::NAME, matches)) => Push(CmdPush::from(matches)),
            Some((CmdPull::NAME, matches)) => Pull(CmdPull::from(matches)),
            Some((CmdSync::NAME, matches)) => Sync(CmdSync::from(matches)),
            Some((CmdRetry::NAME, matches)) => Retry(CmdRetry::from(matches)),
            Some((CmdStatus::NAME, matches)) => Status(CmdStatus::from(matches)),
            Some((CmdWatch::NAME, matches)) => Watch(CmdWatch::from(matches)),
            Some(("card", matches)) => match matches.subcommand() {
                Some((CmdCardAdd::NAME, matches)) => CardAdd(CmdCardAdd::from(matches)),
                Some((CmdCardList::NAME, matches)) => CardList(CmdCardList::from(matches)),
                Some((CmdCardDelete::NAME, matches)) => CardDelete(CmdCardDelete::from(matches)),
                _ => return Err("Unknown card command".into()),
            },
            Some((CmdGenerateCompletion::NAME, matches)) => {
                GenerateCompletion(CmdGenerateCompletion::from(matches))
            }
            _ => return Err("No command given".into()),
        };

        let config = matches.get_one("config").cloned();
        let verbose = CommonArgs::get_verbose(&matches);
        Ok(Cli {
            config,
            verbose,
            command,
        })
    }

    /// Run the command
    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        self.command.run(self.config).await
    }
}

/// The commands available in the CLI
#[derive(Debug, Clone)]
pub enum Commands {
    /// Push cards
    Push(CmdPush),

    /// Pull remote changes
    Pull(CmdPull),

    /// Pull, then push everything
    Sync(CmdSync),

    /// Retry failed pushes
    Retry(CmdRetry),

    /// Show the synchronization state
    Status(CmdStatus),

    /// Synchronize continuously
    Watch(CmdWatch),

    /// Add a card
    CardAdd(CmdCardAdd),

    /// List cards
    CardList(CmdCardList),

    /// Delete cards
    CardDelete(CmdCardDelete),

    /// Generate shell completion
    GenerateCompletion(CmdGenerateCompletion),
}

impl Commands {
    /// Run the command with the given configuration
    #[rustfmt::skip]
    pub async fn run(self, config: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
        use Commands::*;
        match self {
            Push(a)       => Self::run_with(config, false, |x| a.run(x).boxed()).await,
            Pull(a)       => Self::run_with(config, a.yes, |x| a.run(x).boxed()).await,
            Sync(a)       => Self::run_with(config, a.yes, |x| a.run(x).boxed()).await,
            Retry(a)      => Self::run_with(config, false, |x| a.run(x).boxed()).await,
            Status(a)     => Self::run_with(config, false, |x| a.run(x).boxed()).await,
            Watch(a)      => Self::run_with(config, a.yes, |x| a.run(x).boxed()).await,
            CardAdd(a)    => Self::run_with(config, false, |x| a.run(x).boxed()).await,
            CardList(a)   => Self::run_with(config, false, |x| a.run(x).boxed()).await,
            CardDelete(a) => Self::run_with(config, false, |x| a.run(x).boxed()).await,
            GenerateCompletion(a) => a.run(),
        }
    }

    async fn run_with<F>(
        config: Option<PathBuf>,
        assume_yes: bool,
        f: F,
    ) -> Result<(), Box<dyn Error>>
    where
        F: for<'a> FnOnce(&'a Session) -> BoxFuture<'a, Result<(), Box<dyn Error>>>,
    {
        tracing::debug!("parsing configuration...");
        let config = parse_config(config).await?;
        let session = Session::open(config, assume_yes).await?;

        let result = f(&session).await;

        // state is flushed even when the command failed
        session.close().await?;
        result
    }
}
