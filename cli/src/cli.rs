//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::app::{AppContext, AppFlags, OutputFlags};
use crate::commands;

/// Pull-based artifact distribution for hosts
#[derive(Parser)]
#[command(
    name = "daybook",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Config file, JSON or YAML [default: $DAYBOOK_CONFIG or /etc/daybook.json]
    #[arg(long, global = true, value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Log more (-v info, -vv debug). `RUST_LOG` takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install every artifact mapped to this host
    Pull(commands::pull::PullArgs),

    /// Upload a local archive as a service version
    Push(commands::push::PushArgs),

    /// Manage host pattern mappings
    #[command(subcommand)]
    Map(commands::map::MapCommand),

    /// List stored versions of a service
    Versions(commands::versions::VersionsArgs),
}

impl Cli {
    /// Default log filter for the `-v` count.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails to load or the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            config_file,
            json,
            quiet,
            no_color,
            verbose: _,
            command,
        } = self;

        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            config_file,
        })?;

        match command {
            Command::Pull(args) => commands::pull::run(&app, &args).await,
            Command::Push(args) => commands::push::run(&app, &args).await,
            Command::Map(cmd) => commands::map::run(&app, cmd).await,
            Command::Versions(args) => commands::versions::run(&app, &args).await,
        }
    }
}
