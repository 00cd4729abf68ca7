//! `daybook pull`: install every artifact mapped to this host.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::HostIdentity;
use crate::application::services::{PullOptions, pull_host};
use crate::infra::fs::LocalFs;
use crate::infra::host::{FixedHostname, SystemHostname};
use crate::output::TerminalReporter;

/// Arguments for the pull command.
#[derive(Args)]
pub struct PullArgs {
    /// Resolve as this host instead of the configured or system hostname
    #[arg(long)]
    pub hostname: Option<String>,

    /// Install root [default: install_dir from config]
    #[arg(long, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// Extract into a staging directory and swap it in on success
    #[arg(long)]
    pub staged: bool,
}

/// Run the pull command.
///
/// # Errors
///
/// Returns an error if the hostname cannot be determined or any artifact
/// fails to install.
pub async fn run(app: &AppContext, args: &PullArgs) -> Result<()> {
    let host = match args.hostname.clone().or_else(|| app.config.hostname.clone()) {
        Some(name) => FixedHostname(name).hostname()?,
        None => SystemHostname::default().hostname()?,
    };
    let install_dir = args
        .install_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&app.config.install_dir));

    let registry = app.registry();
    let store = app.artifact_store().await?;
    let extractor = app.extractor();

    let summary = {
        let reporter = TerminalReporter::new(&app.output);
        let opts = PullOptions {
            reporter: &reporter,
            install_dir: &install_dir,
            staged: args.staged || app.config.staged_install,
        };
        tokio::task::block_in_place(|| {
            pull_host(&registry, &store, &extractor, &LocalFs, &host, &opts)
        })
        .with_context(|| format!("pull for host '{host}' failed"))?
    };

    app.renderer().render_pull(&summary)
}
