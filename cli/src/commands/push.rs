//! `daybook push`: upload a local archive as a service version.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use daybook_common::Service;

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::infra::fs::sha256_file;
use crate::output::TerminalReporter;

/// Arguments for the push command.
#[derive(Args)]
pub struct PushArgs {
    /// Service name
    pub service: String,

    /// Version label
    pub version: String,

    /// Local archive (.tar.gz or .tar)
    pub path: PathBuf,
}

/// Run the push command.
///
/// # Errors
///
/// Returns an error if the archive is rejected or the upload fails.
pub async fn run(app: &AppContext, args: &PushArgs) -> Result<()> {
    let service = Service::versioned(&args.service, &args.version);
    let store = app.artifact_store().await?;

    let reporter = TerminalReporter::new(&app.output);
    reporter.step(&format!("uploading {service}..."));
    let key = tokio::task::block_in_place(|| store.store(&service, &args.path))
        .with_context(|| format!("push of {service} failed"))?;
    reporter.success(&format!("uploaded {key}"));
    drop(reporter);

    let size = std::fs::metadata(&args.path)
        .with_context(|| format!("reading size of {}", args.path.display()))?
        .len();
    let sha256 = sha256_file(&args.path)?;
    app.renderer().render_push(&service, &key, size, &sha256)
}
