//! `daybook versions`: list stored versions of a service.

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;

/// Arguments for the versions command.
#[derive(Args)]
pub struct VersionsArgs {
    /// Service name
    pub service: String,
}

/// Run the versions command.
///
/// # Errors
///
/// Returns an error if the bucket cannot be listed.
pub async fn run(app: &AppContext, args: &VersionsArgs) -> Result<()> {
    let store = app.artifact_store().await?;
    let versions = tokio::task::block_in_place(|| store.list_versions(&args.service))
        .with_context(|| format!("listing versions of '{}'", args.service))?;
    app.renderer().render_versions(&args.service, &versions)
}
