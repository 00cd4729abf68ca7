//! `daybook map`: manage host pattern to service mappings.

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::app::AppContext;

/// Map subcommands.
#[derive(Subcommand)]
pub enum MapCommand {
    /// Add services to a host pattern, creating it if needed
    Add {
        /// Glob over hostnames, e.g. `web-*` or `db-[0-9]`
        pattern: String,
        /// Service names
        #[arg(required = true)]
        services: Vec<String>,
    },
    /// Remove services from a host pattern
    Remove {
        /// Host pattern
        pattern: String,
        /// Service names
        #[arg(required = true)]
        services: Vec<String>,
    },
    /// Show services for one pattern, or every pattern
    List {
        /// Host pattern; omit to list all
        pattern: Option<String>,
    },
    /// Show which services a host resolves to
    Resolve {
        /// Hostname to resolve
        host: String,
    },
}

/// Run the map command.
///
/// # Errors
///
/// Returns an error if the pattern is malformed, absent (for `list`), or the
/// registry is unreachable.
pub async fn run(app: &AppContext, cmd: MapCommand) -> Result<()> {
    let registry = app.registry();
    let renderer = app.renderer();

    match cmd {
        MapCommand::Add { pattern, services } => {
            let updated = tokio::task::block_in_place(|| registry.add_services(&pattern, &services))
                .with_context(|| format!("adding services to '{pattern}'"))?;
            tracing::info!(%pattern, ?services, "services mapped");
            renderer.render_services(&pattern, Some(updated.as_slice()))
        }
        MapCommand::Remove { pattern, services } => {
            let updated =
                tokio::task::block_in_place(|| registry.remove_services(&pattern, &services))
                    .with_context(|| format!("removing services from '{pattern}'"))?;
            renderer.render_services(&pattern, updated.as_deref())
        }
        MapCommand::List {
            pattern: Some(pattern),
        } => {
            let services = tokio::task::block_in_place(|| registry.list_services(&pattern))?;
            renderer.render_services(&pattern, Some(services.as_slice()))
        }
        MapCommand::List { pattern: None } => {
            let entries = tokio::task::block_in_place(|| registry.entries())?;
            renderer.render_entries(&entries)
        }
        MapCommand::Resolve { host } => {
            let services =
                tokio::task::block_in_place(|| registry.resolve_services_for_host(&host))
                    .with_context(|| format!("resolving host '{host}'"))?;
            renderer.render_resolution(&host, &services)
        }
    }
}
