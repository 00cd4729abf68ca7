//! Daybook CLI - pull-based artifact distribution for hosts

use clap::Parser;
use tracing_subscriber::EnvFilter;

use daybook_cli::cli::Cli;
use daybook_cli::output::json::{error_code, format_error};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let json = cli.json;
    if let Err(e) = cli.run().await {
        let message = format!("{e:#}");
        match format_error(&message, error_code(&e)) {
            Ok(body) if json => println!("{body}"),
            _ => eprintln!("Error: {message}"),
        }
        std::process::exit(1);
    }
}
