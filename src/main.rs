//! Builder CLI - configuration-driven build orchestrator
//!
//! Entry point for the builder command-line application.

use anyhow::Result;
use clap::Parser;

use builder::cli::output::{display_error, set_quiet};
use builder::cli::Cli;
use builder::error::BuilderError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    set_quiet(cli.quiet);

    // Run the action and map errors to exit codes
    match cli.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            let code = e
                .downcast_ref::<BuilderError>()
                .map_or(1, BuilderError::exit_code);
            std::process::exit(code);
        }
    }
}
