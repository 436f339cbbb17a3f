//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! Resolution and execution belong in the [`crate::core`] module.

pub mod output;

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::{self, defaults};
use crate::core::engine::{Engine, Request};
use crate::core::project_config::ProjectConfig;
use crate::error::BuilderError;
use crate::infra::dirs::BuilderDirs;
use crate::infra::process::SystemRunner;
use crate::infra::toolchain::{host_platform, Toolchain};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    " ",
    env!("VERGEN_BUILD_DATE"),
    ")"
);

/// Builder - configuration-driven build orchestrator
///
/// Builds and runs the project's configure product, then executes the
/// action named by COMMAND with the settings it describes.
#[derive(Parser, Debug)]
#[command(name = "builder")]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
pub struct Cli {
    /// Action to execute (build, test, run, or any action the project defines)
    #[arg(default_value = defaults::COMMAND)]
    pub command: String,

    /// Build configuration (debug, release, ...)
    #[arg(short, long, default_value = defaults::CONFIGURATION)]
    pub configuration: String,

    /// Platform tag used to filter settings (defaults to the host)
    #[arg(long)]
    pub platform: Option<String>,

    /// Name of the product that prints the build configuration
    #[arg(long)]
    pub product: Option<String>,

    /// Compiler driver to use instead of the one on PATH
    #[arg(long, env = config::env::DRIVER)]
    pub driver: Option<PathBuf>,

    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Execute the requested action in the current directory
    pub async fn run(self) -> Result<()> {
        let project_dir =
            std::env::current_dir().context("Couldn't determine the current directory")?;

        let mut project =
            ProjectConfig::load(&project_dir, &BuilderDirs::new()).map_err(BuilderError::from)?;
        if let Some(product) = self.product {
            project.configure_product = Some(product);
        }

        let driver = self.driver.or_else(|| project.driver.clone());
        let toolchain = Toolchain::locate(driver.as_deref());
        tracing::debug!("Using driver {}", toolchain.driver.display());

        let platform = self
            .platform
            .unwrap_or_else(|| host_platform().to_string());
        let request = Request::new(&self.command, &platform, project_dir)
            .with_configuration(&self.configuration)
            .with_forwarded_args(forwarded_args());

        let runner = SystemRunner;
        let mut engine = Engine::new(&runner, toolchain, project, request, inherited_env());
        engine.detect_environment().await;
        engine.execute().await?;

        output::done();
        Ok(())
    }
}

fn forwarded_args() -> Vec<String> {
    std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

fn inherited_env() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}
