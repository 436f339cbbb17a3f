//! Toolchain location and driver invocation
//!
//! Tool paths are resolved once at startup and handed to the engine. The
//! driver methods only build argument lists; running them is the
//! [`ProcessRunner`](crate::infra::process::ProcessRunner)'s job.

use std::path::{Path, PathBuf};

use crate::config::defaults;

/// Paths to the external tools the builder drives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Compiler driver (`swift` by default)
    pub driver: PathBuf,
    /// Version control tool
    pub git: PathBuf,
    /// SDK locator, only on platforms that have one
    pub xcrun: Option<PathBuf>,
}

impl Toolchain {
    /// Locate every tool, preferring `driver` when given
    pub fn locate(driver: Option<&Path>) -> Self {
        Self {
            driver: driver.map_or_else(|| locate_tool(defaults::DRIVER), Path::to_path_buf),
            git: locate_tool("git"),
            xcrun: cfg!(target_os = "macos").then(|| locate_tool("xcrun")),
        }
    }

    /// Toolchain with explicit paths and no SDK locator
    pub fn with_paths(driver: impl Into<PathBuf>, git: impl Into<PathBuf>) -> Self {
        Self {
            driver: driver.into(),
            git: git.into(),
            xcrun: None,
        }
    }
}

/// Find a tool on `PATH`, falling back to the conventional install location
pub fn locate_tool(name: &str) -> PathBuf {
    which::which(name).unwrap_or_else(|_| {
        tracing::debug!("{name} not found on PATH, assuming {}", defaults::FALLBACK_BIN_DIR);
        Path::new(defaults::FALLBACK_BIN_DIR).join(name)
    })
}

/// Platform tag of the machine the builder runs on, as used in settings filters
pub fn host_platform() -> &'static str {
    match std::env::consts::OS {
        "macos" => "macOS",
        "ios" => "iOS",
        other => other,
    }
}

/// Argument layout of the compiler driver's subcommands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverCommands {
    configuration: String,
}

impl DriverCommands {
    /// Commands for one build configuration (`debug`, `release`, ...)
    pub fn new(configuration: &str) -> Self {
        Self {
            configuration: configuration.to_string(),
        }
    }

    /// Build one product
    pub fn build(&self, product: &str, flags: &[String]) -> Vec<String> {
        let mut args = self.subcommand("build");
        args.extend(["--product".to_string(), product.to_string()]);
        args.extend_from_slice(flags);
        args
    }

    /// Print the directory built executables are placed in
    pub fn show_bin_path(&self, product: &str) -> Vec<String> {
        let mut args = self.build(product, &[]);
        args.push("--show-bin-path".to_string());
        args
    }

    /// Build and run every test
    pub fn test(&self, flags: &[String]) -> Vec<String> {
        let mut args = self.subcommand("test");
        args.extend_from_slice(flags);
        args
    }

    /// Build and run one product
    pub fn run(&self, product: &str, flags: &[String]) -> Vec<String> {
        let mut args = self.subcommand("run");
        args.extend_from_slice(flags);
        args.push(product.to_string());
        args
    }

    /// Whether a failed build's stderr is exactly the missing-product diagnostic
    pub fn is_missing_product(stderr: &str, product: &str) -> bool {
        stderr.trim() == format!("error: no product named '{product}'")
    }

    /// Subcommands the driver understands itself
    pub fn is_native_command(command: &str) -> bool {
        matches!(command, "build" | "test" | "run")
    }

    fn subcommand(&self, name: &str) -> Vec<String> {
        vec![
            name.to_string(),
            "--configuration".to_string(),
            self.configuration.clone(),
        ]
    }
}
