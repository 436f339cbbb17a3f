//! Builder - configuration-driven build orchestrator
//!
//! A project describes its build in a small program of its own, the
//! configure product. The builder compiles and runs it, decodes the settings
//! and actions it prints, and executes the requested action through the
//! compiler driver.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Settings resolution, configuration decoding and the engine
//! - [`infra`] - Infrastructure layer (processes, toolchain, git, directories)
//! - [`config`] - Defaults and environment variable names
//! - [`error`] - Error types and exit codes

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
