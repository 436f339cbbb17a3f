//! Core logic
//!
//! Decoding, resolution and execution. Processes are only launched through
//! the [`crate::infra::process::ProcessRunner`] handed to the engine.
//!
//! # Submodules
//!
//! - [`settings`] - Settings nodes and inheritance references
//! - [`resolver`] - Settings resolution and flag translation
//! - [`configuration`] - Build configuration (settings and action tables)
//! - [`project_config`] - `builder.toml` and global configuration
//! - [`banner`] - Compiler version banner parsing
//! - [`build_env`] - Environment handed to spawned processes
//! - [`metadata`] - Build identity stamping
//! - [`engine`] - Action execution

pub mod banner;
pub mod build_env;
pub mod configuration;
pub mod engine;
pub mod metadata;
pub mod project_config;
pub mod resolver;
pub mod settings;
