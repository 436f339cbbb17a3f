//! Error types for builder
//!
//! Domain-specific error types using thiserror. Every variant of
//! [`BuilderError`] is terminal for a run and maps to a process exit code.

use std::path::PathBuf;
use thiserror::Error;

/// Project configuration errors (`builder.toml` and the global `config.toml`)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: PathBuf, error: String },

    /// Key that the config schema does not know about
    #[error("Unknown option '{name}' in '{path}'")]
    UnknownOption { path: PathBuf, name: String },
}

/// Top-level builder error type
#[derive(Error, Debug)]
pub enum BuilderError {
    /// A spawned process exited with a non-zero status
    #[error("Command failed{}", describe_failure(.stdout, .stderr))]
    ExecutionFailure {
        stdout: Option<String>,
        stderr: Option<String>,
    },

    /// The configuration payload could not be decoded
    #[error("Couldn't decode configuration: {reason}")]
    DecodeFailure { reason: String },

    /// Requested action is not in the action table
    #[error("Couldn't find scheme: {name}")]
    MissingAction { name: String },

    /// Settings node referenced by an `inherits` entry does not exist
    #[error("Couldn't find settings: {name}")]
    MissingSettingsNode { name: String },

    /// Settings node inherits itself, directly or transitively
    #[error("Settings '{name}' inherit from themselves")]
    CyclicInheritance { name: String },

    /// Action invokes itself, directly or transitively
    #[error("Scheme '{name}' invokes itself")]
    CyclicAction { name: String },

    /// Tried to read a configuration option that does not exist
    #[error("Tried to read unknown option: {name}")]
    UnknownOption { name: String },

    /// A process could not be spawned or replaced
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: PathBuf,
        source: std::io::Error,
    },

    /// IO error while writing build artifacts
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl BuilderError {
    /// Exit code returned to whatever script invoked the builder.
    ///
    /// This only roughly indicates what went wrong.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ExecutionFailure { .. } | Self::Launch { .. } | Self::Io { .. } => 1,
            Self::DecodeFailure { .. }
            | Self::MissingSettingsNode { .. }
            | Self::CyclicInheritance { .. } => 2,
            Self::MissingAction { .. } | Self::CyclicAction { .. } => 3,
            Self::UnknownOption { .. } => 4,
        }
    }

    /// Create an execution failure from raw captured output
    pub fn execution_failure(stdout: &[u8], stderr: &[u8]) -> Self {
        let text = |bytes: &[u8]| {
            (!bytes.is_empty()).then(|| String::from_utf8_lossy(bytes).into_owned())
        };
        Self::ExecutionFailure {
            stdout: text(stdout),
            stderr: text(stderr),
        }
    }
}

impl From<ConfigError> for BuilderError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::UnknownOption { name, .. } => Self::UnknownOption { name },
            other => Self::DecodeFailure {
                reason: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for BuilderError {
    fn from(error: serde_json::Error) -> Self {
        Self::DecodeFailure {
            reason: error.to_string(),
        }
    }
}

fn describe_failure(stdout: &Option<String>, stderr: &Option<String>) -> String {
    match stderr.as_deref().or(stdout.as_deref()).map(str::trim) {
        Some(text) if !text.is_empty() => format!(": {text}"),
        _ => String::new(),
    }
}
