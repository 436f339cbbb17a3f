//! Platform-specific directory lookup
//!
//! Locates the user configuration directory holding the global `config.toml`.
//! Follows XDG on Linux and standard locations on macOS.
//!
//! `BUILDER_CONFIG_DIR` overrides the platform default.

use std::env;
use std::path::PathBuf;

use crate::config;

/// Application name used in directory paths
const APP_NAME: &str = "builder";

/// Directory provider for builder
#[derive(Debug, Clone)]
pub struct BuilderDirs {
    config_dir: PathBuf,
}

impl BuilderDirs {
    /// Resolve directories, checking the environment override first
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
        }
    }

    /// Use an explicit configuration directory
    #[must_use]
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the config directory path
    ///
    /// - Linux: `$XDG_CONFIG_HOME/builder` or `~/.config/builder`
    /// - macOS: `~/Library/Application Support/builder`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Path of the global `config.toml`
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    fn resolve_config_dir() -> PathBuf {
        if let Ok(path) = env::var(config::env::CONFIG_DIR) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }
}

impl Default for BuilderDirs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_is_not_empty() {
        let dirs = BuilderDirs::new();
        assert!(!dirs.config_dir().as_os_str().is_empty());
    }

    #[test]
    fn test_global_config_path_is_under_config_dir() {
        let dirs = BuilderDirs::with_config_dir(PathBuf::from("/tmp/builder-config"));
        assert!(dirs.global_config_path().starts_with(dirs.config_dir()));
        assert!(dirs.global_config_path().ends_with("config.toml"));
    }
}
