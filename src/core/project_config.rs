//! Project configuration
//!
//! Reads optional settings for the builder itself from `builder.toml` in the
//! project root and `config.toml` in the user config directory. Values in the
//! project file win over the global file, which wins over the defaults.
//!
//! Unknown keys are rejected with [`ConfigError::UnknownOption`].

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::resolver::FlagDialect;
use crate::error::ConfigError;
use crate::infra::dirs::BuilderDirs;

const TOP_LEVEL_KEYS: &[&str] = &["configure-product", "build-dir", "driver", "flags"];
const FLAG_KEYS: &[&str] = &["primary-language", "c", "cpp", "linker"];

/// Settings for the builder itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectConfig {
    /// Product that emits the build configuration
    pub configure_product: Option<String>,

    /// Build directory, relative to the project root
    pub build_dir: Option<PathBuf>,

    /// Compiler driver to use instead of the one found on `PATH`
    pub driver: Option<PathBuf>,

    /// Flag prefix overrides
    #[serde(default)]
    pub flags: FlagPrefixes,
}

/// Per-category flag prefix overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FlagPrefixes {
    /// Primary language flag prefix
    pub primary_language: Option<String>,
    /// C flag prefix
    pub c: Option<String>,
    /// C++ flag prefix
    pub cpp: Option<String>,
    /// Linker flag prefix
    pub linker: Option<String>,
}

impl ProjectConfig {
    /// Load the global file, then layer the project file over it
    pub fn load(project_dir: &Path, dirs: &BuilderDirs) -> Result<Self, ConfigError> {
        let global = Self::load_from_path(&dirs.global_config_path())?;
        let project = Self::load_from_path(&project_dir.join(defaults::PROJECT_CONFIG_FILE))?;
        Ok(global.overridden_by(project))
    }

    /// Load a single config file
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml(path, &content)
    }

    /// Parse config text; `path` is only used for error messages
    pub fn from_toml(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        reject_unknown_keys(path, &table, TOP_LEVEL_KEYS, "")?;
        if let Some(toml::Value::Table(flags)) = table.get("flags") {
            reject_unknown_keys(path, flags, FLAG_KEYS, "flags.")?;
        }

        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })
    }

    /// Fill unset values from `self` with the values set in `other`
    #[must_use]
    pub fn overridden_by(self, other: Self) -> Self {
        Self {
            configure_product: other.configure_product.or(self.configure_product),
            build_dir: other.build_dir.or(self.build_dir),
            driver: other.driver.or(self.driver),
            flags: FlagPrefixes {
                primary_language: other.flags.primary_language.or(self.flags.primary_language),
                c: other.flags.c.or(self.flags.c),
                cpp: other.flags.cpp.or(self.flags.cpp),
                linker: other.flags.linker.or(self.flags.linker),
            },
        }
    }

    /// Effective configure product name
    pub fn configure_product(&self) -> &str {
        self.configure_product
            .as_deref()
            .unwrap_or(defaults::CONFIGURE_PRODUCT)
    }

    /// Effective build directory
    pub fn build_dir(&self) -> PathBuf {
        self.build_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(defaults::BUILD_DIR))
    }

    /// Effective flag dialect
    pub fn dialect(&self) -> FlagDialect {
        let base = FlagDialect::default();
        FlagDialect {
            primary_language: self
                .flags
                .primary_language
                .clone()
                .unwrap_or(base.primary_language),
            c: self.flags.c.clone().unwrap_or(base.c),
            cpp: self.flags.cpp.clone().unwrap_or(base.cpp),
            linker: self.flags.linker.clone().unwrap_or(base.linker),
        }
    }
}

fn reject_unknown_keys(
    path: &Path,
    table: &toml::Table,
    known: &[&str],
    prefix: &str,
) -> Result<(), ConfigError> {
    match table.keys().find(|key| !known.contains(&key.as_str())) {
        Some(key) => Err(ConfigError::UnknownOption {
            path: path.to_path_buf(),
            name: format!("{prefix}{key}"),
        }),
        None => Ok(()),
    }
}
