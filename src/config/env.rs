//! Environment variable names exported to spawned processes

pub const COMMAND: &str = "BUILDER_COMMAND";
pub const CONFIGURATION: &str = "BUILDER_CONFIGURATION";
pub const STAGE: &str = "BUILDER_STAGE";
pub const COMPILER_SETTINGS: &str = "BUILDER_COMPILER_SETTINGS";

/// Prefix for raw settings; the upper-cased key follows
pub const SETTING_PREFIX: &str = "BUILDER_SETTING:";

pub const VCS_COMMIT: &str = "BUILDER_VCS_COMMIT";
pub const VCS_TAGS: &str = "BUILDER_VCS_TAGS";
pub const VERSION: &str = "BUILDER_VERSION";
pub const BUILD_NUMBER: &str = "BUILDER_BUILD_NUMBER";

pub const COMPILER_VERSION: &str = "BUILDER_COMPILER_VERSION";
pub const COMPILER_LANGUAGE_VERSION: &str = "BUILDER_COMPILER_LANGUAGE_VERSION";
pub const BACKEND_VERSION: &str = "BUILDER_BACKEND_VERSION";
pub const TARGET_TRIPLE: &str = "BUILDER_TARGET_TRIPLE";

pub const SDK_PLATFORM_PATH: &str = "BUILDER_SDK_PLATFORM_PATH";
pub const SDK_PLATFORM_VERSION: &str = "BUILDER_SDK_PLATFORM_VERSION";
pub const SDK_VERSION: &str = "BUILDER_SDK_VERSION";
pub const SDK_PATH: &str = "BUILDER_SDK_PATH";

/// Overrides the directory holding the global `config.toml`
pub const CONFIG_DIR: &str = "BUILDER_CONFIG_DIR";

/// Overrides the compiler driver path
pub const DRIVER: &str = "BUILDER_DRIVER";

/// Name of the exported variable for a raw setting
pub fn setting(key: &str) -> String {
    format!("{SETTING_PREFIX}{}", key.to_uppercase())
}
