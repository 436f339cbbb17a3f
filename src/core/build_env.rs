//! Build environment
//!
//! Environment variables every spawned process sees during a run: the parent
//! environment, facts detected at startup (version control identity, compiler
//! version, SDK paths), the resolved settings, and the current stage.
//!
//! The environment is rebuilt for each phase from an immutable base, so a
//! phase never observes state left behind by another.

use std::collections::BTreeMap;

use crate::config::env;
use crate::core::banner::{parse_compiler_banner, CompilerVersion};
use crate::core::resolver::ResolvedSettings;
use crate::core::settings::raw_value_string;
use crate::infra::git::{Git, VcsInfo};
use crate::infra::process::{Invocation, ProcessRunner};
use crate::infra::toolchain::Toolchain;

/// SDK facts reported by `xcrun`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdkInfo {
    /// `xcrun --show-sdk-platform-path`
    pub platform_path: Option<String>,
    /// `xcrun --show-sdk-platform-version`
    pub platform_version: Option<String>,
    /// `xcrun --show-sdk-version`
    pub version: Option<String>,
    /// `xcrun --show-sdk-path`
    pub path: Option<String>,
}

/// Base environment for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildEnvironment {
    /// Top-level command (`build`, `test`, ...)
    pub command: String,
    /// Build configuration tag (`debug`, `release`, ...)
    pub configuration: String,
    /// Inherited parent environment
    pub inherited: BTreeMap<String, String>,
    /// Version control identity
    pub vcs: VcsInfo,
    /// Compiler version, if the banner was recognised
    pub compiler: Option<CompilerVersion>,
    /// SDK facts
    pub sdk: SdkInfo,
    /// Translated compiler flags, once settings are resolved
    pub compiler_settings: Option<Vec<String>>,
    /// Raw settings values, once settings are resolved
    pub settings: BTreeMap<String, String>,
}

impl BuildEnvironment {
    /// Environment with only the run identity and inherited variables
    pub fn new(command: &str, configuration: &str, inherited: BTreeMap<String, String>) -> Self {
        Self {
            command: command.to_string(),
            configuration: configuration.to_string(),
            inherited,
            ..Self::default()
        }
    }

    /// Detect version control, compiler and SDK facts
    ///
    /// Failed queries leave the corresponding facts unset.
    pub async fn detect(mut self, runner: &dyn ProcessRunner, toolchain: &Toolchain) -> Self {
        let env = self.to_env_map();

        self.vcs = Git::new(runner, &toolchain.git, &env).info().await;

        let banner = Invocation::new(&toolchain.driver, vec!["--version".to_string()])
            .with_env(env.clone());
        self.compiler = match runner.run(&banner).await {
            Ok(output) => {
                let parsed = parse_compiler_banner(&output);
                if parsed.is_none() {
                    tracing::debug!("unrecognised compiler banner: {}", output.trim());
                }
                parsed
            }
            Err(e) => {
                tracing::debug!("couldn't read compiler version: {e}");
                None
            }
        };

        if let Some(xcrun) = &toolchain.xcrun {
            let query = |flag: &'static str| {
                let invocation =
                    Invocation::new(xcrun, vec![flag.to_string()]).with_env(env.clone());
                async move {
                    runner
                        .run(&invocation)
                        .await
                        .ok()
                        .map(|output| output.trim().to_string())
                }
            };
            self.sdk = SdkInfo {
                platform_path: query("--show-sdk-platform-path").await,
                platform_version: query("--show-sdk-platform-version").await,
                version: query("--show-sdk-version").await,
                path: query("--show-sdk-path").await,
            };
        }

        self
    }

    /// Record resolved settings and their translated flags
    #[must_use]
    pub fn with_settings(mut self, resolved: &ResolvedSettings, flags: &[String]) -> Self {
        self.compiler_settings = Some(flags.to_vec());
        self.settings = resolved
            .values
            .iter()
            .map(|(key, value)| (key.clone(), raw_value_string(value)))
            .collect();
        self
    }

    /// Convert to environment variable map for process execution
    pub fn to_env_map(&self) -> BTreeMap<String, String> {
        let mut map = self.inherited.clone();
        let mut set = |key: &str, value: Option<&str>| {
            if let Some(value) = value {
                map.insert(key.to_string(), value.to_string());
            }
        };

        set(env::COMMAND, Some(self.command.as_str()));
        set(env::CONFIGURATION, Some(self.configuration.as_str()));

        set(env::VCS_COMMIT, self.vcs.commit.as_deref());
        set(env::VCS_TAGS, self.vcs.tags.as_deref());
        set(env::VERSION, self.vcs.version.as_deref());
        let build_number = self.vcs.build_number.map(|n| n.to_string());
        set(env::BUILD_NUMBER, build_number.as_deref());

        if let Some(compiler) = &self.compiler {
            set(env::COMPILER_VERSION, Some(compiler.compiler.as_str()));
            set(env::COMPILER_LANGUAGE_VERSION, compiler.language.as_deref());
            set(env::BACKEND_VERSION, compiler.backend.as_deref());
            set(env::TARGET_TRIPLE, Some(compiler.target.as_str()));
        }

        set(env::SDK_PLATFORM_PATH, self.sdk.platform_path.as_deref());
        set(env::SDK_PLATFORM_VERSION, self.sdk.platform_version.as_deref());
        set(env::SDK_VERSION, self.sdk.version.as_deref());
        set(env::SDK_PATH, self.sdk.path.as_deref());

        let compiler_settings = self.compiler_settings.as_ref().map(|flags| flags.join(","));
        set(env::COMPILER_SETTINGS, compiler_settings.as_deref());

        for (key, value) in &self.settings {
            map.insert(env::setting(key), value.clone());
        }

        map
    }

    /// Environment for one phase: the base plus the lower-cased stage label
    pub fn for_stage(&self, stage: &str) -> BTreeMap<String, String> {
        let mut map = self.to_env_map();
        map.insert(env::STAGE.to_string(), stage.to_lowercase());
        map
    }
}
