//! Action execution engine
//!
//! Drives one run: build and run the configure product, decode its output,
//! resolve settings for the requested command, then execute the action of
//! the same name phase by phase.
//!
//! Actions may invoke other actions. The engine keeps the names of the
//! actions currently executing and refuses to enter one twice.

use futures::future::{FutureExt, LocalBoxFuture};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::cli::output;
use crate::config::defaults;
use crate::core::build_env::BuildEnvironment;
use crate::core::configuration::{BuildConfiguration, Phase, PhaseKind};
use crate::core::metadata;
use crate::core::project_config::ProjectConfig;
use crate::core::resolver;
use crate::error::BuilderError;
use crate::infra::process::{Invocation, ProcessRunner};
use crate::infra::toolchain::{DriverCommands, Toolchain};

/// Stage label used while the configure product is built and run
const CONFIGURING: &str = "Configuring";

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Top-level command, which is also the action to execute
    pub command: String,
    /// Build configuration tag
    pub configuration: String,
    /// Platform tag used by settings filters
    pub platform: String,
    /// Original command line arguments, handed to the driver on fallback
    pub forwarded_args: Vec<String>,
    /// Project root; relative build directories are resolved against it
    pub project_dir: PathBuf,
}

impl Request {
    /// Request for `command` in the default configuration
    pub fn new(command: &str, platform: &str, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.to_string(),
            configuration: defaults::CONFIGURATION.to_string(),
            platform: platform.to_string(),
            forwarded_args: Vec::new(),
            project_dir: project_dir.into(),
        }
    }

    /// Use a different build configuration
    #[must_use]
    pub fn with_configuration(mut self, configuration: &str) -> Self {
        self.configuration = configuration.to_string();
        self
    }

    /// Arguments to forward when the project has no configure product
    #[must_use]
    pub fn with_forwarded_args(mut self, args: Vec<String>) -> Self {
        self.forwarded_args = args;
        self
    }
}

/// Where a run currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    /// Nothing started yet
    Idle,
    /// Building or running the configure product
    Configuring,
    /// Executing the named action
    Running(String),
    /// Every phase completed
    Done,
    /// A phase or the configuration step failed
    Failed,
}

/// Flags every driver invocation receives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSettings {
    /// Translated compiler flags
    pub flags: Vec<String>,
    /// Untranslated `common` values
    pub common: Vec<String>,
}

impl RunSettings {
    /// Driver arguments: translated flags, then the raw `common` values
    pub fn driver_arguments(&self) -> Vec<String> {
        let mut args = self.flags.clone();
        args.extend_from_slice(&self.common);
        args
    }
}

/// Executes one request against a project
pub struct Engine<'a> {
    runner: &'a dyn ProcessRunner,
    toolchain: Toolchain,
    project: ProjectConfig,
    request: Request,
    driver: DriverCommands,
    environment: BuildEnvironment,
    bin_path: Option<PathBuf>,
    active: Vec<String>,
    state: EngineState,
}

impl<'a> Engine<'a> {
    /// Create an engine; nothing is launched until [`Engine::execute`]
    pub fn new(
        runner: &'a dyn ProcessRunner,
        toolchain: Toolchain,
        project: ProjectConfig,
        request: Request,
        inherited: BTreeMap<String, String>,
    ) -> Self {
        let driver = DriverCommands::new(&request.configuration);
        let environment =
            BuildEnvironment::new(&request.command, &request.configuration, inherited);
        Self {
            runner,
            toolchain,
            project,
            request,
            driver,
            environment,
            bin_path: None,
            active: Vec::new(),
            state: EngineState::Idle,
        }
    }

    /// Current state
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Base environment spawned processes are given
    pub fn environment(&self) -> &BuildEnvironment {
        &self.environment
    }

    /// Collect version control, compiler and SDK facts into the environment
    pub async fn detect_environment(&mut self) {
        let environment = std::mem::take(&mut self.environment);
        self.environment = environment.detect(self.runner, &self.toolchain).await;
    }

    /// Run the request to completion
    pub async fn execute(&mut self) -> Result<(), BuilderError> {
        let result = self.configure_and_run().await;
        self.state = match result {
            Ok(()) => EngineState::Done,
            Err(_) => EngineState::Failed,
        };
        result
    }

    async fn configure_and_run(&mut self) -> Result<(), BuilderError> {
        let configuration = self.configure().await?;
        let settings = self.resolve_settings(&configuration)?;
        let command = self.request.command.clone();
        self.execute_action(&command, &configuration, &settings)
            .await
    }

    /// Build and run the configure product, decoding what it prints
    ///
    /// When the project has no configure product and the command is one the
    /// driver understands, the driver takes over the process instead.
    pub async fn configure(&mut self) -> Result<BuildConfiguration, BuilderError> {
        self.state = EngineState::Configuring;
        let env = self.environment.for_stage(CONFIGURING);
        let product = self.project.configure_product().to_string();

        let build = Invocation::new(&self.toolchain.driver, self.driver.build(&product, &[]))
            .with_env(env.clone());
        if let Err(error) = self.runner.run(&build).await {
            if self.should_hand_over(&error, &product) {
                return Err(self.hand_over());
            }
            return Err(error);
        }

        output::announce_stage(1, CONFIGURING);
        tracing::info!("Configuring with {product}");

        let bin_path = self.bin_path(&env).await?;
        let configure = Invocation::new(bin_path.join(&product), Vec::new()).with_env(env);
        let payload = self.runner.run(&configure).await?;
        BuildConfiguration::parse(&payload)
    }

    fn should_hand_over(&self, error: &BuilderError, product: &str) -> bool {
        let BuilderError::ExecutionFailure {
            stderr: Some(stderr),
            ..
        } = error
        else {
            return false;
        };
        DriverCommands::is_missing_product(stderr, product)
            && DriverCommands::is_native_command(&self.request.command)
    }

    fn hand_over(&self) -> BuilderError {
        let mut args = self.request.forwarded_args.clone();
        if args.is_empty() {
            args.push(defaults::COMMAND.to_string());
        }
        tracing::info!(
            "No {} product, forwarding to {}",
            self.project.configure_product(),
            self.toolchain.driver.display()
        );
        let invocation = Invocation::new(&self.toolchain.driver, args)
            .with_env(self.environment.for_stage(CONFIGURING));
        self.runner.exec(&invocation)
    }

    /// Resolve settings for the request and record them in the environment
    pub fn resolve_settings(
        &mut self,
        configuration: &BuildConfiguration,
    ) -> Result<RunSettings, BuilderError> {
        let resolved = resolver::resolve(
            &configuration.settings,
            &self.request.command,
            &self.request.configuration,
            &self.request.platform,
        )?;
        let flags = resolved.flag_list(&self.project.dialect());
        tracing::debug!("Compiler settings: {}", flags.join(" "));

        let environment = std::mem::take(&mut self.environment);
        self.environment = environment.with_settings(&resolved, &flags);

        Ok(RunSettings {
            flags,
            common: resolved.common,
        })
    }

    /// Execute a named action and, through it, any actions it invokes
    pub fn execute_action<'s, 'c: 's>(
        &'s mut self,
        name: &'s str,
        configuration: &'c BuildConfiguration,
        settings: &'c RunSettings,
    ) -> LocalBoxFuture<'s, Result<(), BuilderError>> {
        async move {
            let phases = configuration.action(name)?;
            if self.active.iter().any(|active| active == name) {
                return Err(BuilderError::CyclicAction {
                    name: name.to_string(),
                });
            }

            self.active.push(name.to_string());
            self.state = EngineState::Running(name.to_string());
            tracing::info!("Executing action {name}");

            let mut result = Ok(());
            for phase in phases {
                result = self.execute_phase(phase, configuration, settings).await;
                if result.is_err() {
                    break;
                }
            }

            self.active.pop();
            if let Some(parent) = self.active.last() {
                self.state = EngineState::Running(parent.clone());
            }
            result
        }
        .boxed_local()
    }

    async fn execute_phase(
        &mut self,
        phase: &Phase,
        configuration: &BuildConfiguration,
        settings: &RunSettings,
    ) -> Result<(), BuilderError> {
        let depth = self.active.len();
        let env = self.environment.for_stage(&phase.name);
        output::announce_stage(depth, &phase.name);
        tracing::info!("{} ({})", phase.name, phase.command);

        match &phase.kind {
            PhaseKind::Build => {
                let product = required_target(phase)?;
                let args = self.driver.build(product, &settings.driver_arguments());
                self.run_driver(args, env).await?;
            }
            PhaseKind::Test => {
                let args = self.driver.test(&settings.driver_arguments());
                self.run_driver(args, env).await?;
            }
            PhaseKind::Run => {
                let product = required_target(phase)?;
                let args = self.driver.run(product, &settings.driver_arguments());
                let output = self.run_driver(args, env).await?;
                output::tool_output(depth, &output);
            }
            PhaseKind::Action => {
                let action = required_target(phase)?;
                self.execute_action(action, configuration, settings)
                    .await?;
            }
            PhaseKind::Metadata => {
                let product = required_target(phase)?;
                let info_file = self.write_info_file(product)?;
                let mut flags = settings.driver_arguments();
                flags.extend(metadata::embed_flags(
                    &self.project.dialect().linker,
                    &info_file,
                ));
                let args = self.driver.build(product, &flags);
                self.run_driver(args, env).await?;
            }
            PhaseKind::Metafile => {
                let product = required_target(phase)?;
                self.write_info_file(product)?;
            }
            PhaseKind::Tool(tool) => {
                let args = self.driver.build(tool, &[]);
                self.run_driver(args, env.clone()).await?;
                let bin_path = self.bin_path(&env).await?;
                let invocation =
                    Invocation::new(bin_path.join(tool), phase.arguments.clone()).with_env(env);
                let output = self.runner.run(&invocation).await?;
                output::tool_output(depth, &output);
            }
        }
        Ok(())
    }

    async fn run_driver(
        &self,
        args: Vec<String>,
        env: BTreeMap<String, String>,
    ) -> Result<String, BuilderError> {
        let invocation = Invocation::new(&self.toolchain.driver, args).with_env(env);
        self.runner.run(&invocation).await
    }

    /// Directory the driver places built executables in, queried once
    async fn bin_path(&mut self, env: &BTreeMap<String, String>) -> Result<PathBuf, BuilderError> {
        if let Some(path) = &self.bin_path {
            return Ok(path.clone());
        }
        let args = self.driver.show_bin_path(self.project.configure_product());
        let output = self.run_driver(args, env.clone()).await?;
        let path = PathBuf::from(output.trim());
        tracing::debug!("Binary directory: {}", path.display());
        self.bin_path = Some(path.clone());
        Ok(path)
    }

    fn write_info_file(&self, product: &str) -> Result<PathBuf, BuilderError> {
        metadata::write_info_file(
            &self.build_dir(),
            &self.request.configuration,
            product,
            &self.environment.vcs,
        )
    }

    fn build_dir(&self) -> PathBuf {
        resolve_against(&self.request.project_dir, &self.project.build_dir())
    }
}

fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn required_target(phase: &Phase) -> Result<&str, BuilderError> {
    phase.target().ok_or_else(|| BuilderError::DecodeFailure {
        reason: format!("phase '{}' ({}) needs an argument", phase.name, phase.command),
    })
}
