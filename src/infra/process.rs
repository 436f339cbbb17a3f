//! Subprocess execution
//!
//! Every external program the builder launches goes through a
//! [`ProcessRunner`], so the engine can be exercised without spawning
//! anything.

use futures::future::{FutureExt, LocalBoxFuture};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::error::BuilderError;

/// A program, its arguments and the complete environment it runs with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to launch
    pub program: PathBuf,
    /// Arguments, not including the program
    pub args: Vec<String>,
    /// Complete environment; the parent environment is not inherited
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    /// Create an invocation with an empty environment
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            env: BTreeMap::new(),
        }
    }

    /// Replace the environment
    #[must_use]
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Program and arguments as one display string
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Launches external programs
pub trait ProcessRunner {
    /// Run to completion and return captured stdout
    ///
    /// A non-zero exit fails with [`BuilderError::ExecutionFailure`] carrying
    /// both captured streams.
    fn run<'a>(&'a self, invocation: &'a Invocation) -> LocalBoxFuture<'a, Result<String, BuilderError>>;

    /// Replace the current process with the invocation
    ///
    /// Only returns if the replacement could not happen.
    fn exec(&self, invocation: &Invocation) -> BuilderError;
}

/// Runner backed by real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(invocation: &Invocation) -> std::process::Command {
        let mut command = std::process::Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .env_clear()
            .envs(&invocation.env);
        command
    }
}

impl ProcessRunner for SystemRunner {
    fn run<'a>(&'a self, invocation: &'a Invocation) -> LocalBoxFuture<'a, Result<String, BuilderError>> {
        async move {
            tracing::debug!("running {}", invocation.command_line());

            let mut command = tokio::process::Command::from(Self::command(invocation));
            command
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());

            // `output` drains both pipes while waiting, so a chatty child
            // cannot block on a full pipe.
            let output = command.output().await.map_err(|source| BuilderError::Launch {
                program: invocation.program.clone(),
                source,
            })?;

            if !output.status.success() {
                tracing::debug!("{} failed {}", invocation.program.display(), output.status);
                return Err(BuilderError::execution_failure(&output.stdout, &output.stderr));
            }

            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            tracing::debug!("{} {:?}> {}", invocation.program.display(), invocation.args, stdout);
            Ok(stdout)
        }
        .boxed_local()
    }

    fn exec(&self, invocation: &Invocation) -> BuilderError {
        tracing::info!("handing over to {}", invocation.command_line());
        replace_process(Self::command(invocation), &invocation.program)
    }
}

#[cfg(unix)]
fn replace_process(mut command: std::process::Command, program: &Path) -> BuilderError {
    use std::os::unix::process::CommandExt;
    let source = command.exec();
    BuilderError::Launch {
        program: program.to_path_buf(),
        source,
    }
}

#[cfg(not(unix))]
fn replace_process(mut command: std::process::Command, program: &Path) -> BuilderError {
    match command.status() {
        Ok(status) => std::process::exit(status.code().unwrap_or(1)),
        Err(source) => BuilderError::Launch {
            program: program.to_path_buf(),
            source,
        },
    }
}
