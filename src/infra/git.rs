//! Version control queries
//!
//! Reads the build identity of the working copy by running `git`. Every
//! query is optional: outside a repository the builder simply exports fewer
//! variables.

use std::collections::BTreeMap;
use std::path::Path;

use crate::infra::process::{Invocation, ProcessRunner};

/// Build identity derived from the repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcsInfo {
    /// `HEAD` commit hash
    pub commit: Option<String>,
    /// Output of `git describe --all`
    pub tags: Option<String>,
    /// Output of `git describe --tags`
    pub version: Option<String>,
    /// Number of commits reachable from `HEAD`
    pub build_number: Option<usize>,
}

/// Runs git queries against the current working copy
pub struct Git<'a> {
    runner: &'a dyn ProcessRunner,
    path: &'a Path,
    env: &'a BTreeMap<String, String>,
}

impl<'a> Git<'a> {
    /// Create a query helper for the git binary at `path`
    pub fn new(
        runner: &'a dyn ProcessRunner,
        path: &'a Path,
        env: &'a BTreeMap<String, String>,
    ) -> Self {
        Self { runner, path, env }
    }

    /// Collect the build identity
    ///
    /// Nothing beyond the commit is queried when there is no commit.
    pub async fn info(&self) -> VcsInfo {
        let Some(commit) = self.query(&["rev-parse", "HEAD"]).await else {
            tracing::debug!("no git commit found");
            return VcsInfo::default();
        };

        VcsInfo {
            commit: Some(commit),
            tags: self.query(&["describe", "--all"]).await,
            version: self.query(&["describe", "--tags"]).await,
            build_number: self
                .query(&["log", "--oneline"])
                .await
                .map(|log| count_commits(&log)),
        }
    }

    async fn query(&self, args: &[&str]) -> Option<String> {
        let invocation = Invocation::new(self.path, args.iter().map(ToString::to_string).collect())
            .with_env(self.env.clone());
        match self.runner.run(&invocation).await {
            Ok(output) => Some(output.trim().to_string()),
            Err(e) => {
                tracing::debug!("git {} failed: {e}", args.join(" "));
                None
            }
        }
    }
}

/// Count the commits in `git log --oneline` output
pub fn count_commits(log: &str) -> usize {
    log.lines().filter(|line| !line.trim().is_empty()).count()
}
