//! Output formatting
//!
//! User-facing progress lines: one per phase, indented by action nesting
//! depth. Diagnostics go through `tracing` instead.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::BuilderError;

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppress progress output for the rest of the process
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Indentation for a stage announcement at the given action depth
///
/// The outermost action is not indented; nested ones get a `- ` marker
/// padded to two columns per extra level.
pub fn indent(depth: usize) -> String {
    if depth <= 1 {
        return String::new();
    }
    format!("{:<width$}", "- ", width = (depth - 1) * 2)
}

/// Announce the stage a phase is entering
pub fn announce_stage(depth: usize, stage: &str) {
    if !quiet() {
        println!("{}{stage}.", indent(depth));
    }
}

/// Echo the captured output of a product or tool
pub fn tool_output(depth: usize, output: &str) {
    let output = output.trim_end();
    if quiet() || output.is_empty() {
        return;
    }
    let prefix = indent(depth + 1);
    for line in output.lines() {
        println!("{prefix}{line}");
    }
}

/// Announce that the run completed
pub fn done() {
    if !quiet() {
        println!("Done.\n");
    }
}

/// Report an error on stderr
///
/// Execution failures echo the failed process's captured streams verbatim.
pub fn display_error(error: &anyhow::Error) {
    match error.downcast_ref::<BuilderError>() {
        Some(BuilderError::ExecutionFailure { stdout, stderr }) => {
            eprintln!("{}", stdout.as_deref().unwrap_or("Failure:").trim_end());
            if let Some(stderr) = stderr {
                eprintln!("{}", stderr.trim_end());
            }
        }
        _ => {
            eprintln!("{} {error:#}", status::ERROR);
        }
    }
}

/// Status message prefixes
pub mod status {
    /// Error prefix (red X)
    pub const ERROR: &str = "✗";
}
