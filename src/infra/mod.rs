//! Infrastructure layer
//!
//! Handles external processes, tool lookup, version control queries and
//! user directories.

pub mod dirs;
pub mod git;
pub mod process;
pub mod toolchain;
