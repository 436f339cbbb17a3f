//! Compiler version banner parsing

use regex::Regex;
use std::sync::OnceLock;

/// Version facts scraped from `<driver> --version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerVersion {
    /// Compiler release, e.g. `5.9.2`
    pub compiler: String,
    /// Language/toolchain build version (`swiftlang-...`), Apple builds only
    pub language: Option<String>,
    /// Code generation backend version (`clang-...`), Apple builds only
    pub backend: Option<String>,
    /// Target triple the compiler builds for by default
    pub target: String,
}

/// Parse a compiler banner
///
/// Returns `None` when the banner does not look like one we know; callers
/// treat that as "version unknown".
pub fn parse_compiler_banner(banner: &str) -> Option<CompilerVersion> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| {
            Regex::new(
                r"(?s)Swift version ([\d.]+)(?:.*?swiftlang-([\d.]+))?(?:.*?clang-([\d.]+))?.*?Target: (\S+)",
            )
            .ok()
        })
        .as_ref()?;
    let captures = pattern.captures(banner)?;

    Some(CompilerVersion {
        compiler: captures.get(1)?.as_str().to_string(),
        language: captures.get(2).map(|m| m.as_str().to_string()),
        backend: captures.get(3).map(|m| m.as_str().to_string()),
        target: captures.get(4)?.as_str().to_string(),
    })
}
