//! Build identity stamping
//!
//! Writes the version control identity of a build as a property list, either
//! as a sidecar file next to the product or linked into the product itself.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BuilderError;
use crate::infra::git::VcsInfo;

/// Path of a product's info file: `<build-dir>/<configuration>/<product>_info.plist`
pub fn info_path(build_dir: &Path, configuration: &str, product: &str) -> PathBuf {
    build_dir
        .join(configuration)
        .join(format!("{product}_info.plist"))
}

/// Render the build identity as an XML property list
///
/// Unknown facts are left out.
pub fn render_plist(vcs: &VcsInfo) -> String {
    let mut entries = String::new();
    let mut entry = |key: &str, value: Option<String>| {
        if let Some(value) = value {
            entries.push_str(&format!(
                "\t<key>{}</key>\n\t<string>{}</string>\n",
                escape(key),
                escape(&value)
            ));
        }
    };
    entry("Commit", vcs.commit.clone());
    entry("Tags", vcs.tags.clone());
    entry("Version", vcs.version.clone());
    entry("Build", vcs.build_number.map(|n| n.to_string()));

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
         <plist version=\"1.0\">\n<dict>\n{entries}</dict>\n</plist>\n"
    )
}

/// Write the info file for `product`, creating parent directories
pub fn write_info_file(
    build_dir: &Path,
    configuration: &str,
    product: &str,
    vcs: &VcsInfo,
) -> Result<PathBuf, BuilderError> {
    let path = info_path(build_dir, configuration, product);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| BuilderError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(&path, render_plist(vcs)).map_err(|source| BuilderError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::info!("Wrote build info to {}", path.display());
    Ok(path)
}

/// Linker arguments embedding an info file into the `__TEXT,__info_plist` section
pub fn embed_flags(linker_prefix: &str, info_file: &Path) -> Vec<String> {
    let path = info_file.display().to_string();
    ["-sectcreate", "__TEXT", "__info_plist", path.as_str()]
        .into_iter()
        .flat_map(|arg| [linker_prefix.to_string(), arg.to_string()])
        .collect()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
