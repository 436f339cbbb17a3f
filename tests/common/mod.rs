//! Common test utilities and helpers
//!
//! Integration tests run the builder binary inside a temporary project whose
//! compiler driver is a shell script. The script logs every call to
//! `driver.log` and answers the few subcommands the builder uses; built
//! products are scripts or links under `bin/`.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Fake compiler driver
///
/// - `--version` prints a banner
/// - `--show-bin-path` prints `<project>/bin`
/// - `build ... --product Configure` fails with the missing-product
///   diagnostic when `missing-configure` exists in the project
/// - `build ... --product <name>` fails when `fail-<name>` exists
/// - `run ... <product>` prints `running <product>`
pub const FAKE_DRIVER: &str = r#"#!/bin/sh
DIR="$(cd "$(dirname "$0")" && pwd)"
echo "${BUILDER_STAGE:-none}: $*" >> "$DIR/driver.log"
if [ "$1" = "--version" ]; then
    echo "Swift version 5.10 (swift-5.10-RELEASE)"
    echo "Target: x86_64-unknown-linux-gnu"
    exit 0
fi
product=""
previous=""
last=""
for arg in "$@"; do
    if [ "$arg" = "--show-bin-path" ]; then
        echo "$DIR/bin"
        exit 0
    fi
    if [ "$previous" = "--product" ]; then
        product="$arg"
    fi
    previous="$arg"
    last="$arg"
done
if [ "$1" = "build" ] && [ "$product" = "Configure" ] && [ -f "$DIR/missing-configure" ]; then
    echo "error: no product named 'Configure'" >&2
    exit 1
fi
if [ -n "$product" ] && [ -f "$DIR/fail-$product" ]; then
    echo "compiling $product"
    echo "error: $product failed to compile" >&2
    exit 1
fi
if [ "$1" = "run" ]; then
    echo "running $last"
fi
exit 0
"#;

/// Test project context
///
/// Creates a temporary directory holding a fake driver, a `bin/` directory
/// for built products and an isolated global config directory.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project with the fake driver installed
    pub fn new() -> Self {
        let project = Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        };
        project.create_dir("bin");
        project.create_dir("global");
        project.create_script("driver", FAKE_DRIVER);
        project
    }

    /// Project whose configure product prints `json`
    pub fn with_configuration(json: &str) -> Self {
        let project = Self::new();
        project.create_file("configuration.json", json);
        project.create_script(
            "bin/Configure",
            "#!/bin/sh\ncat \"$(dirname \"$0\")/../configuration.json\"\n",
        );
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create an executable script in the test project
    pub fn create_script(&self, name: &str, content: &str) {
        use std::os::unix::fs::PermissionsExt;

        self.create_file(name, content);
        let path = self.dir.path().join(name);
        let mut permissions = std::fs::metadata(&path)
            .expect("Failed to stat script")
            .permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(path, permissions).expect("Failed to make script executable");
    }

    /// Link `name` in the test project to an existing program
    pub fn create_symlink(&self, name: &str, target: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::os::unix::fs::symlink(target, path).expect("Failed to create symlink");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Calls the fake driver received, one line per call: `<stage>: <args>`
    pub fn driver_log(&self) -> Vec<String> {
        if !self.file_exists("driver.log") {
            return Vec::new();
        }
        self.read_file("driver.log")
            .lines()
            .map(ToString::to_string)
            .collect()
    }

    /// Driver calls made while executing phases
    pub fn phase_log(&self) -> Vec<String> {
        self.driver_log()
            .into_iter()
            .filter(|line| !line.starts_with("none:") && !line.starts_with("configuring:"))
            .collect()
    }

    /// Run the builder in the project with the fake driver
    pub fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_builder"));
        cmd.current_dir(self.path())
            .env("BUILDER_DRIVER", self.dir.path().join("driver"))
            .env("BUILDER_CONFIG_DIR", self.dir.path().join("global"))
            .env_remove("RUST_LOG")
            .args(args);
        cmd.output().expect("Failed to execute builder")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Captured stdout as text
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Captured stderr as text
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Configuration with one `build` action that runs product `App`
pub const RUN_APP: &str = r#"{
    "settings": {"common": {"primaryLanguage": ["Onone"]}},
    "schemes": {
        "build": [{"name": "Launching", "tool": "run", "arguments": ["App"]}]
    }
}"#;
