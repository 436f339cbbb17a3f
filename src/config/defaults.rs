//! Default configuration values

/// Product built and run to obtain the build configuration
pub const CONFIGURE_PRODUCT: &str = "Configure";

/// Compiler driver looked up on `PATH`
pub const DRIVER: &str = "swift";

/// Build directory, relative to the project root
pub const BUILD_DIR: &str = ".build";

/// Command run when none is given on the command line
pub const COMMAND: &str = "build";

/// Build configuration used when none is given on the command line
pub const CONFIGURATION: &str = "debug";

/// Flag prefix for primary language settings
pub const PRIMARY_LANGUAGE_PREFIX: &str = "-Xswiftc";

/// Flag prefix for C settings
pub const C_PREFIX: &str = "-Xcc";

/// Flag prefix for C++ settings
pub const CPP_PREFIX: &str = "-Xcxx";

/// Flag prefix for linker settings
pub const LINKER_PREFIX: &str = "-Xlinker";

/// Project configuration file name
pub const PROJECT_CONFIG_FILE: &str = "builder.toml";

/// Directory tools are looked up in when `PATH` lookup fails
pub const FALLBACK_BIN_DIR: &str = "/usr/bin";
