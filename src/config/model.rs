// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [toolchain]
/// program = "kotlinc"
/// script_flag = "-script"
/// version_flag = "-version"
/// script_extension = "kts"
///
/// [runner]
/// use_cache = true
/// killed_exit_code = 137
/// drain_throttle_ms = 0
/// temp_dir = "/tmp/scriptrun"
/// preload = true
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    #[serde(default)]
    pub runner: RunnerSection,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// [`RunnerConfig::default`].
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    pub toolchain: ToolchainConfig,
    pub runner: RunnerSection,
}

impl RunnerConfig {
    pub(crate) fn new_unchecked(toolchain: ToolchainConfig, runner: RunnerSection) -> Self {
        Self { toolchain, runner }
    }
}

/// `[toolchain]` section: which executable runs scripts, and how.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolchainConfig {
    /// Executable name (looked up on PATH) or path.
    #[serde(default = "default_program")]
    pub program: String,

    /// Flag placed before the script path, e.g. `kotlinc -script file.kts`.
    #[serde(default = "default_script_flag")]
    pub script_flag: String,

    /// Flag used for the warm-up invocation.
    #[serde(default = "default_version_flag")]
    pub version_flag: String,

    /// Extension of the temporary script file, without the leading dot.
    #[serde(default = "default_script_extension")]
    pub script_extension: String,
}

fn default_program() -> String {
    "kotlinc".to_string()
}

fn default_script_flag() -> String {
    "-script".to_string()
}

fn default_version_flag() -> String {
    "-version".to_string()
}

fn default_script_extension() -> String {
    "kts".to_string()
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            script_flag: default_script_flag(),
            version_flag: default_version_flag(),
            script_extension: default_script_extension(),
        }
    }
}

/// `[runner]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSection {
    /// Serve repeated successful runs from the result cache.
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,

    /// Exit code that is reported as `Killed` instead of a numeric code.
    #[serde(default = "default_killed_exit_code")]
    pub killed_exit_code: i32,

    /// Pause after each relayed output chunk, in milliseconds.
    ///
    /// Time spent here is not counted in the reported elapsed time.
    #[serde(default)]
    pub drain_throttle_ms: u64,

    /// Directory for per-run script files. `None` means the OS temp dir.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// Invoke the toolchain's version probe once at startup.
    #[serde(default = "default_preload")]
    pub preload: bool,
}

fn default_use_cache() -> bool {
    true
}

fn default_killed_exit_code() -> i32 {
    137
}

fn default_preload() -> bool {
    true
}

impl RunnerSection {
    pub fn drain_throttle(&self) -> Duration {
        Duration::from_millis(self.drain_throttle_ms)
    }
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            use_cache: default_use_cache(),
            killed_exit_code: default_killed_exit_code(),
            drain_throttle_ms: 0,
            temp_dir: None,
            preload: default_preload(),
        }
    }
}
