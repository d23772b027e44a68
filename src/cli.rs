// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `scriptrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scriptrun",
    version,
    about = "Run a script through an external compiler, streaming its output.",
    long_about = None
)]
pub struct CliArgs {
    /// Script file to run. Use `-` to read the script from stdin.
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Path to the config file (TOML).
    ///
    /// A missing file is not an error; built-in defaults are used instead.
    #[arg(long, value_name = "PATH", default_value = "Scriptrun.toml")]
    pub config: PathBuf,

    /// Always start a fresh process, ignoring cached results.
    #[arg(long)]
    pub no_cache: bool,

    /// Run the same script this many times in a row.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub repeat: u32,

    /// Override `[toolchain].program` from the config file.
    #[arg(long, value_name = "PROGRAM")]
    pub toolchain: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SCRIPTRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_script_is_given() {
        let args = CliArgs::try_parse_from(["scriptrun", "hello.kts"]).unwrap();
        assert_eq!(args.script, PathBuf::from("hello.kts"));
        assert_eq!(args.config, PathBuf::from("Scriptrun.toml"));
        assert_eq!(args.repeat, 1);
        assert!(!args.no_cache);
        assert!(args.toolchain.is_none());
    }

    #[test]
    fn flags_are_parsed() {
        let args = CliArgs::try_parse_from([
            "scriptrun",
            "--no-cache",
            "--repeat",
            "3",
            "--toolchain",
            "/opt/kotlinc/bin/kotlinc",
            "--log-level",
            "debug",
            "-",
        ])
        .unwrap();
        assert!(args.no_cache);
        assert_eq!(args.repeat, 3);
        assert_eq!(args.toolchain.as_deref(), Some("/opt/kotlinc/bin/kotlinc"));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert_eq!(args.script, PathBuf::from("-"));
    }
}
