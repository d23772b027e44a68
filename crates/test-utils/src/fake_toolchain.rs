use std::fs;
use std::path::{Path, PathBuf};

use scriptrun::config::RunnerConfig;
use tempfile::TempDir;

/// Shell-script stand-in for a real compiler.
///
/// The runner is configured as `sh <fake-script> <script-file>`: `program`
/// is `sh` and `script_flag` is the path of the generated script. Running
/// the fake through `sh` instead of exec'ing it avoids "text file busy"
/// races with freshly written executables.
///
/// The fake:
/// - appends one line per run to `invocations.log`,
/// - rewrites lines of the form `println(<arith>)` to `echo $((<arith>))`,
/// - runs the result with `sh`, so any shell command works as a script body
///   and the exit status is the script's own.
pub struct FakeToolchain {
    dir: TempDir,
}

impl FakeToolchain {
    pub fn new() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("scripts"))?;

        let log = dir.path().join("invocations.log");
        let body = format!(
            r#"echo "run $1" >> '{log}'
sed -e 's/^println(\(.*\))$/echo $((\1))/' "$1" | sh
"#,
            log = log.display()
        );
        fs::write(dir.path().join("fake-kotlinc.sh"), body)?;

        Ok(Self { dir })
    }

    pub fn script_path(&self) -> PathBuf {
        self.dir.path().join("fake-kotlinc.sh")
    }

    /// Where the runner writes per-run script files.
    pub fn scripts_dir(&self) -> PathBuf {
        self.dir.path().join("scripts")
    }

    /// Config running scripts through this fake.
    pub fn config(&self) -> RunnerConfig {
        let mut config = RunnerConfig::default();
        config.toolchain.program = "sh".to_string();
        config.toolchain.script_flag = self.script_path().display().to_string();
        config.runner.temp_dir = Some(self.scripts_dir());
        config.runner.preload = false;
        config
    }

    /// Number of processes the runner has launched through this fake.
    pub fn invocations(&self) -> usize {
        fs::read_to_string(self.dir.path().join("invocations.log"))
            .map(|log| log.lines().filter(|l| l.starts_with("run ")).count())
            .unwrap_or(0)
    }

    /// Files currently present in [`scripts_dir`](Self::scripts_dir).
    pub fn leftover_scripts(&self) -> usize {
        count_entries(&self.scripts_dir())
    }
}

fn count_entries(dir: &Path) -> usize {
    fs::read_dir(dir).map(|rd| rd.count()).unwrap_or(0)
}
