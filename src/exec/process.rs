// src/exec/process.rs

//! OS-level helpers: script file, command construction, forced kill.

use std::io::{self, Write};
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tempfile::NamedTempFile;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::config::ToolchainConfig;

/// Write `script` to a uniquely named file that is deleted on drop.
pub fn write_script(
    script: &str,
    dir: Option<&Path>,
    extension: &str,
) -> io::Result<NamedTempFile> {
    let suffix = format!(".{extension}");
    let mut builder = tempfile::Builder::new();
    builder.prefix("scriptrun-").suffix(&suffix);

    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(script.as_bytes())?;
    file.flush()?;

    debug!(path = ?file.path(), bytes = script.len(), "wrote script file");
    Ok(file)
}

/// Reading end of the pipe shared by the child's stdout and stderr.
#[cfg(unix)]
pub type MergedOutput = tokio::net::unix::pipe::Receiver;
#[cfg(not(unix))]
pub type MergedOutput = tokio::fs::File;

/// A freshly spawned script process.
pub struct SpawnedScript {
    pub child: Child,
    /// Both output streams, interleaved in the order they were written.
    pub output: MergedOutput,
    /// Process group to signal on a forced kill. Recorded at spawn time
    /// because the pid is no longer available once the child is reaped.
    pub pgid: Option<u32>,
}

/// `<program> <script_flag> <script_path>` with null stdin.
///
/// On Unix the child leads a new process group so that a forced kill also
/// reaches anything the toolchain launcher spawned.
pub fn script_command(toolchain: &ToolchainConfig, script_path: &Path) -> Command {
    let mut cmd = Command::new(&toolchain.program);
    cmd.arg(&toolchain.script_flag)
        .arg(script_path)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);

    cmd
}

/// Launch the toolchain on `script_path` with stderr redirected into
/// stdout: both are the write end of one pipe, so the reader sees a single
/// stream in write order.
///
/// Must be called inside a Tokio runtime.
pub fn spawn_script(
    toolchain: &ToolchainConfig,
    script_path: &Path,
) -> io::Result<SpawnedScript> {
    let (reader, writer) = os_pipe::pipe()?;
    let writer_err = writer.try_clone()?;

    let child = {
        let mut cmd = script_command(toolchain, script_path);
        cmd.stdout(writer).stderr(writer_err);
        cmd.spawn()?
    };
    // `cmd` is gone, and with it our copies of the write end. The reader
    // sees end-of-input once every process holding the pipe has exited.

    let pgid = child.id();
    let output = merged_output(reader)?;
    Ok(SpawnedScript {
        child,
        output,
        pgid,
    })
}

#[cfg(unix)]
fn merged_output(reader: os_pipe::PipeReader) -> io::Result<MergedOutput> {
    tokio::net::unix::pipe::Receiver::from_owned_fd(std::os::fd::OwnedFd::from(reader))
}

#[cfg(not(unix))]
fn merged_output(reader: os_pipe::PipeReader) -> io::Result<MergedOutput> {
    let handle = std::os::windows::io::OwnedHandle::from(reader);
    Ok(tokio::fs::File::from_std(std::fs::File::from(handle)))
}

/// Kill the child's process group and the child itself, then wait until the
/// OS reports the child gone.
pub async fn force_kill(child: &mut Child, pgid: Option<u32>) -> io::Result<ExitStatus> {
    kill_group(pgid);

    if let Err(e) = child.start_kill() {
        debug!(error = %e, "start_kill failed; process has probably exited already");
    }

    child.wait().await
}

/// SIGKILL every process left in the group. A no-op off Unix.
pub fn kill_group(pgid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pgid) = pgid {
        kill_process_group(pgid);
    }
    #[cfg(not(unix))]
    let _ = pgid;
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    // SAFETY: kill(2) takes no pointers. A negative pid targets the group.
    let rc = unsafe { libc::kill(-(pgid as libc::pid_t), libc::SIGKILL) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        debug!(pgid, error = %err, "could not signal process group");
    }
}
