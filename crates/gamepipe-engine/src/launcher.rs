//! Child process launching.
//!
//! Spawns the managed program with stdin/stdout/stderr piped. On unix the
//! program is wrapped in `stdbuf -oL` so its stdout is flushed per line
//! even when the child itself block-buffers a non-tty pipe; the relay
//! depends on receiving complete lines promptly.

use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::info;

use crate::session::SessionError;

/// A freshly spawned child with all three standard pipes captured.
pub(crate) struct ChildPipes {
    pub child: Child,
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

/// Spawn `program` and capture its pipes.
///
/// Fails with [`SessionError::LaunchFailed`] if the spawn itself fails or
/// a pipe cannot be captured; in the latter case the child is killed so
/// no half-wired process leaks.
pub(crate) fn launch(program: &str) -> Result<ChildPipes, SessionError> {
    let mut cmd = line_buffered_command(program);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    info!(program, "spawning child process");
    let mut child = cmd.spawn().map_err(|e| SessionError::LaunchFailed {
        program: program.to_string(),
        reason: e.to_string(),
    })?;

    match (child.stdin.take(), child.stdout.take(), child.stderr.take()) {
        (Some(stdin), Some(stdout), Some(stderr)) => Ok(ChildPipes {
            child,
            stdin,
            stdout,
            stderr,
        }),
        _ => {
            child.start_kill().ok();
            Err(SessionError::LaunchFailed {
                program: program.to_string(),
                reason: "failed to capture child pipes".to_string(),
            })
        }
    }
}

#[cfg(unix)]
fn line_buffered_command(program: &str) -> Command {
    let mut cmd = Command::new("stdbuf");
    cmd.arg("-oL").arg(program);
    cmd
}

#[cfg(not(unix))]
fn line_buffered_command(program: &str) -> Command {
    Command::new(program)
}
