//! Background relay tasks bound to one session.
//!
//! The stdout relay drains the child's output one line at a time into the
//! session's hand-off channel for the session's whole lifetime. The
//! channel is unbounded so the relay always makes progress even when no
//! command is currently collecting; lines nobody drained stay buffered.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::session::Session;

/// Spawn the stdout relay for `session`.
///
/// On end-of-stream or read error the relay tears the session down and
/// exits; dropping `tx` here is what closes the output channel, so a
/// collecting `execute` observes the closure and returns.
pub(crate) fn spawn_stdout_relay(
    session: Arc<Session>,
    stdout: ChildStdout,
    tx: mpsc::UnboundedSender<String>,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    debug!(program = session.program(), "stdout: {line}");
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    debug!(program = session.program(), "child closed stdout");
                    break;
                }
                Err(e) => {
                    warn!(program = session.program(), error = %e, "stdout read failed");
                    break;
                }
            }
        }
        session.stop().await;
        debug!(program = session.program(), "stdout relay finished");
    });
}

/// Spawn the stderr drain; lines are logged for diagnostics only.
pub(crate) fn spawn_stderr_logger(program: String, stderr: ChildStderr) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            warn!(program, "stderr: {line}");
        }
        debug!(program, "stderr drain finished");
    });
}
