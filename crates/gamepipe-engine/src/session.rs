//! One live child program: process handle, pipes, and command execution.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

use gamepipe_core::config::{LineEnding, SessionConfig};

use crate::launcher;
use crate::relay;

/// Errors from session launch and command execution.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to launch '{program}': {reason}")]
    LaunchFailed { program: String, reason: String },

    #[error("Stdin write to '{program}' failed")]
    WriteFailed { program: String },
}

/// A running instance of a managed external program.
///
/// The session exclusively owns the OS process, its stdin pipe (via the
/// writer task) and the output channel the relay publishes into. Callers
/// interact only through [`Session::execute`] and [`Session::stop`].
pub struct Session {
    program: String,
    idle_timeout: Duration,
    running: AtomicBool,
    /// Child handle, taken exactly once by the first `stop`.
    child: Mutex<Option<Child>>,
    /// Sender feeding the stdin writer task; dropped on stop, which ends
    /// the writer and closes the pipe.
    stdin_tx: Mutex<Option<mpsc::Sender<String>>>,
    /// Receiver end of the relay channel. The lock doubles as the
    /// one-command-in-flight guard: `execute` holds it for the whole
    /// write-then-collect sequence.
    output_rx: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl Session {
    /// Launch `program` and wire up the relay and stdin writer tasks.
    pub(crate) fn launch(
        program: &str,
        config: &SessionConfig,
    ) -> Result<Arc<Self>, SessionError> {
        let pipes = launcher::launch(program)?;

        let (stdin_tx, stdin_rx) = mpsc::channel::<String>(32);
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        let session = Arc::new(Self {
            program: program.to_string(),
            idle_timeout: config.idle_timeout(),
            running: AtomicBool::new(true),
            child: Mutex::new(Some(pipes.child)),
            stdin_tx: Mutex::new(Some(stdin_tx)),
            output_rx: Mutex::new(out_rx),
        });

        spawn_stdin_writer(pipes.stdin, stdin_rx, config.line_ending);
        relay::spawn_stdout_relay(Arc::clone(&session), pipes.stdout, out_tx);
        relay::spawn_stderr_logger(program.to_string(), pipes.stderr);

        Ok(session)
    }

    /// Send one command line to the child and collect its output.
    ///
    /// Collection ends once the child stays silent for the idle timeout
    /// or the output channel closes (session torn down); the timeout
    /// restarts on every received line, so a chatty command may run
    /// arbitrarily long. Lines are returned joined with `\n`.
    ///
    /// Commands are serialized per session: a concurrent caller waits
    /// until the current write-then-collect sequence finishes. Output
    /// left in the channel by an earlier command is swept into this
    /// result; temporal adjacency is the only command/response
    /// correlation the line protocol offers.
    #[allow(clippy::significant_drop_tightening)]
    pub async fn execute(&self, command: &str) -> Result<String, SessionError> {
        let mut output_rx = self.output_rx.lock().await;

        let sent = {
            let stdin_tx = self.stdin_tx.lock().await;
            match stdin_tx.as_ref() {
                Some(tx) => tx.send(command.to_string()).await.is_ok(),
                None => false,
            }
        };
        if !sent {
            if self.is_running() {
                warn!(program = %self.program, "stdin write failed, stopping session");
                self.stop().await;
                return Err(SessionError::WriteFailed {
                    program: self.program.clone(),
                });
            }
            // Stopped session: no write possible, but buffered output
            // (e.g. from a child that exited on its own) is still drained.
            debug!(program = %self.program, "execute against a stopped session");
        }

        let mut lines = Vec::new();
        loop {
            match tokio::time::timeout(self.idle_timeout, output_rx.recv()).await {
                Ok(Some(line)) => lines.push(line),
                Ok(None) => {
                    debug!(program = %self.program, "output channel closed");
                    break;
                }
                // Silence for longer than the idle timeout ends the response.
                Err(_) => break,
            }
        }
        Ok(lines.join("\n"))
    }

    /// Tear the session down: kill the child, reap it off the hot path,
    /// and close the stdin pipe.
    ///
    /// Idempotent; the first caller (an explicit stop or the relay
    /// reacting to end-of-stream) performs the real teardown, later calls
    /// are no-ops. Never waits for the relay or the child to acknowledge.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!(program = %self.program, "stopping session");

        // Kill before closing stdin so a writer blocked on a full pipe
        // unblocks instead of stalling teardown.
        let child = self.child.lock().await.take();
        if let Some(mut child) = child {
            if let Err(e) = child.start_kill() {
                warn!(program = %self.program, error = %e, "failed to kill child process");
            }
            tokio::spawn(async move {
                child.wait().await.ok();
            });
        }

        self.stdin_tx.lock().await.take();
    }

    /// Whether the session is still live (teardown not yet initiated).
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Name of the managed program.
    pub fn program(&self) -> &str {
        &self.program
    }
}

/// Writer task owning the child's stdin pipe. Appends the configured
/// line terminator and flushes after every command. Exits (closing the
/// pipe) when the session drops its sender or a write fails.
fn spawn_stdin_writer(
    mut stdin: ChildStdin,
    mut rx: mpsc::Receiver<String>,
    line_ending: LineEnding,
) {
    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if let Err(e) = stdin.write_all(line.as_bytes()).await {
                error!(error = %e, "failed to write to child stdin");
                break;
            }
            if let Err(e) = stdin.write_all(line_ending.as_str().as_bytes()).await {
                error!(error = %e, "failed to write line terminator");
                break;
            }
            if let Err(e) = stdin.flush().await {
                error!(error = %e, "failed to flush child stdin");
                break;
            }
        }
        debug!("stdin writer finished");
    });
}
