//! Process-wide table of live sessions, one per program name.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use gamepipe_core::config::SessionConfig;

use crate::session::{Session, SessionError};

/// Registry holding at most one running [`Session`] per program name.
///
/// An explicit object rather than process-global state so embedders and
/// tests can run independent registries side by side.
pub struct SessionRegistry {
    config: SessionConfig,
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    /// Create an empty registry using `config` for every session it launches.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Return the running session for `program`, launching a fresh one if
    /// none exists or the registered one has stopped.
    ///
    /// The registry lock spans the whole check-and-launch so two
    /// concurrent callers cannot both observe "absent" and leak a
    /// duplicate process. Stopped sessions are never resurrected, only
    /// replaced.
    pub async fn get_or_create(&self, program: &str) -> Result<Arc<Session>, SessionError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(existing) = sessions.get(program) {
            if existing.is_running() {
                debug!(program, "reusing running session");
                return Ok(Arc::clone(existing));
            }
            debug!(program, "replacing stopped session");
        }
        info!(program, "launching new session");
        let session = Session::launch(program, &self.config)?;
        sessions.insert(program.to_string(), Arc::clone(&session));
        Ok(session)
    }

    /// Dispatch boundary: run one command against `program`'s session and
    /// return the aggregated output.
    ///
    /// A session that dies under the write yields an empty string rather
    /// than an error; the line protocol cannot distinguish "said nothing"
    /// from "gone". Launch failures still surface.
    pub async fn execute(&self, program: &str, command: &str) -> Result<String, SessionError> {
        let session = self.get_or_create(program).await?;
        match session.execute(command).await {
            Ok(output) => Ok(output),
            Err(SessionError::WriteFailed { .. }) => {
                warn!(program, "command hit a dead session, returning empty output");
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Stop the session for `program`, if one is live. Returns whether a
    /// running session was actually torn down.
    pub async fn stop(&self, program: &str) -> bool {
        let sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(program) {
            if session.is_running() {
                session.stop().await;
                return true;
            }
        }
        false
    }

    /// Stop every live session. Used on shutdown.
    pub async fn stop_all(&self) {
        let sessions = self.sessions.lock().await;
        for session in sessions.values() {
            session.stop().await;
        }
    }

    /// Number of currently running sessions.
    pub async fn active_count(&self) -> usize {
        let sessions = self.sessions.lock().await;
        sessions.values().filter(|s| s.is_running()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_registry_has_no_active_sessions() {
        let registry = SessionRegistry::new(SessionConfig::default());
        assert_eq!(registry.active_count().await, 0);
    }

    #[tokio::test]
    async fn stopping_an_unknown_program_is_a_noop() {
        let registry = SessionRegistry::new(SessionConfig::default());
        assert!(!registry.stop("adventure").await);
    }
}
