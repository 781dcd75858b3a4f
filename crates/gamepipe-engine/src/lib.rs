//! GamePipe Engine
//!
//! Runs interactive, line-oriented console programs behind pipes:
//! - Child process launching with line-buffered stdout
//! - Background relay draining child output into a per-session channel
//! - Timeout-bounded command execution against a live session
//! - Process-wide registry holding one session per program name

mod launcher;
pub mod registry;
mod relay;
pub mod session;

pub use registry::SessionRegistry;
pub use session::{Session, SessionError};
