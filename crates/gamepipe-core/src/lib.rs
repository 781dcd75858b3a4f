//! `GamePipe` Core Library
//!
//! Shared functionality for `GamePipe` components:
//! - Configuration resolution and hierarchy
//! - Common error types
//! - Tracing/logging initialization

pub mod config;
pub mod error;
pub mod tracing_init;

pub use config::{Config, LineEnding, SessionConfig};
pub use error::{Error, Result};
