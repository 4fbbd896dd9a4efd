//! Unified error types for the pi3ctrl controller.
//!
//! A single `Error` enum that every subsystem converts into, one variant per
//! failure class.  Configuration and GPIO errors are fatal at startup.
//! [`CommandError`] stays separate: the orchestrator only ever logs it, since
//! the trigger path is event-driven and has no caller to hand an error back
//! to.

use core::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug)]
pub enum Error {
    /// Configuration is invalid or could not be loaded.
    Config(String),
    /// Peripheral or process setup failed.
    Init(String),
    /// A GPIO line could not be claimed or configured.
    Gpio { pin: u8, reason: String },
    /// Filesystem or thread-spawn failure.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Gpio { pin, reason } => write!(f, "gpio {pin}: {reason}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Failures of the command executor itself.  A player that runs and exits
/// non-zero is *not* an error at this level; see
/// [`CommandOutput::success`](crate::drivers::executor::CommandOutput::success).
#[derive(Debug)]
pub enum CommandError {
    /// The process could not be started (missing binary, permissions).
    Spawn(std::io::Error),
    /// Waiting on the child or collecting its output failed.
    Wait(std::io::Error),
    /// The child outlived the configured timeout and was killed.
    Timeout { after: Duration },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(e) => write!(f, "spawn failed: {e}"),
            Self::Wait(e) => write!(f, "wait failed: {e}"),
            Self::Timeout { after } => write!(f, "killed after {:.1}s timeout", after.as_secs_f64()),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(e) | Self::Wait(e) => Some(e),
            Self::Timeout { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
