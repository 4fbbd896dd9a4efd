//! Port traits — the hexagonal boundary between the trigger core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Orchestrator (domain)
//! ```
//!
//! Driven adapters (GPIO lines, the player process, trigger history) implement
//! these traits.  The [`Orchestrator`](super::orchestrator::Orchestrator) only
//! ever holds them as trait objects, so the core never touches hardware or
//! spawns processes directly and can be tested with fakes.

use std::path::PathBuf;
use std::sync::Arc;

use crate::drivers::executor::{CommandOutput, PlayCommand};
use crate::error::{CommandError, Result};

use super::events::TriggerEvent;

/// Callback invoked on a button press edge.
pub type EdgeHandler = Arc<dyn Fn() + Send + Sync>;

// ───────────────────────────────────────────────────────────────
// GPIO lines (driven adapter: hardware ↔ domain)
// ───────────────────────────────────────────────────────────────

/// A button input line.
pub trait InputLine: Send {
    /// Register or replace the press callback.  `None` disables the line:
    /// no further presses are delivered until a handler is installed again.
    ///
    /// Implementations must not hold internal locks while invoking the
    /// handler, since the handler itself re-subscribes lines.
    fn subscribe_rising_edge(&mut self, handler: Option<EdgeHandler>);
}

/// An LED output line.  Setting the same level twice is harmless.
pub trait OutputLine: Send {
    fn set_level(&mut self, on: bool);
}

/// Every `embedded-hal` output pin is an LED line.  Driver errors at runtime
/// are logged and otherwise ignored.
impl<P> OutputLine for P
where
    P: embedded_hal::digital::OutputPin + Send,
{
    fn set_level(&mut self, on: bool) {
        let res = if on { self.set_high() } else { self.set_low() };
        if let Err(e) = res {
            log::warn!("LED set_level({}) failed: {:?}", on, e);
        }
    }
}

/// Opens lines by BCM pin number.  Failures are fatal at startup.
pub trait LineFactory {
    fn input(&mut self, pin: u8) -> Result<Box<dyn InputLine>>;
    fn output(&mut self, pin: u8) -> Result<Box<dyn OutputLine>>;
}

// ───────────────────────────────────────────────────────────────
// Command runner (driven adapter: domain → player process)
// ───────────────────────────────────────────────────────────────

/// Runs the player synchronously.  A non-zero exit is reported in the
/// returned [`CommandOutput`]; `Err` means the command never completed.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &PlayCommand) -> core::result::Result<CommandOutput, CommandError>;
}

// ───────────────────────────────────────────────────────────────
// Trigger sink (driven adapter: domain → history / logging)
// ───────────────────────────────────────────────────────────────

/// Receives every accepted trigger, synchronously and before the player
/// starts.  Implementations must return quickly; playback waits on them.
pub trait TriggerSink: Send + Sync {
    fn on_trigger(&self, event: &TriggerEvent) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Sound mapping
// ───────────────────────────────────────────────────────────────

/// Pure mapping from a channel to the sound resource it plays.
pub trait SoundMap: Send + Sync {
    fn resolve(&self, channel_index: usize, pin: u8) -> PathBuf;
}
