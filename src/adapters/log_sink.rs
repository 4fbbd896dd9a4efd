//! Log-based trigger sink.
//!
//! Implements [`TriggerSink`] by writing every accepted press to the
//! process log.  Used when no history file is configured.

use log::info;

use crate::app::events::TriggerEvent;
use crate::app::ports::TriggerSink;
use crate::error::Result;

/// Adapter that logs every [`TriggerEvent`].
#[derive(Debug, Default)]
pub struct LogTriggerSink;

impl LogTriggerSink {
    pub fn new() -> Self {
        Self
    }
}

impl TriggerSink for LogTriggerSink {
    fn on_trigger(&self, event: &TriggerEvent) -> Result<()> {
        info!(
            "HISTORY | button={} pin={} created={}",
            event.channel_index,
            event.pin,
            event.timestamp.to_rfc3339()
        );
        Ok(())
    }
}
