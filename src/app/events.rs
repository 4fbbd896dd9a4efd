//! Domain events and observable state of the trigger core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One accepted button press.  Created when playback starts and handed to
/// the [`TriggerSink`](super::ports::TriggerSink); the core keeps no copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    #[serde(rename = "button")]
    pub channel_index: usize,
    pub pin: u8,
    #[serde(rename = "created")]
    pub timestamp: DateTime<Utc>,
}

impl TriggerEvent {
    pub fn new(channel_index: usize, pin: u8) -> Self {
        Self {
            channel_index,
            pin,
            timestamp: Utc::now(),
        }
    }
}

/// Orchestrator state.  `Idle` says nothing about re-arm progress; channels
/// may still be cooling down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiringState {
    Idle,
    /// Gate held; the player for this channel is starting or running.
    Firing(usize),
    /// Player finished; indicator being stopped and outputs reset.
    Draining(usize),
}

/// What happened to a single delivered edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// The edge won the gate and a full firing ran.
    Fired,
    /// Another firing held the gate; the edge was discarded.
    Dropped,
    /// The edge named a channel that does not exist.
    UnknownChannel,
}
