//! Debounce / lockout controller.
//!
//! Mechanical buttons bounce: one press can produce a burst of edges.  While
//! a firing runs every button is disarmed (handler removed at the line), and
//! afterwards each one is re-armed by its own timer thread once the cool-down
//! has elapsed.  Timers are independent so one slow channel never delays
//! another, and they are never cancelled.  After [`Lockout::halt`] a timer
//! that fires leaves its channel disarmed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, trace};

use super::channel::Channel;
use super::ports::EdgeHandler;
use crate::drivers::task::spawn_named;

pub struct Lockout {
    delay: Duration,
    halted: Arc<AtomicBool>,
}

impl Lockout {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            halted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop re-arming for good, including timers already running.
    pub fn halt(&self) {
        self.halted.store(true, Ordering::Release);
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    /// Disarm every channel.  Returns once no line will deliver another press.
    pub fn disarm_all(&self, channels: &[Arc<Channel>]) {
        for ch in channels {
            ch.disarm();
        }
        trace!("All {} channels disarmed", channels.len());
    }

    /// Re-install `handler` on `channel` after the cool-down, on a separate
    /// thread.  The returned handle may be dropped; the timer still fires.
    pub fn rearm_after(
        &self,
        channel: Arc<Channel>,
        handler: EdgeHandler,
    ) -> std::io::Result<JoinHandle<()>> {
        let delay = self.delay;
        let halted = Arc::clone(&self.halted);
        spawn_named(format!("rearm-{}", channel.index()), move || {
            std::thread::sleep(delay);
            if halted.load(Ordering::Acquire) {
                debug!("Channel {} stays disarmed, shutting down", channel.index());
                return;
            }
            channel.arm(handler);
            debug!("Channel {} re-armed after {:?}", channel.index(), delay);
        })
    }
}
