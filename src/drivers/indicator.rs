//! LED indicator driver.
//!
//! Standby is steady on.  During a firing the active channel's LED blinks
//! with a configurable on/off pattern on its own thread; every other LED is
//! off.
//!
//! ## Cancellation
//!
//! The blink thread checks its stop flag at every phase boundary, never in
//! the middle of a sleep.  [`IndicatorDriver::stop_blink`] therefore returns
//! at most one phase (`max(on, off)`) after it is called.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, warn};

use crate::app::channel::Channel;
use crate::drivers::task::spawn_named;

/// On/off phase lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkPattern {
    pub on: Duration,
    pub off: Duration,
}

impl BlinkPattern {
    /// Upper bound on the time `stop_blink` waits.
    pub fn max_stop_latency(&self) -> Duration {
        self.on.max(self.off)
    }
}

/// A running blink activity.  Must be handed back to
/// [`IndicatorDriver::stop_blink`]; dropping it leaves the thread running.
#[must_use = "a blink keeps running until passed to stop_blink"]
pub struct BlinkHandle {
    channel: usize,
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl BlinkHandle {
    pub fn channel(&self) -> usize {
        self.channel
    }
}

pub struct IndicatorDriver {
    pattern: BlinkPattern,
    active: Arc<AtomicUsize>,
}

impl IndicatorDriver {
    pub fn new(pattern: BlinkPattern) -> Self {
        Self {
            pattern,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start blinking `channel`'s LED on a dedicated thread.
    pub fn start_blink(&self, channel: &Arc<Channel>) -> std::io::Result<BlinkHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let pattern = self.pattern;
        let active = Arc::clone(&self.active);
        let led = Arc::clone(channel);
        let flag = Arc::clone(&stop);

        let previous = active.fetch_add(1, Ordering::AcqRel);
        debug_assert_eq!(previous, 0, "second blink started while one is running");

        let task = spawn_named(format!("blink-{}", channel.index()), move || {
            blink_loop(&led, pattern, &flag);
            active.fetch_sub(1, Ordering::AcqRel);
        });

        match task {
            Ok(task) => {
                debug!("Blink started on LED {}", channel.index());
                Ok(BlinkHandle {
                    channel: channel.index(),
                    stop,
                    task,
                })
            }
            Err(e) => {
                self.active.fetch_sub(1, Ordering::AcqRel);
                Err(e)
            }
        }
    }

    /// Signal the blink thread and wait for it to exit.
    pub fn stop_blink(&self, handle: BlinkHandle) {
        handle.stop.store(true, Ordering::Release);
        if handle.task.join().is_err() {
            warn!("Blink thread for LED {} panicked", handle.channel);
        }
        debug!("Blink stopped on LED {}", handle.channel);
    }

    /// Steady on for every channel: idle and ready.
    pub fn standby(&self, channels: &[Arc<Channel>]) {
        for ch in channels {
            ch.set_output(true);
        }
    }

    /// Whether a blink thread is currently running.
    pub fn is_blinking(&self) -> bool {
        self.active.load(Ordering::Acquire) > 0
    }
}

fn blink_loop(channel: &Channel, pattern: BlinkPattern, stop: &AtomicBool) {
    while !stop.load(Ordering::Acquire) {
        channel.set_output(true);
        std::thread::sleep(pattern.on);
        if stop.load(Ordering::Acquire) {
            break;
        }
        channel.set_output(false);
        std::thread::sleep(pattern.off);
    }
}
