//! Trigger orchestrator — the hexagonal core.
//!
//! [`Orchestrator`] owns the channels, the indicator driver, the lockout
//! controller and the single gate that serialises firings.  All I/O goes
//! through port traits injected at construction.
//!
//! ```text
//!  InputLine ──edge──▶ ┌─────────────────────────┐ ──▶ TriggerSink
//!                      │      Orchestrator        │
//!  OutputLine ◀────────│ gate · lockout · blink   │ ──▶ CommandRunner
//!                      └─────────────────────────┘
//! ```
//!
//! ## Firing sequence
//!
//! ```text
//! Idle ──edge(c), gate free──▶ Firing(c) ──player done──▶ Draining(c) ──▶ Idle
//!   disarm all · LEDs off · blink c ·        stop blink · standby ·
//!   notify sink · run player                 release gate · re-arm timers
//! ```
//!
//! Everything after the gate is acquired lives in a [`Firing`] guard whose
//! `Drop` performs the drain, so the indicator is stopped, LEDs return to
//! standby and re-arm timers are scheduled on every exit path: a failed
//! player, a failed sink, or a panic further down.
//!
//! Edges that arrive while the gate is held are dropped, never queued.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use log::{debug, error, info, warn};

use crate::config::ControllerConfig;
use crate::drivers::executor::PlayCommand;
use crate::drivers::indicator::{BlinkHandle, BlinkPattern, IndicatorDriver};

use super::channel::Channel;
use super::events::{EdgeOutcome, FiringState, TriggerEvent};
use super::lockout::Lockout;
use super::ports::{CommandRunner, EdgeHandler, SoundMap, TriggerSink};

// ───────────────────────────────────────────────────────────────
// Orchestrator
// ───────────────────────────────────────────────────────────────

pub struct Orchestrator {
    channels: Vec<Arc<Channel>>,
    indicator: IndicatorDriver,
    lockout: Lockout,
    runner: Box<dyn CommandRunner>,
    sink: Box<dyn TriggerSink>,
    sounds: Box<dyn SoundMap>,
    player: PathBuf,
    player_args: Vec<String>,
    /// Held for the whole of Firing and Draining.
    gate: Mutex<()>,
    state: Mutex<FiringState>,
    completed: AtomicU64,
    dropped: AtomicU64,
}

impl Orchestrator {
    /// Build the orchestrator.  Channels stay disarmed until [`arm_all`].
    ///
    /// [`arm_all`]: Self::arm_all
    pub fn new(
        channels: Vec<Arc<Channel>>,
        config: &ControllerConfig,
        runner: Box<dyn CommandRunner>,
        sink: Box<dyn TriggerSink>,
        sounds: Box<dyn SoundMap>,
    ) -> Arc<Self> {
        let pattern = BlinkPattern {
            on: config.led_on(),
            off: config.led_off(),
        };
        Arc::new(Self {
            channels,
            indicator: IndicatorDriver::new(pattern),
            lockout: Lockout::new(config.rearm_delay()),
            runner,
            sink,
            sounds,
            player: config.soundfile_player.clone(),
            player_args: config.player_args.clone(),
            gate: Mutex::new(()),
            state: Mutex::new(FiringState::Idle),
            completed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Install the press handler on every channel.
    pub fn arm_all(self: &Arc<Self>) {
        for ch in &self.channels {
            ch.arm(self.edge_handler(ch.index()));
        }
    }

    /// All LEDs steady on.
    pub fn standby(&self) {
        self.indicator.standby(&self.channels);
    }

    /// Disarm every button for good and switch the LEDs off.  Outputs are
    /// only touched if no firing holds the gate; a firing in flight finishes
    /// its drain but schedules no re-arm, and pending re-arm timers expire
    /// without arming.
    pub fn shutdown(&self) {
        self.lockout.halt();
        self.lockout.disarm_all(&self.channels);
        match self.gate.try_lock() {
            Ok(_gate) => {
                for ch in &self.channels {
                    ch.set_output(false);
                }
            }
            Err(TryLockError::Poisoned(p)) => {
                let _gate = p.into_inner();
                for ch in &self.channels {
                    ch.set_output(false);
                }
            }
            Err(TryLockError::WouldBlock) => {
                warn!("Shutdown during a firing, LEDs left as they are");
            }
        }
    }

    /// Handler bound to `index`.  Holds only a weak reference, since the
    /// handler is stored inside lines the orchestrator itself owns.
    pub fn edge_handler(self: &Arc<Self>, index: usize) -> EdgeHandler {
        let weak = Arc::downgrade(self);
        Arc::new(move || {
            if let Some(orch) = weak.upgrade() {
                orch.handle_edge(index);
            }
        })
    }

    // ── Edge handling ─────────────────────────────────────────

    /// Entry point for a press on channel `index`.  Blocks for the whole
    /// firing when the edge is accepted.
    pub fn handle_edge(self: &Arc<Self>, index: usize) -> EdgeOutcome {
        let Some(channel) = self.channels.get(index).cloned() else {
            warn!("Edge on unknown channel {}", index);
            return EdgeOutcome::UnknownChannel;
        };

        let gate = match self.gate.try_lock() {
            Ok(gate) => gate,
            Err(TryLockError::WouldBlock) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("Button {} ignored, playback already running", index);
                return EdgeOutcome::Dropped;
            }
            Err(TryLockError::Poisoned(p)) => {
                warn!("Gate poisoned by an earlier panic, continuing");
                p.into_inner()
            }
        };

        let mut firing = Firing::begin(self, gate, channel);
        firing.play();
        drop(firing);
        EdgeOutcome::Fired
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> FiringState {
        *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn channels(&self) -> &[Arc<Channel>] {
        &self.channels
    }

    pub fn indicator(&self) -> &IndicatorDriver {
        &self.indicator
    }

    /// Firings that ran to the end of their drain.
    pub fn completed_firings(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Edges discarded because a firing was in progress.
    pub fn dropped_edges(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    // ── Internal ──────────────────────────────────────────────

    fn transition(&self, to: FiringState) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        info!("STATE | {:?} -> {:?}", *state, to);
        *state = to;
    }

    /// One independent re-arm timer per channel.  Called after the gate is
    /// released.
    fn schedule_rearm(self: &Arc<Self>) {
        if self.lockout.is_halted() {
            debug!("Shut down, channels stay disarmed");
            return;
        }
        for ch in &self.channels {
            let handler = self.edge_handler(ch.index());
            if let Err(e) = self.lockout.rearm_after(Arc::clone(ch), Arc::clone(&handler)) {
                error!("Re-arm timer for channel {} failed ({}), arming now", ch.index(), e);
                ch.arm(handler);
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Firing — scoped playback session
// ───────────────────────────────────────────────────────────────

/// One playback session.  Exists only while the gate is held; dropping it
/// drains and releases the gate.
struct Firing<'a> {
    orch: &'a Arc<Orchestrator>,
    channel: Arc<Channel>,
    blink: Option<BlinkHandle>,
    gate: Option<MutexGuard<'a, ()>>,
}

impl<'a> Firing<'a> {
    /// Enter Firing: disarm every button before anything can block.
    fn begin(orch: &'a Arc<Orchestrator>, gate: MutexGuard<'a, ()>, channel: Arc<Channel>) -> Self {
        orch.lockout.disarm_all(&orch.channels);
        orch.transition(FiringState::Firing(channel.index()));
        Self {
            orch,
            channel,
            blink: None,
            gate: Some(gate),
        }
    }

    fn play(&mut self) {
        let orch = self.orch;
        let index = self.channel.index();
        let pin = self.channel.pin();

        for ch in &orch.channels {
            ch.set_output(false);
        }
        match orch.indicator.start_blink(&self.channel) {
            Ok(handle) => self.blink = Some(handle),
            Err(e) => warn!("Blink for LED {} not started: {}", index, e),
        }

        let event = TriggerEvent::new(index, pin);
        info!("TRIGGER | button={} pin={} at {}", index, pin, event.timestamp);
        if let Err(e) = orch.sink.on_trigger(&event) {
            warn!("Trigger sink failed: {}", e);
        }

        let sound = orch.sounds.resolve(index, pin);
        let command = PlayCommand::new(&orch.player, sound, &orch.player_args);
        info!("CMD | button {} for GPIO{}: {}", index, pin, command);

        match orch.runner.run(&command) {
            Ok(out) if out.success() => {
                debug!("CMD | finished in {:.2}s", out.elapsed.as_secs_f64());
                if !out.stdout.is_empty() {
                    debug!("Command output: {}", out.stdout.trim_end());
                }
            }
            Ok(out) => {
                warn!(
                    "CMD | exit {:?} after {:.2}s: {}",
                    out.exit_code,
                    out.elapsed.as_secs_f64(),
                    out.stderr.trim_end()
                );
            }
            Err(e) => error!("CMD | {} failed: {}", command, e),
        }
    }
}

impl Drop for Firing<'_> {
    fn drop(&mut self) {
        let orch = self.orch;
        let index = self.channel.index();

        orch.transition(FiringState::Draining(index));
        if let Some(handle) = self.blink.take() {
            orch.indicator.stop_blink(handle);
        }
        orch.indicator.standby(&orch.channels);
        orch.transition(FiringState::Idle);
        orch.completed.fetch_add(1, Ordering::Relaxed);

        drop(self.gate.take());
        orch.schedule_rearm();
        info!("Button {} done", index);
    }
}
