//! Process lifecycle: wire the buttons up, then wait for SIGINT/SIGTERM.
//!
//! Termination does not wait for an in-flight firing; the process exits
//! right after the signal is logged and the idle LEDs are switched off.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use log::{info, warn};

use crate::error::{Error, Result};

use super::orchestrator::Orchestrator;

pub struct Lifecycle {
    orchestrator: Arc<Orchestrator>,
}

impl Lifecycle {
    /// Arm every button and put the LEDs in standby.
    pub fn start(orchestrator: Arc<Orchestrator>) -> Self {
        orchestrator.arm_all();
        orchestrator.standby();
        let pins: Vec<u8> = orchestrator.channels().iter().map(|c| c.pin()).collect();
        let leds: Vec<u8> = orchestrator.channels().iter().map(|c| c.led_pin()).collect();
        info!("Monitoring GPIO pins {:?} for button presses, LEDs on {:?}", pins, leds);
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// Install the process-wide SIGINT/SIGTERM handler.  May only be called
    /// once per process.
    pub fn termination_signal() -> Result<Receiver<()>> {
        let (tx, rx) = mpsc::channel();
        ctrlc::set_handler(move || {
            let _ = tx.send(());
        })
        .map_err(|e| Error::Init(format!("cannot install signal handler: {e}")))?;
        Ok(rx)
    }

    /// Block until `shutdown` fires (or its sender is gone), then disarm.
    /// Buttons stay disarmed afterwards, even when a firing was in flight.
    pub fn run_until(&self, shutdown: &Receiver<()>) {
        if shutdown.recv().is_err() {
            warn!("Shutdown channel closed");
        }
        info!("Exiting...");
        self.orchestrator.shutdown();
    }

    /// Block until SIGINT/SIGTERM, then exit the process.
    pub fn run_forever(self) -> Result<()> {
        let shutdown = Self::termination_signal()?;
        self.run_until(&shutdown);
        std::process::exit(0);
    }
}
