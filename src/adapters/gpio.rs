//! GPIO line adapters.
//!
//! - **`feature = "rpi"`**: [`RpiGpio`] opens real lines through `rppal`.
//!   Each button gets one asynchronous interrupt for its whole lifetime; the
//!   interrupt callback forwards to whatever handler is currently subscribed,
//!   so disarming from inside a callback never has to tear the interrupt
//!   thread down.
//! - **always**: [`SimGpio`] keeps every line in memory.  Presses are
//!   injected with [`SimGpio::press`]; used by the binary when built without
//!   hardware support, and by tests.

use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::trace;

use crate::app::ports::{EdgeHandler, InputLine, LineFactory, OutputLine};
use crate::error::{Error, Result};

/// Currently subscribed press handler of one button.
type Slot = Arc<Mutex<Option<EdgeHandler>>>;

/// Call the subscribed handler, if any, without holding the slot lock.
fn dispatch(slot: &Slot) -> bool {
    let handler = slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
    match handler {
        Some(h) => {
            h();
            true
        }
        None => false,
    }
}

fn subscribe(slot: &Slot, handler: Option<EdgeHandler>) {
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = handler;
}

// ───────────────────────────────────────────────────────────────
// Simulation backend
// ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct SimState {
    claimed: HashSet<u8>,
    buttons: HashMap<u8, Slot>,
    leds: HashMap<u8, Arc<AtomicBool>>,
}

/// In-memory GPIO.  Clones share the same lines.
#[derive(Clone, Default)]
pub struct SimGpio {
    state: Arc<Mutex<SimState>>,
}

impl SimGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a press on button `pin`.  Runs the subscribed handler on the
    /// calling thread and returns whether one was subscribed.
    pub fn press(&self, pin: u8) -> bool {
        let slot = self.lock().buttons.get(&pin).cloned();
        slot.is_some_and(|s| dispatch(&s))
    }

    /// Current level of LED `pin`, if it was opened.
    pub fn level(&self, pin: u8) -> Option<bool> {
        self.lock()
            .leds
            .get(&pin)
            .map(|l| l.load(Ordering::Acquire))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn claim(state: &mut SimState, pin: u8) -> Result<()> {
        if state.claimed.insert(pin) {
            Ok(())
        } else {
            Err(Error::Gpio {
                pin,
                reason: "already claimed".into(),
            })
        }
    }
}

impl LineFactory for SimGpio {
    fn input(&mut self, pin: u8) -> Result<Box<dyn InputLine>> {
        let mut state = self.lock();
        Self::claim(&mut state, pin)?;
        let slot = Slot::default();
        state.buttons.insert(pin, Arc::clone(&slot));
        Ok(Box::new(SimButton { slot }))
    }

    fn output(&mut self, pin: u8) -> Result<Box<dyn OutputLine>> {
        let mut state = self.lock();
        Self::claim(&mut state, pin)?;
        let level = Arc::new(AtomicBool::new(false));
        state.leds.insert(pin, Arc::clone(&level));
        Ok(Box::new(SimLed { pin, level }))
    }
}

pub struct SimButton {
    slot: Slot,
}

impl InputLine for SimButton {
    fn subscribe_rising_edge(&mut self, handler: Option<EdgeHandler>) {
        subscribe(&self.slot, handler);
    }
}

pub struct SimLed {
    pin: u8,
    level: Arc<AtomicBool>,
}

impl embedded_hal::digital::ErrorType for SimLed {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for SimLed {
    fn set_low(&mut self) -> core::result::Result<(), Infallible> {
        trace!("LED GPIO{} off", self.pin);
        self.level.store(false, Ordering::Release);
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Infallible> {
        trace!("LED GPIO{} on", self.pin);
        self.level.store(true, Ordering::Release);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Raspberry Pi backend
// ───────────────────────────────────────────────────────────────

#[cfg(feature = "rpi")]
pub use rpi::RpiGpio;

#[cfg(feature = "rpi")]
mod rpi {
    use std::sync::Arc;
    use std::time::Duration;

    use rppal::gpio::{Gpio, InputPin, Trigger};

    use super::{Slot, dispatch, subscribe};
    use crate::app::ports::{EdgeHandler, InputLine, LineFactory, OutputLine};
    use crate::config::ControllerConfig;
    use crate::error::{Error, Result};

    fn gpio_err(pin: u8, e: &rppal::gpio::Error) -> Error {
        Error::Gpio {
            pin,
            reason: e.to_string(),
        }
    }

    /// Real GPIO through `/dev/gpiomem`.
    pub struct RpiGpio {
        gpio: Gpio,
        pull_up: bool,
        bounce: Option<Duration>,
    }

    impl RpiGpio {
        pub fn open(config: &ControllerConfig) -> Result<Self> {
            let gpio = Gpio::new().map_err(|e| Error::Init(format!("GPIO unavailable: {e}")))?;
            Ok(Self {
                gpio,
                pull_up: config.button_pull_up,
                bounce: config.button_bounce(),
            })
        }
    }

    impl LineFactory for RpiGpio {
        fn input(&mut self, pin: u8) -> Result<Box<dyn InputLine>> {
            let raw = self.gpio.get(pin).map_err(|e| gpio_err(pin, &e))?;
            // With a pull-up the button shorts the line to ground: a press is
            // the falling edge.
            let (mut line, trigger) = if self.pull_up {
                (raw.into_input_pullup(), Trigger::FallingEdge)
            } else {
                (raw.into_input_pulldown(), Trigger::RisingEdge)
            };

            let slot = Slot::default();
            let target = Arc::clone(&slot);
            line.set_async_interrupt(trigger, self.bounce, move |_event| {
                dispatch(&target);
            })
            .map_err(|e| gpio_err(pin, &e))?;

            Ok(Box::new(RpiButton { _line: line, slot }))
        }

        fn output(&mut self, pin: u8) -> Result<Box<dyn OutputLine>> {
            let line = self
                .gpio
                .get(pin)
                .map_err(|e| gpio_err(pin, &e))?
                .into_output_low();
            Ok(Box::new(line))
        }
    }

    struct RpiButton {
        /// Owns the pin and its interrupt thread.
        _line: InputPin,
        slot: Slot,
    }

    impl InputLine for RpiButton {
        fn subscribe_rising_edge(&mut self, handler: Option<EdgeHandler>) {
            subscribe(&self.slot, handler);
        }
    }
}
