//! One button + LED pair.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info};

use crate::error::{Error, Result};

use super::ports::{EdgeHandler, InputLine, LineFactory, OutputLine};

/// A button/LED pair identified by its position in the configured pin lists.
pub struct Channel {
    index: usize,
    input_pin: u8,
    output_pin: u8,
    input: Mutex<Box<dyn InputLine>>,
    output: Mutex<Box<dyn OutputLine>>,
    armed: AtomicBool,
}

impl Channel {
    /// A freshly built channel is disarmed; the lifecycle arms it.
    pub fn new(
        index: usize,
        input_pin: u8,
        output_pin: u8,
        input: Box<dyn InputLine>,
        output: Box<dyn OutputLine>,
    ) -> Self {
        Self {
            index,
            input_pin,
            output_pin,
            input: Mutex::new(input),
            output: Mutex::new(output),
            armed: AtomicBool::new(false),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// BCM pin of the button.
    pub fn pin(&self) -> u8 {
        self.input_pin
    }

    /// BCM pin of the LED.
    pub fn led_pin(&self) -> u8 {
        self.output_pin
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Install the press handler and mark the channel armed.
    pub fn arm(&self, handler: EdgeHandler) {
        lock(&self.input).subscribe_rising_edge(Some(handler));
        self.armed.store(true, Ordering::Release);
    }

    /// Remove the press handler; the button is ignored until re-armed.
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
        lock(&self.input).subscribe_rising_edge(None);
    }

    pub fn set_output(&self, on: bool) {
        lock(&self.output).set_level(on);
    }
}

impl core::fmt::Debug for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Channel")
            .field("index", &self.index)
            .field("input_pin", &self.input_pin)
            .field("output_pin", &self.output_pin)
            .field("armed", &self.is_armed())
            .finish_non_exhaustive()
    }
}

/// Lock a line, recovering from a poisoned mutex: a panic elsewhere must not
/// leave the hardware unreachable.
fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| {
        debug!("line mutex poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Pair the pin lists positionally and open every line.
pub fn build_channels(
    button_pins: &[u8],
    led_pins: &[u8],
    lines: &mut impl LineFactory,
) -> Result<Vec<Arc<Channel>>> {
    if button_pins.len() != led_pins.len() {
        return Err(Error::Config(format!(
            "{} button pins but {} LED pins",
            button_pins.len(),
            led_pins.len()
        )));
    }

    button_pins
        .iter()
        .zip(led_pins)
        .enumerate()
        .map(|(index, (&button, &led))| {
            let input = lines.input(button)?;
            let output = lines.output(led)?;
            info!("Channel {}: button GPIO{} -> LED GPIO{}", index, button, led);
            Ok(Arc::new(Channel::new(index, button, led, input, output)))
        })
        .collect()
}
