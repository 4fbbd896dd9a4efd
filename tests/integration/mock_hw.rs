//! Mock hardware and collaborators for integration tests.
//!
//! Every line change, trigger notification and player call is appended to a
//! shared [`Journal`] with its timestamp, so tests can assert on ordering and
//! timing without touching real GPIO.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use pi3ctrl::adapters::sound_folder::SoundFolder;
use pi3ctrl::app::channel::build_channels;
use pi3ctrl::app::events::{EdgeOutcome, TriggerEvent};
use pi3ctrl::app::orchestrator::Orchestrator;
use pi3ctrl::app::ports::{
    CommandRunner, EdgeHandler, InputLine, LineFactory, OutputLine, TriggerSink,
};
use pi3ctrl::config::ControllerConfig;
use pi3ctrl::drivers::executor::{CommandOutput, PlayCommand};
use pi3ctrl::error::{CommandError, Error};

pub const BUTTONS: [u8; 3] = [17, 27, 22];
pub const LEDS: [u8; 3] = [18, 23, 24];
pub const REARM: Duration = Duration::from_millis(300);
pub const BLINK: Duration = Duration::from_millis(40);

// ── Journal ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Subscribe { pin: u8, armed: bool },
    Led { pin: u8, on: bool },
    Trigger { index: usize, pin: u8 },
    CommandStart { program: String, args: Vec<String> },
    CommandEnd,
}

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<(Instant, Entry)>>>);

#[allow(dead_code)]
impl Journal {
    pub fn push(&self, entry: Entry) {
        self.0.lock().unwrap().push((Instant::now(), entry));
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.0.lock().unwrap().iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn timed(&self) -> Vec<(Instant, Entry)> {
        self.0.lock().unwrap().clone()
    }

    /// Index of the first entry matching `pred`.
    pub fn position(&self, pred: impl Fn(&Entry) -> bool) -> Option<usize> {
        self.entries().iter().position(pred)
    }

    /// Index of the last entry matching `pred`.
    pub fn rposition(&self, pred: impl Fn(&Entry) -> bool) -> Option<usize> {
        self.entries().iter().rposition(pred)
    }

    pub fn count(&self, pred: impl Fn(&Entry) -> bool) -> usize {
        self.entries().iter().filter(|e| pred(e)).count()
    }

    pub fn commands(&self) -> Vec<Vec<String>> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                Entry::CommandStart { args, .. } => Some(args),
                _ => None,
            })
            .collect()
    }
}

// ── GPIO ──────────────────────────────────────────────────────

type Slot = Arc<Mutex<Option<EdgeHandler>>>;

/// Line factory whose buttons can be pressed from the test.
#[derive(Clone, Default)]
pub struct MockGpio {
    journal: Journal,
    buttons: Arc<Mutex<HashMap<u8, Slot>>>,
    levels: Arc<Mutex<HashMap<u8, bool>>>,
}

#[allow(dead_code)]
impl MockGpio {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    /// Deliver a press edge on `pin`; `false` when the button is disarmed.
    pub fn press(&self, pin: u8) -> bool {
        let slot = self.buttons.lock().unwrap().get(&pin).cloned();
        let handler = match slot {
            Some(s) => s.lock().unwrap().clone(),
            None => None,
        };
        match handler {
            Some(h) => {
                h();
                true
            }
            None => false,
        }
    }

    pub fn level(&self, pin: u8) -> Option<bool> {
        self.levels.lock().unwrap().get(&pin).copied()
    }
}

impl LineFactory for MockGpio {
    fn input(&mut self, pin: u8) -> pi3ctrl::error::Result<Box<dyn InputLine>> {
        let slot = Slot::default();
        let previous = self.buttons.lock().unwrap().insert(pin, Arc::clone(&slot));
        if previous.is_some() {
            return Err(Error::Gpio {
                pin,
                reason: "busy".into(),
            });
        }
        Ok(Box::new(MockButton {
            pin,
            slot,
            journal: self.journal.clone(),
        }))
    }

    fn output(&mut self, pin: u8) -> pi3ctrl::error::Result<Box<dyn OutputLine>> {
        self.levels.lock().unwrap().insert(pin, false);
        Ok(Box::new(MockLed {
            pin,
            levels: Arc::clone(&self.levels),
            journal: self.journal.clone(),
        }))
    }
}

struct MockButton {
    pin: u8,
    slot: Slot,
    journal: Journal,
}

impl InputLine for MockButton {
    fn subscribe_rising_edge(&mut self, handler: Option<EdgeHandler>) {
        self.journal.push(Entry::Subscribe {
            pin: self.pin,
            armed: handler.is_some(),
        });
        *self.slot.lock().unwrap() = handler;
    }
}

struct MockLed {
    pin: u8,
    levels: Arc<Mutex<HashMap<u8, bool>>>,
    journal: Journal,
}

impl MockLed {
    fn set(&mut self, on: bool) {
        self.levels.lock().unwrap().insert(self.pin, on);
        self.journal.push(Entry::Led { pin: self.pin, on });
    }
}

impl embedded_hal::digital::ErrorType for MockLed {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for MockLed {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.set(true);
        Ok(())
    }
}

// ── Trigger sink ──────────────────────────────────────────────

pub struct RecordingSink {
    journal: Journal,
    fail: bool,
}

impl TriggerSink for RecordingSink {
    fn on_trigger(&self, event: &TriggerEvent) -> pi3ctrl::error::Result<()> {
        self.journal.push(Entry::Trigger {
            index: event.channel_index,
            pin: event.pin,
        });
        if self.fail {
            return Err(Error::Io(std::io::Error::other("history disk full")));
        }
        Ok(())
    }
}

// ── Player ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub enum Script {
    /// Run for `delay`, then exit with `code`.
    Exit { code: i32, delay: Duration },
    /// Executor failure after `delay`.
    Fail { delay: Duration },
    /// Panic inside the runner.
    Panic,
}

pub struct ScriptedRunner {
    script: Script,
    journal: Journal,
    started: Mutex<Sender<()>>,
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &PlayCommand) -> Result<CommandOutput, CommandError> {
        self.journal.push(Entry::CommandStart {
            program: command.program.display().to_string(),
            args: command
                .args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
        });
        let _ = self.started.lock().unwrap().send(());

        let result = match self.script {
            Script::Exit { code, delay } => {
                std::thread::sleep(delay);
                Ok(CommandOutput {
                    exit_code: Some(code),
                    stdout: String::new(),
                    stderr: if code == 0 { String::new() } else { "no such file".into() },
                    elapsed: delay,
                })
            }
            Script::Fail { delay } => {
                std::thread::sleep(delay);
                Err(CommandError::Spawn(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "player missing",
                )))
            }
            Script::Panic => panic!("player runner blew up"),
        };
        self.journal.push(Entry::CommandEnd);
        result
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// Three-channel controller wired to mocks.
pub struct Rig {
    pub orch: Arc<Orchestrator>,
    pub gpio: MockGpio,
    pub journal: Journal,
    started: Receiver<()>,
}

#[allow(dead_code)]
impl Rig {
    pub fn config() -> ControllerConfig {
        ControllerConfig {
            button_pins: BUTTONS.to_vec(),
            led_pins: LEDS.to_vec(),
            rearm_delay_seconds: REARM.as_secs_f64(),
            led_on_seconds: BLINK.as_secs_f64(),
            led_off_seconds: BLINK.as_secs_f64(),
            soundfile_player: "/usr/bin/aplay".into(),
            player_args: vec!["-v".into()],
            ..ControllerConfig::default()
        }
    }

    pub fn new(script: Script) -> Self {
        Self::build(script, false)
    }

    pub fn with_failing_sink(script: Script) -> Self {
        Self::build(script, true)
    }

    fn build(script: Script, sink_fails: bool) -> Self {
        let journal = Journal::default();
        let mut gpio = MockGpio::new(journal.clone());
        let config = Self::config();
        let channels = build_channels(&config.button_pins, &config.led_pins, &mut gpio).unwrap();
        let (tx, started) = mpsc::channel();

        let orch = Orchestrator::new(
            channels,
            &config,
            Box::new(ScriptedRunner {
                script,
                journal: journal.clone(),
                started: Mutex::new(tx),
            }),
            Box::new(RecordingSink {
                journal: journal.clone(),
                fail: sink_fails,
            }),
            Box::new(SoundFolder::new("/home/pi/Pi3Ctrl")),
        );
        orch.arm_all();
        orch.standby();

        Self {
            orch,
            gpio,
            journal,
            started,
        }
    }

    /// Press `pin` on a background thread, as an interrupt thread would.
    pub fn press_async(&self, pin: u8) -> JoinHandle<bool> {
        let gpio = self.gpio.clone();
        std::thread::spawn(move || gpio.press(pin))
    }

    /// Run a full edge on `index` on a background thread.
    pub fn edge_async(&self, index: usize) -> JoinHandle<EdgeOutcome> {
        let orch = Arc::clone(&self.orch);
        std::thread::spawn(move || orch.handle_edge(index))
    }

    /// Block until the player has been started.
    pub fn wait_player_started(&self) {
        self.started
            .recv_timeout(Duration::from_secs(2))
            .expect("player never started");
    }

    pub fn all_armed(&self) -> bool {
        self.orch.channels().iter().all(|c| c.is_armed())
    }

    pub fn none_armed(&self) -> bool {
        self.orch.channels().iter().all(|c| !c.is_armed())
    }

    /// Poll until every channel is armed; returns the time waited.
    pub fn wait_all_armed(&self, timeout: Duration) -> Option<Duration> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if self.all_armed() {
                return Some(start.elapsed());
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        None
    }

    pub fn leds(&self) -> Vec<Option<bool>> {
        LEDS.iter().map(|&p| self.gpio.level(p)).collect()
    }
}

pub fn quick_exit(code: i32) -> Script {
    Script::Exit {
        code,
        delay: Duration::from_millis(20),
    }
}
