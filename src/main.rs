//! pi3ctrl — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  RpiGpio / SimGpio   ProcessRunner   HistoryFileSink         │
//! │  (LineFactory)       (CommandRunner) LogTriggerSink          │
//! │                                      (TriggerSink)           │
//! │  SoundFolder (SoundMap)                                      │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │            Orchestrator (trigger core)                 │  │
//! │  │  gate · lockout · indicator                            │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  Lifecycle (arm · standby · wait for SIGINT/SIGTERM)         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{Context, Result};
use log::{info, warn};

use pi3ctrl::adapters::history::HistoryFileSink;
use pi3ctrl::adapters::log_sink::LogTriggerSink;
use pi3ctrl::adapters::platform;
use pi3ctrl::adapters::sound_folder::SoundFolder;
use pi3ctrl::app::channel::{Channel, build_channels};
use pi3ctrl::app::lifecycle::Lifecycle;
use pi3ctrl::app::orchestrator::Orchestrator;
use pi3ctrl::app::ports::TriggerSink;
use pi3ctrl::config::ControllerConfig;
use pi3ctrl::drivers::executor::ProcessRunner;
use pi3ctrl::logging;

use std::sync::Arc;

fn main() -> Result<()> {
    // ── 1. Config + logging ───────────────────────────────────
    let config = ControllerConfig::from_env().context("loading configuration")?;
    logging::init(config.debug);

    info!("╔══════════════════════════════════════╗");
    info!("║  pi3ctrl v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    if !platform::is_raspberry_pi() {
        warn!("This does not look like a Raspberry Pi");
    }

    // ── 2. GPIO lines ─────────────────────────────────────────
    let channels = open_channels(&config)?;

    // ── 3. Adapters ───────────────────────────────────────────
    let runner = ProcessRunner::new(config.command_timeout());
    let sink: Box<dyn TriggerSink> = match &config.history_file {
        Some(path) => {
            let history = HistoryFileSink::open(path)
                .with_context(|| format!("opening history file {}", path.display()))?;
            info!("Recording trigger history in {}", history.path().display());
            Box::new(history)
        }
        None => Box::new(LogTriggerSink::new()),
    };
    let sounds = SoundFolder::from_config(&config);
    info!(
        "Player {} reading from {}",
        config.soundfile_player.display(),
        sounds.folder().display()
    );

    // ── 4. Core + run ─────────────────────────────────────────
    let orchestrator = Orchestrator::new(
        channels,
        &config,
        Box::new(runner),
        sink,
        Box::new(sounds),
    );
    let lifecycle = Lifecycle::start(orchestrator);
    lifecycle.run_forever().context("waiting for termination")?;
    Ok(())
}

#[cfg(feature = "rpi")]
fn open_channels(config: &ControllerConfig) -> Result<Vec<Arc<Channel>>> {
    use pi3ctrl::adapters::gpio::RpiGpio;

    let mut gpio = RpiGpio::open(config).context("opening GPIO")?;
    build_channels(&config.button_pins, &config.led_pins, &mut gpio).context("claiming GPIO lines")
}

/// Simulation backend: type a channel index and press Enter to press that
/// button.
#[cfg(not(feature = "rpi"))]
fn open_channels(config: &ControllerConfig) -> Result<Vec<Arc<Channel>>> {
    use std::io::BufRead;

    use pi3ctrl::adapters::gpio::SimGpio;
    use pi3ctrl::drivers::task::spawn_named;

    let mut gpio = SimGpio::new();
    let channels = build_channels(&config.button_pins, &config.led_pins, &mut gpio)
        .context("claiming simulated lines")?;

    warn!("Built without GPIO support: enter a button index (0..{}) to press it", channels.len());
    let pins = config.button_pins.clone();
    spawn_named("stdin-buttons".into(), move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let pin = line.trim().parse::<usize>().ok().and_then(|i| pins.get(i).copied());
            match pin {
                Some(pin) => {
                    if !gpio.press(pin) {
                        info!("Button GPIO{} is disarmed", pin);
                    }
                }
                None => warn!("No button {:?}", line.trim()),
            }
        }
    })
    .context("starting stdin reader")?;
    Ok(channels)
}
