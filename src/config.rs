//! Controller configuration parameters.
//!
//! All tunable parameters for the pi3ctrl core.  Values come from the JSON
//! file named by `PI3CTRL_CONFIG`; every field is optional and falls back to
//! the defaults below.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "PI3CTRL_CONFIG";

/// Core controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Log at debug level instead of info
    pub debug: bool,

    // --- Buttons ---
    /// BCM input pins, one per channel
    pub button_pins: Vec<u8>,
    /// Enable the internal pull-up; a press then pulls the line low
    pub button_pull_up: bool,
    /// Optional driver-level edge debounce (milliseconds)
    pub button_bounce_ms: Option<u64>,

    // --- LEDs ---
    /// BCM output pins, paired positionally with `button_pins`
    pub led_pins: Vec<u8>,
    /// Blink on-phase (seconds)
    pub led_on_seconds: f64,
    /// Blink off-phase (seconds)
    pub led_off_seconds: f64,

    // --- Lockout ---
    /// Cool-down after a firing before buttons accept presses again (seconds)
    pub rearm_delay_seconds: f64,

    // --- Playback ---
    /// Folder holding `soundFile.<index>.<pin>`; `$VAR`/`${VAR}` are expanded
    pub soundfile_folder: String,
    /// Player executable
    pub soundfile_player: PathBuf,
    /// Extra arguments passed after the sound file path
    pub player_args: Vec<String>,
    /// Kill the player after this many seconds; `None` waits indefinitely
    pub command_timeout_seconds: Option<f64>,

    // --- History ---
    /// Append every trigger to this JSON-lines file
    pub history_file: Option<PathBuf>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debug: true,

            // Buttons
            button_pins: vec![17, 27, 22],
            button_pull_up: true,
            button_bounce_ms: None,

            // LEDs
            led_pins: vec![18, 23, 24],
            led_on_seconds: 0.5,
            led_off_seconds: 1.5,

            // Lockout
            rearm_delay_seconds: 0.3,

            // Playback
            soundfile_folder: "${HOME}/Pi3Ctrl".into(),
            soundfile_player: PathBuf::from("/usr/bin/aplay"),
            player_args: vec!["-v".into()],
            command_timeout_seconds: None,

            history_file: None,
        }
    }
}

impl ControllerConfig {
    /// Load from the file named by [`CONFIG_ENV_VAR`], or defaults when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(Path::new(&path)),
            None => {
                info!("{} not set, using default configuration", CONFIG_ENV_VAR);
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))?;
        config.validate()?;
        info!("Config loaded from {}", path.display());
        Ok(config)
    }

    /// Reject configurations the controller cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.button_pins.is_empty() {
            return Err(Error::Config("button_pins must not be empty".into()));
        }
        if self.button_pins.len() != self.led_pins.len() {
            return Err(Error::Config(format!(
                "button_pins ({}) and led_pins ({}) must have the same length",
                self.button_pins.len(),
                self.led_pins.len()
            )));
        }

        let mut seen = HashSet::new();
        for pin in self.button_pins.iter().chain(&self.led_pins) {
            if !seen.insert(*pin) {
                return Err(Error::Config(format!("pin {pin} is assigned more than once")));
            }
        }

        if !is_positive(self.led_on_seconds) {
            return Err(Error::Config("led_on_seconds must be > 0".into()));
        }
        if !is_positive(self.led_off_seconds) {
            return Err(Error::Config("led_off_seconds must be > 0".into()));
        }
        if !(self.rearm_delay_seconds.is_finite() && self.rearm_delay_seconds >= 0.0) {
            return Err(Error::Config("rearm_delay_seconds must be >= 0".into()));
        }
        if let Some(t) = self.command_timeout_seconds {
            if !is_positive(t) {
                return Err(Error::Config("command_timeout_seconds must be > 0".into()));
            }
        }
        if self.soundfile_player.as_os_str().is_empty() {
            return Err(Error::Config("soundfile_player must not be empty".into()));
        }
        Ok(())
    }

    pub fn led_on(&self) -> Duration {
        Duration::from_secs_f64(self.led_on_seconds)
    }

    pub fn led_off(&self) -> Duration {
        Duration::from_secs_f64(self.led_off_seconds)
    }

    pub fn rearm_delay(&self) -> Duration {
        Duration::from_secs_f64(self.rearm_delay_seconds)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_seconds.map(Duration::from_secs_f64)
    }

    pub fn button_bounce(&self) -> Option<Duration> {
        self.button_bounce_ms.map(Duration::from_millis)
    }

    /// Sound folder with environment variables expanded.
    pub fn soundfile_folder(&self) -> PathBuf {
        PathBuf::from(expand_vars(&self.soundfile_folder, |name| {
            std::env::var(name).ok()
        }))
    }
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Expand `$NAME` and `${NAME}` using `lookup`.  Unknown variables and
/// malformed references are kept verbatim.
pub fn expand_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        match (!name.is_empty()).then(|| lookup(name)).flatten() {
            Some(value) => {
                out.push_str(&value);
                rest = &after[consumed..];
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
