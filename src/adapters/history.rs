//! Trigger history file.
//!
//! One JSON object per line, appended as presses are accepted:
//!
//! ```text
//! {"button":1,"pin":27,"created":"2024-05-01T12:00:00.123Z"}
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::{debug, warn};

use crate::app::events::TriggerEvent;
use crate::app::ports::TriggerSink;
use crate::error::Result;

pub struct HistoryFileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl HistoryFileSink {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("History file {}", path.display());
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every well-formed record.  Malformed lines are skipped.
    pub fn read_all(path: &Path) -> Result<Vec<TriggerEvent>> {
        let reader = BufReader::new(File::open(path)?);
        let mut events = Vec::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(ev) => events.push(ev),
                Err(e) => warn!("{}:{}: skipping bad record: {}", path.display(), n + 1, e),
            }
        }
        Ok(events)
    }
}

impl TriggerSink for HistoryFileSink {
    fn on_trigger(&self, event: &TriggerEvent) -> Result<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}
