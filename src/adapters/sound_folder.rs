//! Sound resource naming: `<folder>/soundFile.<channel>.<pin>`.
//!
//! The file is not checked for existence; a missing file surfaces as a
//! player failure.

use std::path::{Path, PathBuf};

use crate::app::ports::SoundMap;
use crate::config::ControllerConfig;

#[derive(Debug, Clone)]
pub struct SoundFolder {
    folder: PathBuf,
}

impl SoundFolder {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    /// Uses the configured folder with environment variables expanded.
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(config.soundfile_folder())
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }
}

impl SoundMap for SoundFolder {
    fn resolve(&self, channel_index: usize, pin: u8) -> PathBuf {
        self.folder.join(format!("soundFile.{channel_index}.{pin}"))
    }
}
