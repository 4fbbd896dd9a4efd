//! Host detection.

use std::path::Path;

const MODEL_PATH: &str = "/proc/device-tree/model";

/// Whether the device tree reports a Raspberry Pi board.
pub fn is_raspberry_pi() -> bool {
    read_model(Path::new(MODEL_PATH)).is_some_and(|m| model_matches(&m))
}

/// Board model string, if the device tree exposes one.
pub fn read_model(path: &Path) -> Option<String> {
    let raw = std::fs::read(path).ok()?;
    let model = String::from_utf8_lossy(&raw);
    Some(model.trim_end_matches('\0').trim().to_owned())
}

/// The device tree string is NUL-terminated.
pub fn model_matches(model: &str) -> bool {
    model
        .trim_end_matches('\0')
        .to_ascii_lowercase()
        .contains("raspberry pi")
}
