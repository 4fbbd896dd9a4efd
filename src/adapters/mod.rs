//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements    | Connects to                   |
//! |----------------|---------------|-------------------------------|
//! | `gpio`         | LineFactory   | rppal GPIO / in-memory lines  |
//! |                | InputLine     |                               |
//! |                | OutputLine    |                               |
//! | `history`      | TriggerSink   | JSON-lines history file       |
//! | `log_sink`     | TriggerSink   | Process log                   |
//! | `sound_folder` | SoundMap      | Sound file folder             |
//!
//! `platform` is a plain helper for host detection.

pub mod gpio;
pub mod history;
pub mod log_sink;
pub mod platform;
pub mod sound_folder;
