//! pi3ctrl library.
//!
//! Button-triggered audio playback with LED status for the Raspberry Pi.
//! The trigger core in [`app`] is hardware-free; real GPIO lives behind the
//! `rpi` feature in [`adapters::gpio`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod logging;
