//! Application core — the trigger state machine and its collaborators.
//!
//! This module contains the rules for turning button presses into sound:
//! gate, lockout, indicator lockstep and process lifecycle.  All interaction
//! with hardware and processes happens through **port traits** defined in
//! [`ports`], keeping this layer testable with fake lines.

pub mod channel;
pub mod events;
pub mod lifecycle;
pub mod lockout;
pub mod orchestrator;
pub mod ports;
