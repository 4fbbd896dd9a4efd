//! Process-level drivers: LED indicator, player executor and thread helpers.

pub mod executor;
pub mod indicator;
pub mod task;
