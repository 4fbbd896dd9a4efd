//! Named background threads.
//!
//! Every concurrent activity in the controller (blink loop, re-arm timers,
//! player output readers) is a plain OS thread with a descriptive name so it
//! shows up in `ps -L` and in panic messages.

use std::io;
use std::thread::JoinHandle;

/// Small stacks suffice: no activity recurses or buffers much.
const STACK_KB: usize = 64;

/// Spawn `f` on a named thread.
pub fn spawn_named<T, F>(name: String, f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    log::trace!("Spawning '{}' (stack={}KB)", name, STACK_KB);
    std::thread::Builder::new()
        .name(name)
        .stack_size(STACK_KB * 1024)
        .spawn(f)
}
