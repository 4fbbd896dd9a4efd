//! Player process executor.
//!
//! Runs `<player> <sound file> <args...>` directly (no shell), waits for it
//! and captures stdout/stderr in full.  Both pipes are drained on helper
//! threads so a chatty player can never fill a pipe and stall.
//!
//! Without a timeout the wait is unbounded: a hung player holds the trigger
//! gate for as long as it hangs.  With one, the player runs in its own
//! process group and the whole group is killed at the deadline, including
//! anything it forked that still holds the output pipes.

use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::app::ports::CommandRunner;
use crate::drivers::task::spawn_named;
use crate::error::CommandError;

/// Poll interval while waiting on a child with a deadline.
const WAIT_POLL: Duration = Duration::from_millis(20);

/// A fully resolved player invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl PlayCommand {
    /// `<player> <sound> <extra...>`
    pub fn new(player: impl Into<PathBuf>, sound: impl Into<PathBuf>, extra: &[String]) -> Self {
        let sound: PathBuf = sound.into();
        let mut args = Vec::with_capacity(extra.len() + 1);
        args.push(sound.into_os_string());
        args.extend(extra.iter().map(OsString::from));
        Self {
            program: player.into(),
            args,
        }
    }
}

impl core::fmt::Display for PlayCommand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Result of a player run that reached completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// [`CommandRunner`] backed by `std::process`.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, CommandError> {
        let Some(timeout) = self.timeout else {
            return child.wait().map_err(CommandError::Wait);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(CommandError::Wait)? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                warn!("Player pid {} exceeded {:?}, killing", child.id(), timeout);
                abandon(child);
                return Err(CommandError::Timeout { after: timeout });
            }
            std::thread::sleep(WAIT_POLL);
        }
    }

    /// Wait for the output readers.  With a timeout, anything still holding
    /// the pipes at the deadline (a backgrounded grandchild) is killed.
    fn settle(
        &self,
        child: &mut Child,
        started: Instant,
        readers: [&Reader; 2],
    ) -> Result<(), CommandError> {
        let Some(timeout) = self.timeout else {
            return Ok(());
        };
        let deadline = started + timeout;
        while !readers.iter().all(|r| r.as_ref().is_none_or(|h| h.is_finished())) {
            if Instant::now() >= deadline {
                warn!("Player pid {} left processes holding its output, killing", child.id());
                kill_group(child);
                return Err(CommandError::Timeout { after: timeout });
            }
            std::thread::sleep(WAIT_POLL);
        }
        Ok(())
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &PlayCommand) -> Result<CommandOutput, CommandError> {
        let started = Instant::now();
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group, so a timeout takes down whatever the player forks.
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut cmd, 0);
        let mut child = cmd.spawn().map_err(CommandError::Spawn)?;
        debug!("Spawned pid {}: {}", child.id(), command);

        let stdout = match drain(child.stdout.take(), "player-stdout") {
            Ok(r) => r,
            Err(e) => {
                abandon(&mut child);
                return Err(e);
            }
        };
        let stderr = match drain(child.stderr.take(), "player-stderr") {
            Ok(r) => r,
            Err(e) => {
                abandon(&mut child);
                let _ = collect(stdout);
                return Err(e);
            }
        };

        let status = self.wait(&mut child);
        let settled = match status {
            Ok(_) => self.settle(&mut child, started, [&stdout, &stderr]),
            Err(_) => Ok(()),
        };
        let stdout = collect(stdout)?;
        let stderr = collect(stderr)?;
        let status = status?;
        settled?;

        Ok(CommandOutput {
            exit_code: status.code(),
            stdout,
            stderr,
            elapsed: started.elapsed(),
        })
    }
}

/// Kill the child's whole process group and reap the child.
fn abandon(child: &mut Child) {
    kill_group(child);
    // Reap so no zombie is left behind.
    let _ = child.wait();
}

#[cfg(unix)]
fn kill_group(child: &mut Child) {
    match libc::pid_t::try_from(child.id()) {
        Ok(pgid) => {
            // SAFETY: kill(2) has no memory-safety preconditions; the group was
            // created for this child by `process_group(0)`.
            if unsafe { libc::kill(-pgid, libc::SIGKILL) } == 0 {
                return;
            }
            warn!(
                "kill of process group {} failed: {}",
                pgid,
                std::io::Error::last_os_error()
            );
        }
        Err(_) => warn!("pid {} out of range", child.id()),
    }
    if let Err(e) = child.kill() {
        warn!("kill failed: {}", e);
    }
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!("kill failed: {}", e);
    }
}

type Reader = Option<JoinHandle<std::io::Result<String>>>;

fn drain(pipe: Option<impl Read + Send + 'static>, name: &str) -> Result<Reader, CommandError> {
    let Some(mut pipe) = pipe else {
        return Ok(None);
    };
    let handle = spawn_named(name.to_owned(), move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    })
    .map_err(CommandError::Wait)?;
    Ok(Some(handle))
}

fn collect(reader: Reader) -> Result<String, CommandError> {
    match reader {
        None => Ok(String::new()),
        Some(handle) => match handle.join() {
            Ok(res) => res.map_err(CommandError::Wait),
            Err(_) => Err(CommandError::Wait(std::io::Error::other(
                "output reader panicked",
            ))),
        },
    }
}
