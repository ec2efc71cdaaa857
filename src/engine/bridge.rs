//! External engine subprocess
//!
//! The bridge owns the child process and a [`Session`] over its pipes.
//! There is no client-side turn deadline: a call blocks until the engine
//! answers or its stdout closes.

use std::io::{self, BufReader};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::protocol::EngineReply;
use super::session::{BridgeState, Session};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::rules::GameRule;

/// How long the engine may take to exit after `END` before it is killed
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct EngineBridge {
    /// `None` once shut down
    child: Option<Child>,
    session: Session<ChildStdin, BufReader<ChildStdout>>,
}

impl EngineBridge {
    /// Spawn the engine and send the time limits.
    ///
    /// The executable and the rule data file (when configured) must exist.
    /// The engine runs in the data file's directory so it finds its
    /// companion files.
    pub fn launch(config: &EngineConfig) -> Result<Self, EngineError> {
        let executable = resolve_file(&config.executable)
            .ok_or_else(|| EngineError::MissingExecutable(config.executable.clone()))?;

        let mut command = std::process::Command::new(&executable);
        if let Some(data) = &config.rule_config {
            let data = resolve_file(data).ok_or_else(|| EngineError::MissingDataFile(data.clone()))?;
            if let Some(dir) = data.parent() {
                command.current_dir(dir);
            }
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let mut child = command.spawn().map_err(EngineError::Spawn)?;
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(EngineError::Spawn(io::Error::other("engine pipes unavailable")));
        };
        info!(pid = child.id(), executable = %executable.display(), "engine launched");

        let mut bridge = Self {
            child: Some(child),
            session: Session::new(stdin, BufReader::new(stdout)),
        };
        if let Err(err) = bridge
            .session
            .handshake(config.turn_timeout_ms, config.match_timeout_ms)
        {
            bridge.shutdown();
            return Err(err);
        }
        Ok(bridge)
    }

    #[inline]
    pub fn state(&self) -> BridgeState {
        self.session.state()
    }

    /// Process id, while the process is owned
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Whether the process is still alive
    pub fn is_running(&mut self) -> bool {
        self.child
            .as_mut()
            .is_some_and(|child| matches!(child.try_wait(), Ok(None)))
    }

    /// Size the engine's board (and announce the rule); waits for `OK`
    pub fn start(&mut self, rows: usize, cols: usize, rule: GameRule) -> Result<(), EngineError> {
        let result = self.session.start(rows, cols, Some(rule));
        self.check_exit();
        result
    }

    pub fn begin(&mut self) -> Result<EngineReply, EngineError> {
        let result = self.session.begin();
        self.check_exit();
        result
    }

    /// Report the opponent's stone at column `x`, row `y`
    pub fn turn(&mut self, x: usize, y: usize) -> Result<EngineReply, EngineError> {
        let result = self.session.turn(x, y);
        self.check_exit();
        result
    }

    pub fn sync_board(&mut self, stones: Vec<(usize, usize, u8)>) -> Result<EngineReply, EngineError> {
        let result = self.session.sync_board(stones);
        self.check_exit();
        result
    }

    /// Log the exit status once the session has failed
    fn check_exit(&mut self) {
        if self.session.state() != BridgeState::Failed {
            return;
        }
        if let Some(child) = self.child.as_mut() {
            match child.try_wait() {
                Ok(Some(status)) => warn!(pid = child.id(), %status, "engine process exited"),
                Ok(None) => warn!(pid = child.id(), "engine session failed, process still running"),
                Err(err) => debug!(%err, "cannot query engine process"),
            }
        }
    }

    /// Stop the engine: `END`, a short grace period, then kill.
    ///
    /// Never fails and may be called any number of times. Returns whether
    /// this call stopped a process.
    pub fn shutdown(&mut self) -> bool {
        let Some(mut child) = self.child.take() else {
            return false;
        };
        let pid = child.id();

        if let Err(err) = self.session.end() {
            debug!(pid, %err, "END not delivered");
        }

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    info!(pid, %status, "engine stopped");
                    return true;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(EXIT_POLL_INTERVAL),
                Ok(None) => break,
                Err(err) => {
                    debug!(pid, %err, "cannot poll engine exit");
                    break;
                }
            }
        }

        if let Err(err) = child.kill() {
            debug!(pid, %err, "kill failed");
        }
        if let Err(err) = child.wait() {
            debug!(pid, %err, "wait after kill failed");
        }
        info!(pid, "engine killed after grace period");
        true
    }
}

impl Drop for EngineBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Absolute path of an existing regular file
fn resolve_file(path: &Path) -> Option<std::path::PathBuf> {
    if path.as_os_str().is_empty() || !path.is_file() {
        return None;
    }
    path.canonicalize().ok()
}
