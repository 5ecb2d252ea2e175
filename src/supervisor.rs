//! Validator child process supervision
//!
//! Spawns the Lighthouse binary with the computed argument vector and
//! decides between `running`, `stopped` and `errored` using an early-exit
//! observation window: a child that dies inside the window surfaces the
//! failure synchronously to the caller, one that survives it is reported
//! `running` and observed in the background until it eventually exits.
//! There is no restart, no backoff and no signal forwarding; the child's
//! lifetime ends with the process.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::flags;
use crate::logging;
use crate::state::{StatusCell, ValidatorStatus};

/// Binary invoked in validator mode, resolved via PATH.
pub const LIGHTHOUSE_BIN: &str = "lighthouse";

/// How long a child must survive before it counts as running.
const LAUNCH_WINDOW: Duration = Duration::from_secs(10);

const SLASHING_PROTECTION_DB: &str = "slashing_protection.sqlite";
const INIT_SLASHING_PROTECTION: &str = "--init-slashing-protection";

/// Single-writer supervisor for the validator child.
///
/// At most one child exists at a time: a launch is refused while a
/// previous child is running or still inside its observation window.
pub struct Supervisor {
    program: String,
    window: Duration,
    status: Arc<StatusCell>,
    launch_lock: Mutex<()>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::with_program(LIGHTHOUSE_BIN, LAUNCH_WINDOW)
    }

    /// Supervisor for an arbitrary binary and observation window.
    pub fn with_program(program: impl Into<String>, window: Duration) -> Self {
        Self {
            program: program.into(),
            window,
            status: Arc::new(StatusCell::default()),
            launch_lock: Mutex::new(()),
        }
    }

    /// Current observed status of the validator child.
    pub fn status(&self) -> ValidatorStatus {
        self.status.get()
    }

    /// Launch the validator child with `args`.
    ///
    /// Returns once the child has either exited inside the observation
    /// window (clean exit is Ok, failing exit is [`Error::ChildExited`])
    /// or survived it, in which case status is `running` and observation
    /// continues in the background.
    pub async fn launch(&self, datadir: &Path, mut args: Vec<String>) -> Result<()> {
        if self.status.get() == ValidatorStatus::Running {
            return Err(Error::AlreadyRunning);
        }
        let Ok(_guard) = self.launch_lock.try_lock() else {
            return Err(Error::AlreadyRunning);
        };

        // First boot only: a slashing-protection database must be
        // initialized exactly once. Re-initializing an existing one would
        // discard signing history.
        let slashing_db = datadir.join("validators").join(SLASHING_PROTECTION_DB);
        let db_missing = matches!(
            tokio::fs::metadata(&slashing_db).await,
            Err(ref e) if e.kind() == std::io::ErrorKind::NotFound
        );
        if db_missing && !flags::flag_present(&args, INIT_SLASHING_PROTECTION) {
            args.push(INIT_SLASHING_PROTECTION.to_string());
        }

        info!("Starting {} validator with args {:?}", self.program, args);
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Validator mode reads no password; close stdin right away so the
        // child cannot block on it.
        drop(child.stdin.take());

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(drain_lines(BufReader::new(stdout), "stdout", |line| {
                logging::validator_output(line)
            }));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_lines(BufReader::new(stderr), "stderr", |line| {
                info!("{}", line)
            }));
        }

        let (exit_tx, mut exit_rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = exit_tx.send(child.wait().await);
        });

        tokio::select! {
            exit = &mut exit_rx => self.record_early_exit(exit),
            _ = tokio::time::sleep(self.window) => {
                info!(
                    "Validator appears to have launched successfully (no exit in {:?})",
                    self.window
                );
                self.status.set(ValidatorStatus::Running);
                let status = Arc::clone(&self.status);
                tokio::spawn(observe_exit(exit_rx, status));
                Ok(())
            }
        }
    }

    fn record_early_exit(
        &self,
        exit: std::result::Result<std::io::Result<ExitStatus>, oneshot::error::RecvError>,
    ) -> Result<()> {
        match exit {
            Ok(Ok(status)) if status.success() => {
                self.status.set(ValidatorStatus::Stopped);
                Ok(())
            }
            Ok(Ok(status)) => {
                self.status.set(ValidatorStatus::Errored);
                Err(Error::ChildExited(status.to_string()))
            }
            Ok(Err(e)) => {
                self.status.set(ValidatorStatus::Errored);
                Err(Error::ChildExited(e.to_string()))
            }
            Err(_) => {
                self.status.set(ValidatorStatus::Errored);
                Err(Error::ChildExited("exit channel closed".to_string()))
            }
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

/// Follow a long-running child to its eventual exit and publish the final
/// status transition.
async fn observe_exit(
    exit_rx: oneshot::Receiver<std::io::Result<ExitStatus>>,
    status: Arc<StatusCell>,
) {
    match exit_rx.await {
        Ok(Ok(exit)) if exit.success() => {
            info!("Validator process eventually exited");
            status.set(ValidatorStatus::Stopped);
        }
        Ok(Ok(exit)) => {
            error!("Validator eventually exited with error: {}", exit);
            status.set(ValidatorStatus::Errored);
        }
        Ok(Err(e)) => {
            error!("Error waiting for validator: {}", e);
            status.set(ValidatorStatus::Errored);
        }
        Err(_) => {}
    }
}

/// Forward lines from one child pipe until it closes. Read errors end the
/// drainer, not the child.
async fn drain_lines<R>(reader: R, pipe: &'static str, forward: impl Fn(&str))
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => forward(&line),
            Ok(None) => break,
            Err(e) => {
                error!("Error reading validator {}: {}", pipe, e);
                break;
            }
        }
    }
}
