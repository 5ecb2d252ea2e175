//! Process-wide launcher state
//!
//! Two cells cover everything the HTTP layer, the readiness watcher and
//! the supervisor need to share: a monotonic consensus readiness flag and
//! the observed validator process status. Both are plain atomics; their
//! lifetime is the process itself.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Consensus readiness flag gating `/readyz`.
///
/// Starts unset and flips to ready exactly once, when the watcher observes
/// the consensus client ready. It is never reset: once ready, always ready.
#[derive(Debug, Default)]
pub struct ReadinessFlag(AtomicBool);

impl ReadinessFlag {
    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Flip the flag. Returns true only for the caller that performed the
    /// 0 -> 1 transition.
    pub fn mark_ready(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Lifecycle of the supervised validator process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ValidatorStatus {
    Stopped = 0,
    Running = 1,
    Errored = 2,
}

impl ValidatorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidatorStatus::Stopped => "stopped",
            ValidatorStatus::Running => "running",
            ValidatorStatus::Errored => "errored",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ValidatorStatus::Running,
            2 => ValidatorStatus::Errored,
            _ => ValidatorStatus::Stopped,
        }
    }
}

/// Atomic cell holding the current [`ValidatorStatus`].
///
/// Written only by the supervisor; read by anyone. Initial value is
/// `stopped`.
#[derive(Debug, Default)]
pub struct StatusCell(AtomicU8);

impl StatusCell {
    pub fn get(&self) -> ValidatorStatus {
        ValidatorStatus::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, status: ValidatorStatus) {
        self.0.store(status as u8, Ordering::SeqCst);
    }
}
