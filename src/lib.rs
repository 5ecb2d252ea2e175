//! Supervisor for a Lighthouse validator client
//!
//! A long-running process co-located with the validator binary inside a
//! cluster-managed pod. It waits for the external consensus client to
//! become reachable by watching cluster objects, manages the on-disk tree
//! of EIP-2335 keystores, and spawns and observes the validator child on
//! request, all over a small HTTP control plane the scheduler polls.

pub mod error;
pub mod flags;
pub mod keystore;
pub mod logging;
pub mod readiness;
pub mod rest_api;
pub mod state;
pub mod supervisor;

use state::ReadinessFlag;
use supervisor::Supervisor;

/// Shared state for the HTTP handlers and the readiness watcher.
pub struct LauncherState {
    /// Monotonic consensus readiness flag
    pub readiness: ReadinessFlag,
    /// The single supervised validator child
    pub supervisor: Supervisor,
    /// Child argument vector captured at startup, after `--`; read-only
    /// from then on
    pub lighthouse_args: Vec<String>,
}

impl LauncherState {
    pub fn new(lighthouse_args: Vec<String>) -> Self {
        Self {
            readiness: ReadinessFlag::default(),
            supervisor: Supervisor::new(),
            lighthouse_args,
        }
    }
}
