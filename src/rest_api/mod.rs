//! HTTP control plane for the launcher
//!
//! Keystore CRUD, launch, status and health probes, as thin adapters onto
//! the store, the flag parser and the supervisor.

mod dto;
mod handlers;
mod server;


pub use server::{build_router, run_server};
