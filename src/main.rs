//! lighthouse-launcher: supervise a Lighthouse validator client behind a
//! consensus readiness gate.

use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::error;

use lighthouse_launcher::readiness::{self, WatchTarget};
use lighthouse_launcher::{logging, rest_api, LauncherState};

#[derive(Parser)]
#[command(name = "lighthouse-launcher")]
#[command(about = "Launches Lighthouse in validator mode once the consensus client is ready")]
#[command(version)]
struct Cli {
    /// Address to listen on for the HTTP server
    #[arg(long, default_value = "0.0.0.0")]
    address: String,

    /// Port for the HTTP server
    #[arg(long, default_value_t = 5000)]
    port: u16,

    /// Name of the pod to watch for readiness (overrides --service)
    #[arg(long)]
    pod: Option<String>,

    /// Name of the service whose endpoints are watched when --pod is not set
    #[arg(long)]
    service: Option<String>,

    /// Namespace of the watched pod/service; auto-detected when empty
    #[arg(long)]
    namespace: Option<String>,

    /// Log level (debug, info, warn, error)
    #[arg(long)]
    loglevel: Option<String>,

    /// Seconds to wait for consensus readiness; 0 waits forever
    #[arg(long, default_value_t = 600)]
    timeout: u64,

    /// Arguments forwarded verbatim to the validator binary
    #[arg(last = true)]
    lighthouse_args: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.loglevel.as_deref());

    let state = Arc::new(LauncherState::new(cli.lighthouse_args));

    let target = WatchTarget::from_flags(cli.pod, cli.service);
    let timeout = Duration::from_secs(cli.timeout);
    let watcher_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) =
            readiness::wait_for_consensus(target, cli.namespace, timeout, &watcher_state.readiness)
                .await
        {
            error!("Consensus client not ready: {}", e);
        }
    });

    if let Err(e) = rest_api::run_server(state, &cli.address, cli.port).await {
        error!("HTTP server error: {}", e);
        process::exit(2);
    }
}
