use std::env;
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use irr_explorer::bgp::EmptyBgpSource;
use irr_explorer::config::Config;
use irr_explorer::http;
use irr_explorer::ripe::EmptyRipeSource;
use irr_explorer::worker::{wait_ready, WorkerRegistry};
use log::{error, info};

const DEFAULT_CONFIG_PATH: &str = "irr-explorer.yaml";
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";
const READY_TIMEOUT: Duration = Duration::from_secs(10);
const BGP_RELOAD_INTERVAL: Duration = Duration::from_secs(300);
const RIPE_RELOAD_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let config_path = env::var("IRR_EXPLORER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = match fs::read_to_string(&config_path) {
        Ok(contents) => match Config::from_yaml_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("failed to parse '{config_path}': {err}");
                return ExitCode::FAILURE;
            }
        },
        Err(err) => {
            info!("no config file at '{config_path}' ({err}), starting with no databases configured");
            Config::default()
        }
    };

    // The NRTM client, BGP RIB loader and RIPE snapshot loader are external
    // collaborators (see the design notes); this binary wires in sources
    // that produce nothing so the service starts up cleanly without them.
    // A deployment wiring a real feed supplies its own `BgpSnapshotSource`/
    // `RipeSnapshotSource` and feeds the NRTM senders this registry hands
    // back.
    let (registry, _nrtm_senders, ready_rxs) = WorkerRegistry::spawn(
        &config,
        Arc::new(EmptyBgpSource),
        Arc::new(EmptyRipeSource),
        BGP_RELOAD_INTERVAL,
        RIPE_RELOAD_INTERVAL,
    );
    let registry = Arc::new(registry);

    wait_ready(ready_rxs, READY_TIMEOUT).await;
    info!("all workers reported ready (or timed out waiting)");

    let listen_addr = env::var("IRR_EXPLORER_LISTEN").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {listen_addr}: {err}");
            return ExitCode::FAILURE;
        }
    };
    info!("irr-explorer listening on {listen_addr}");

    let app = http::router(registry);
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("server error: {err}");
        return ExitCode::FAILURE;
    }

    info!("irr-explorer shutting down");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                error!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
