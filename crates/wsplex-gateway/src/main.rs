//! wsPlex gateway
//!
//! - WebSocket endpoint: /v1/ws (streams `chat` and `echo` multiplexed)
//! - Ops: /healthz, /metrics
//! - Config: `WSPLEX_CONFIG` or ./wsplex.yaml

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use wsplex_core::error::{Result, WsPlexError};
use wsplex_gateway::{app_state, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = e.client_code().as_str(), "wsplex-gateway exited");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = config::path_from_env();
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg.gateway.listen.parse().map_err(|e| {
        WsPlexError::Configuration(format!("gateway.listen must be a valid SocketAddr: {e}"))
    })?;

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "wsplex-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| WsPlexError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| WsPlexError::Internal(format!("server failed: {e}")))
}
