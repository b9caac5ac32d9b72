mod config;
mod room;
mod signaling;

pub use config::*;
pub use room::*;
pub use signaling::*;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(service: SignalingService) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(service)
}

/// Runs the coordinator until the listener fails.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    serve_on(listener, SignalingService::new()).await
}

pub async fn serve_on(listener: TcpListener, service: SignalingService) -> std::io::Result<()> {
    info!("Signaling server listening on ws://{}/ws", listener.local_addr()?);
    axum::serve(listener, router(service)).await
}
