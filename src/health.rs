use crate::types::Result;
use axum::{routing::get, Router};
use tracing::info;

/// Minimal keep-alive responder on its own task; shares nothing with the
/// poll timer and cannot block it.
pub async fn serve(port: u16) -> Result<()> {
    let app = Router::new().route("/healthz", get(healthz));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;

    info!("Liveness endpoint listening on port {}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}
