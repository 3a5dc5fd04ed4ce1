//! Liveness endpoint for hosting platforms that probe an HTTP port.

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tokio::net::TcpListener;

pub fn router() -> Router {
    Router::new().route("/", get(|| async { "OK" }))
}

pub async fn serve(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "health check listening");
    axum::serve(listener, router()).await?;
    Ok(())
}
