//! Scrape endpoint

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use nimbus_core::ExpositionAdapter;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub const METRICS_PATH: &str = "/metrics";

pub fn router(adapter: ExpositionAdapter) -> Router {
    Router::new()
        .route(METRICS_PATH, get(metrics))
        .with_state(Arc::new(adapter))
}

async fn metrics(State(adapter): State<Arc<ExpositionAdapter>>) -> Response {
    match adapter.render() {
        Ok(body) => ([(header::CONTENT_TYPE, adapter.content_type())], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to render scrape");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Serve until `cancel` fires, then drain in-flight scrapes
pub async fn serve(listen: &str, app: Router, cancel: CancellationToken) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    let addr: SocketAddr = listener.local_addr()?;
    info!(%addr, path = METRICS_PATH, "serving metrics");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("metrics server failed")
}
