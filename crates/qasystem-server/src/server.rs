//! Router construction and the listener loop

use crate::routes;
use anyhow::{Context as _, Result};
use axum::routing::{get, post};
use axum::Router;
use qasystem_core::{Context, LocalGenerator};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<Context>,
    /// Answers `/llm_ask`, independent of the generator the pipeline uses
    pub local: Arc<LocalGenerator>,
}

impl AppState {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx: Arc::new(ctx),
            local: Arc::new(LocalGenerator::default()),
        }
    }

    pub fn with_local_generator(mut self, local: LocalGenerator) -> Self {
        self.local = Arc::new(local);
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/ask", post(routes::ask))
        .route("/llm_ask", post(routes::llm_ask))
        .with_state(state)
}

/// Serve on an already bound listener until ctrl-c
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("qasystem listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server shutdown")?;

    tracing::info!("qasystem stopped");
    Ok(())
}

/// Bind `bind` (host:port) and serve
pub async fn start_server(state: AppState, bind: &str) -> Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {bind}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    serve(listener, state).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
