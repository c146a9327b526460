//! HTTP front ends: the co-counsel chat and the risk simulator.

pub mod chat;
pub mod simulator;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::chat::CoCounsel;
use crate::chat::store::ChatStore;

pub struct AppState {
    pub co_counsel: CoCounsel,
    pub chats: ChatStore,
    /// Messages kept per session after each exchange.
    pub history_limit: usize,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Chat
        .route("/", get(chat::index))
        .route("/api/chat", post(chat::send))
        .route("/api/clear", post(chat::clear))
        .route("/api/export", get(chat::export))
        // Simulator
        .route("/simulator", get(simulator::index))
        .route("/simulate", post(simulator::simulate))
        // Health
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn internal(e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    tracing::error!("internal error: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}
