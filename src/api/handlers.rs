//! HTTP handlers for health and status endpoints.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Per-market view exposed on the status endpoint, updated by the worker
/// after every tick that changes something.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Market identifier.
    pub market_id: String,
    /// Market question.
    pub title: String,
    /// Worker lifecycle state ("unplaced", "resting", "closed").
    pub state: String,
    /// Resting price, if an order is live.
    pub price: Option<Decimal>,
    /// Rank at placement time.
    pub rank: Option<u32>,
    /// Resting order ID.
    pub order_id: Option<String>,
    /// Fills detected since start.
    pub fills: u64,
    /// Cancel-and-replace adjustments since start.
    pub adjustments: u64,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Flips true once workers are running.
    pub ready: Arc<AtomicBool>,
    /// Live per-market snapshots.
    pub markets: Arc<DashMap<String, MarketSnapshot>>,
    started_at: Instant,
}

impl AppState {
    /// Fresh state, not yet ready.
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            markets: Arc::new(DashMap::new()),
            started_at: Instant::now(),
        }
    }

    /// Mark the service ready to serve traffic.
    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// GET /health - liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /ready - readiness probe.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    if state.ready.load(Ordering::SeqCst) {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

/// GET /api/v1/status - uptime and per-market quoting state.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let mut markets: Vec<MarketSnapshot> = state.markets.iter().map(|e| e.value().clone()).collect();
    markets.sort_by(|a, b| a.market_id.cmp(&b.market_id));

    Json(json!({
        "status": if state.ready.load(Ordering::SeqCst) { "running" } else { "starting" },
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "markets": markets,
    }))
}
