//! Health-Check-Endpunkt fuer Videotalker
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Status, Version, Uptime und Anzahl offener Verbindungen

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::VideotalkerMetrics;

/// Status des Health-Checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub connected_clients: i64,
}

/// Geteilter Zustand fuer den Health-Check-Handler
#[derive(Clone)]
pub struct HealthState {
    pub start_time: Arc<Instant>,
    pub metriken: VideotalkerMetrics,
    pub max_verbindungen: usize,
}

impl HealthState {
    pub fn neu(metriken: VideotalkerMetrics, max_verbindungen: usize) -> Self {
        Self {
            start_time: Arc::new(Instant::now()),
            metriken,
            max_verbindungen,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Degraded sobald das Verbindungslimit erreicht ist
    pub fn status(&self) -> HealthStatus {
        let verbunden = self.metriken.connected_clients.get().max(0) as usize;
        if verbunden >= self.max_verbindungen {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// `GET /health` – gibt den Serverstatus zurueck
async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let status = state.status();

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        connected_clients: state.metriken.connected_clients.get(),
    };

    // 200 auch bei degraded, der Prozess nimmt weiter Requests an
    (StatusCode::OK, Json(response))
}
