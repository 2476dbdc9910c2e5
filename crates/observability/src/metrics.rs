//! Prometheus-kompatible Metriken fuer Videotalker
//!
//! Registrierte Metriken:
//! - `videotalker_connected_clients` – Gauge: Offene Signaling-Verbindungen
//! - `videotalker_registered_peers` – Gauge: Eintraege in der Peer-Registry
//! - `videotalker_group_call_rooms` – Gauge: Existierende Gruppen-Raeume
//! - `videotalker_events_relayed_total` – Counter: Zugestellte Events (event)
//! - `videotalker_events_dropped_total` – Counter: Verworfene Events (reason)
//! - `videotalker_http_requests_total` – Counter: HTTP-Anfragen (method, path, status)
//! - `videotalker_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit
//!
//! Unter Linux kommen die Standard-Prozessmetriken (`process_*`) hinzu.

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Alle Videotalker-Prometheus-Metriken
#[derive(Clone)]
pub struct VideotalkerMetrics {
    pub registry: Arc<Registry>,

    // Signaling-Metriken
    pub connected_clients: IntGauge,
    pub registered_peers: IntGauge,
    pub group_call_rooms: IntGauge,
    pub events_relayed_total: IntCounterVec,
    pub events_dropped_total: IntCounterVec,

    // HTTP-Metriken
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

impl VideotalkerMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        // --- Signaling-Metriken ---
        let connected_clients = IntGauge::with_opts(Opts::new(
            "videotalker_connected_clients",
            "Anzahl offener Signaling-Verbindungen",
        ))?;
        registry.register(Box::new(connected_clients.clone()))?;

        let registered_peers = IntGauge::with_opts(Opts::new(
            "videotalker_registered_peers",
            "Anzahl registrierter Peers",
        ))?;
        registry.register(Box::new(registered_peers.clone()))?;

        let group_call_rooms = IntGauge::with_opts(Opts::new(
            "videotalker_group_call_rooms",
            "Anzahl existierender Gruppen-Raeume",
        ))?;
        registry.register(Box::new(group_call_rooms.clone()))?;

        let events_relayed_total = IntCounterVec::new(
            Opts::new(
                "videotalker_events_relayed_total",
                "Gesamtanzahl verarbeiteter Client-Events",
            ),
            &["event"],
        )?;
        registry.register(Box::new(events_relayed_total.clone()))?;

        let events_dropped_total = IntCounterVec::new(
            Opts::new(
                "videotalker_events_dropped_total",
                "Gesamtanzahl verworfener Client-Events",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(events_dropped_total.clone()))?;

        // --- HTTP-Metriken ---
        let http_requests_total = IntCounterVec::new(
            Opts::new(
                "videotalker_http_requests_total",
                "Gesamtanzahl HTTP-Anfragen",
            ),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "videotalker_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry: Arc::new(registry),
            connected_clients,
            registered_peers,
            group_call_rooms,
            events_relayed_total,
            events_dropped_total,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// Zaehlt ein verarbeitetes Client-Event
    pub fn event_weitergeleitet(&self, event: &str) {
        self.events_relayed_total.with_label_values(&[event]).inc();
    }

    /// Zaehlt ein verworfenes Client-Event
    pub fn event_verworfen(&self, grund: &str) {
        self.events_dropped_total.with_label_values(&[grund]).inc();
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: VideotalkerMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<VideotalkerMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
