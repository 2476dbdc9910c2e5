//! WebSocket-Endpunkt fuer den Signaling-Kanal
//!
//! `GET /signaling` – Upgrade auf WebSocket, danach laeuft pro Verbindung
//! ein eigener `ClientConnection`-Task.
//!
//! Das Verbindungslimit ist ein Semaphore: der Permit wird vor dem Upgrade
//! reserviert und lebt so lange wie der Verbindungs-Task.

use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};

use crate::broadcast::EventBroadcaster;
use crate::connection::ClientConnection;
use crate::server_state::SignalingState;

/// Freie Plaetze fuer gleichzeitige Verbindungen
#[derive(Clone, Debug)]
pub struct VerbindungsLimit {
    max: usize,
    plaetze: Arc<Semaphore>,
}

impl VerbindungsLimit {
    pub fn neu(max: usize) -> Self {
        let max = max.min(Semaphore::MAX_PERMITS);
        Self {
            max,
            plaetze: Arc::new(Semaphore::new(max)),
        }
    }

    /// Reserviert einen Platz, `None` wenn das Limit erreicht ist
    pub fn reservieren(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.plaetze).try_acquire_owned().ok()
    }

    /// Anzahl aktuell belegter Plaetze
    pub fn belegt(&self) -> usize {
        self.max - self.plaetze.available_permits()
    }
}

#[derive(Clone)]
struct WsState {
    signaling: Arc<SignalingState<EventBroadcaster>>,
    limit: VerbindungsLimit,
    shutdown_rx: watch::Receiver<bool>,
}

/// Router mit dem Signaling-Endpunkt
///
/// Der Server muss mit `into_make_service_with_connect_info::<SocketAddr>()`
/// gestartet werden, sonst fehlt die Peer-Adresse.
pub fn signaling_router(
    signaling: Arc<SignalingState<EventBroadcaster>>,
    shutdown_rx: watch::Receiver<bool>,
) -> Router {
    Router::new()
        .route("/signaling", get(ws_handler))
        .with_state(WsState {
            limit: VerbindungsLimit::neu(signaling.config.max_verbindungen),
            signaling,
            shutdown_rx,
        })
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    State(state): State<WsState>,
) -> Response {
    let Some(platz) = state.limit.reservieren() else {
        tracing::warn!(
            peer = %peer_addr,
            belegt = state.limit.belegt(),
            max = state.signaling.config.max_verbindungen,
            "Verbindungslimit erreicht – Upgrade abgelehnt"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Verbindungslimit erreicht").into_response();
    };

    let WsState {
        signaling,
        shutdown_rx,
        ..
    } = state;
    ws.on_upgrade(move |socket| async move {
        ClientConnection::neu(signaling, peer_addr)
            .verarbeiten(socket, shutdown_rx)
            .await;
        drop(platz);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_vergibt_hoechstens_max_plaetze() {
        let limit = VerbindungsLimit::neu(2);

        let a = limit.reservieren().expect("erster Platz");
        let _b = limit.reservieren().expect("zweiter Platz");
        assert!(limit.reservieren().is_none());
        assert_eq!(limit.belegt(), 2);

        drop(a);
        assert_eq!(limit.belegt(), 1);
        assert!(limit.reservieren().is_some());
    }

    #[test]
    fn klone_teilen_die_plaetze() {
        let limit = VerbindungsLimit::neu(1);
        let kopie = limit.clone();

        let _platz = limit.reservieren().expect("Platz");
        assert!(kopie.reservieren().is_none());
    }

    #[test]
    fn limit_null_lehnt_alles_ab() {
        assert!(VerbindungsLimit::neu(0).reservieren().is_none());
    }
}
