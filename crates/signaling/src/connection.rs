//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Der Task liest Text-Frames, dispatcht sie und schreibt
//! ausgehende Events aus der Send-Queue des EventBroadcasters zurueck.
//!
//! ## Ablauf
//! ```text
//! Upgrade -> ConnectionId vergeben -> `connection`-Event senden
//!         -> Event-Loop (Frames, Queue, Keepalive, Shutdown)
//!         -> Bereinigung (genau einmal)
//! ```
//!
//! ## Keepalive
//! - Server sendet alle `keepalive_sek` einen WebSocket-Ping
//! - Kommt innerhalb von `verbindungs_timeout_sek` kein Frame, wird getrennt

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use videotalker_core::types::ConnectionId;
use videotalker_protocol::ServerEvent;

use crate::broadcast::EventBroadcaster;
use crate::dispatcher::MessageDispatcher;
use crate::server_state::SignalingState;
use crate::session::Sitzung;

/// Verarbeitet eine einzelne WebSocket-Verbindung
pub struct ClientConnection {
    state: Arc<SignalingState<EventBroadcaster>>,
    peer_addr: SocketAddr,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<SignalingState<EventBroadcaster>>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis der Client trennt, der Keepalive-Timeout greift oder ein
    /// Shutdown-Signal eingeht. Die Bereinigung passiert in jedem Fall.
    pub async fn verarbeiten(
        self,
        socket: WebSocket,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let peer_addr = self.peer_addr;
        let keepalive_intervall = Duration::from_secs(self.state.config.keepalive_sek.max(1));
        let timeout_dauer = Duration::from_secs(self.state.config.verbindungs_timeout_sek);

        let connection_id = ConnectionId::new();
        let mut sitzung = Sitzung::neu(connection_id);
        let mut sende_rx = self.state.transport.client_registrieren(connection_id);
        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.state));
        self.state.metriken.connected_clients.inc();

        tracing::info!(peer = %peer_addr, connection_id = %connection_id, "Neue Verbindung");

        let (mut sender, mut receiver) = socket.split();

        // Der Client erfaehrt seine eigene Kennung als erstes Event
        if let Err(e) = senden(&mut sender, &ServerEvent::Connection { connection_id }).await {
            tracing::warn!(peer = %peer_addr, fehler = %e, "Begruessung fehlgeschlagen");
        } else {
            let mut letzter_empfang = Instant::now();
            let mut keepalive =
                tokio::time::interval_at(Instant::now() + keepalive_intervall, keepalive_intervall);

            loop {
                tokio::select! {
                    // Eingehender Frame vom Client
                    frame = receiver.next() => {
                        match frame {
                            Some(Ok(Message::Text(text))) => {
                                letzter_empfang = Instant::now();
                                dispatcher.dispatch_text(&text, &sitzung);
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                tracing::info!(peer = %peer_addr, "Verbindung vom Client getrennt");
                                break;
                            }
                            Some(Ok(_)) => {
                                // Ping/Pong/Binary zaehlen nur als Lebenszeichen
                                letzter_empfang = Instant::now();
                            }
                            Some(Err(e)) => {
                                tracing::warn!(peer = %peer_addr, fehler = %e, "Frame-Lesefehler");
                                break;
                            }
                        }
                    }

                    // Ausgehendes Event aus der Send-Queue
                    ausgehend = sende_rx.recv() => {
                        let Some(ausgehend) = ausgehend else {
                            // Sender entfernt: Queue lief voll, Client wird getrennt
                            tracing::warn!(peer = %peer_addr, "Send-Queue geschlossen – Verbindung wird getrennt");
                            let _ = sender.send(Message::Close(None)).await;
                            break;
                        };
                        if let Err(e) = senden(&mut sender, &ausgehend).await {
                            tracing::warn!(peer = %peer_addr, fehler = %e, "Senden fehlgeschlagen");
                            break;
                        }
                    }

                    // Keepalive-Ping und Timeout-Pruefung
                    _ = keepalive.tick() => {
                        if letzter_empfang.elapsed() > timeout_dauer {
                            tracing::warn!(peer = %peer_addr, "Verbindungs-Timeout");
                            break;
                        }
                        if let Err(e) = sender.send(Message::Ping(Vec::new())).await {
                            tracing::warn!(peer = %peer_addr, fehler = %e, "Ping-Senden fehlgeschlagen");
                            break;
                        }
                    }

                    // Shutdown-Signal
                    Ok(()) = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!(peer = %peer_addr, "Shutdown-Signal – Verbindung wird getrennt");
                            let _ = sender.send(Message::Close(None)).await;
                            break;
                        }
                    }
                }
            }
        }

        // Cleanup beim Verbindungsende
        dispatcher.verbindung_getrennt(&mut sitzung);
        self.state.metriken.connected_clients.dec();

        tracing::info!(peer = %peer_addr, connection_id = %connection_id, "Verbindungs-Task beendet");
    }
}

/// Serialisiert ein Event und sendet es als Text-Frame
async fn senden<S>(sender: &mut S, event: &ServerEvent) -> crate::error::SignalingResult<()>
where
    S: futures_util::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = event.to_json()?;
    sender.send(Message::Text(json)).await?;
    Ok(())
}
