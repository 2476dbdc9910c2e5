//! Gemeinsamer Server-Zustand fuer den Signaling-Service
//!
//! Haelt Registry, Transport und Metriken als geteilten Zustand, der sicher
//! zwischen tokio-Tasks geteilt werden kann.
//!
//! ## Concurrency-Modell
//! Die Registry liegt hinter genau einem `parking_lot::Mutex`. Jeder Handler
//! haelt den Lock fuer Mutation *und* anschliessenden Snapshot-Fan-out; beides
//! blockiert nie (Fan-out ist `try_send`). Damit sind alle Registry-Mutationen
//! linearisierbar, auch auf dem Multi-Thread-Runtime.

use parking_lot::Mutex;
use std::sync::Arc;
use videotalker_observability::VideotalkerMetrics;

use crate::broadcast::{EventBroadcaster, SignalTransport};
use crate::registry::Registry;

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Keepalive-Intervall (WebSocket-Ping) in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer Verbindungen ohne empfangene Frames in Sekunden
    pub verbindungs_timeout_sek: u64,
    /// Maximale gleichzeitige Verbindungen
    pub max_verbindungen: usize,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
            max_verbindungen: 1024,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct SignalingState<T = EventBroadcaster> {
    /// Signaling-Konfiguration
    pub config: Arc<SignalingConfig>,
    /// Aktive User und Gruppen-Raeume
    pub registry: Mutex<Registry>,
    /// Event-Kanal (Send-Queues und Raum-Gruppen)
    pub transport: T,
    /// Prometheus-Metriken
    pub metriken: VideotalkerMetrics,
}

impl<T: SignalTransport> SignalingState<T> {
    /// Erstellt einen neuen SignalingState mit leerer Registry
    pub fn neu(config: SignalingConfig, transport: T, metriken: VideotalkerMetrics) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            registry: Mutex::new(Registry::neu()),
            transport,
            metriken,
        })
    }

    /// Uebernimmt die Registry-Groessen in die Gauges
    pub fn registry_metriken_aktualisieren(&self, registry: &Registry) {
        self.metriken
            .registered_peers
            .set(registry.peer_anzahl() as i64);
        self.metriken
            .group_call_rooms
            .set(registry.raum_anzahl() as i64);
    }
}
