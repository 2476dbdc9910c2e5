//! Event-Broadcaster – Transport-Seite des Event-Kanals
//!
//! Der EventBroadcaster verwaltet die Send-Queues aller verbundenen Clients
//! und die Raum-Gruppen. Der Kern spricht ihn nur ueber das Trait
//! [`SignalTransport`] an und fuehrt selbst keine Gruppen-Mitgliedschaft.
//!
//! ## Zustellung
//! - An eine Verbindung: `an_verbindung_senden`
//! - An eine Raum-Gruppe: `an_gruppe_senden`
//! - An alle Verbindungen: `an_alle_senden`
//!
//! Zustellung blockiert nie. Laeuft die Queue eines Empfaengers voll, wird
//! er aus dem Broadcaster verdraengt: sein Sender faellt weg, der
//! Verbindungs-Task sieht die geschlossene Queue und trennt. Der Client
//! verbindet neu und bekommt frische Snapshots, statt mit einer veralteten
//! Sicht weiterzulaufen.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use videotalker_core::types::{ConnectionId, RoomId};
use videotalker_protocol::ServerEvent;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Client
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// SignalTransport
// ---------------------------------------------------------------------------

/// Faehigkeiten die der Kern vom Event-Kanal benoetigt
pub trait SignalTransport: Send + Sync + 'static {
    /// Sendet an genau eine Verbindung. `false` wenn unbekannt oder verdraengt.
    fn an_verbindung_senden(&self, ziel: &ConnectionId, event: ServerEvent) -> bool;

    /// Sendet an alle Mitglieder einer Raum-Gruppe, gibt die Anzahl zurueck
    fn an_gruppe_senden(&self, raum_id: &RoomId, event: ServerEvent) -> usize;

    /// Sendet an alle verbundenen Clients, gibt die Anzahl zurueck
    fn an_alle_senden(&self, event: ServerEvent) -> usize;

    /// Nimmt eine Verbindung in eine Raum-Gruppe auf (idempotent)
    fn gruppe_beitreten(&self, connection_id: ConnectionId, raum_id: RoomId);

    /// Entfernt eine Verbindung aus einer Raum-Gruppe (idempotent)
    fn gruppe_verlassen(&self, connection_id: &ConnectionId, raum_id: &RoomId);

    /// Entfernt eine Verbindung aus dem Transport und allen Gruppen
    fn verbindung_entfernen(&self, connection_id: &ConnectionId);
}

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue eines verbundenen Clients
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub connection_id: ConnectionId,
    pub tx: mpsc::Sender<ServerEvent>,
}

/// Ergebnis eines nicht-blockierenden Sendeversuchs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zustellung {
    Zugestellt,
    /// Queue voll, der Empfaenger kommt nicht hinterher
    Voll,
    /// Queue geschlossen, der Verbindungs-Task laeuft nicht mehr
    Geschlossen,
}

impl ClientSender {
    /// Sendet ein Event nicht-blockierend an den Client
    pub fn senden(&self, event: ServerEvent) -> Zustellung {
        match self.tx.try_send(event) {
            Ok(()) => Zustellung::Zugestellt,
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(
                    connection_id = %self.connection_id,
                    event = event.name(),
                    "Send-Queue voll – Client wird verdraengt"
                );
                Zustellung::Voll
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    connection_id = %self.connection_id,
                    "Send-Queue geschlossen (Client getrennt)"
                );
                Zustellung::Geschlossen
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Event-Broadcaster fuer alle verbundenen Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<EventBroadcasterInner>,
}

struct EventBroadcasterInner {
    /// Client-Sender, indiziert nach ConnectionId
    clients: DashMap<ConnectionId, ClientSender>,
    /// Raum-Gruppen: raum_id -> Mitglieder in Beitrittsreihenfolge
    gruppen: DashMap<RoomId, Vec<ConnectionId>>,
}

impl EventBroadcaster {
    /// Erstellt einen neuen EventBroadcaster
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(EventBroadcasterInner {
                clients: DashMap::new(),
                gruppen: DashMap::new(),
            }),
        }
    }

    /// Registriert einen neuen Client und gibt seine Empfangs-Queue zurueck
    ///
    /// Die `ClientConnection` liest aus dieser Queue und schreibt in den Socket.
    pub fn client_registrieren(&self, connection_id: ConnectionId) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        let sender = ClientSender { connection_id, tx };
        self.inner.clients.insert(connection_id, sender);
        tracing::debug!(connection_id = %connection_id, "Client im Broadcaster registriert");
        rx
    }

    /// Gibt die Anzahl der registrierten Clients zurueck
    pub fn client_anzahl(&self) -> usize {
        self.inner.clients.len()
    }

    /// Prueft ob ein Client registriert ist
    pub fn ist_registriert(&self, connection_id: &ConnectionId) -> bool {
        self.inner.clients.contains_key(connection_id)
    }

    /// Gibt alle Verbindungen in einer Raum-Gruppe zurueck
    pub fn verbindungen_in_gruppe(&self, raum_id: &RoomId) -> Vec<ConnectionId> {
        self.inner
            .gruppen
            .get(raum_id)
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }

    /// Gibt die Anzahl der nicht-leeren Raum-Gruppen zurueck
    pub fn gruppen_anzahl(&self) -> usize {
        self.inner.gruppen.len()
    }

    /// Entfernt die Sender von Clients, deren Queue voll war
    ///
    /// Darf erst aufgerufen werden, wenn keine Referenz in `clients` mehr
    /// gehalten wird. Gruppen-Mitgliedschaften raeumt der Verbindungs-Task
    /// beim Trennen ab.
    fn verdraengen(&self, connection_ids: &[ConnectionId]) {
        for connection_id in connection_ids {
            if self.inner.clients.remove(connection_id).is_some() {
                tracing::info!(connection_id = %connection_id, "Langsamer Client verdraengt");
            }
        }
    }

    /// Sendet an eine Liste von Empfaengern und verdraengt volle Queues
    fn an_empfaenger_senden<'a>(
        &self,
        empfaenger: impl Iterator<Item = &'a ConnectionId>,
        event: &ServerEvent,
    ) -> usize {
        let mut gesendet = 0;
        let mut voll = Vec::new();
        for connection_id in empfaenger {
            let zustellung = match self.inner.clients.get(connection_id) {
                Some(sender) => sender.senden(event.clone()),
                None => continue,
            };
            match zustellung {
                Zustellung::Zugestellt => gesendet += 1,
                Zustellung::Voll => voll.push(*connection_id),
                Zustellung::Geschlossen => {}
            }
        }
        self.verdraengen(&voll);
        gesendet
    }
}

impl SignalTransport for EventBroadcaster {
    fn an_verbindung_senden(&self, ziel: &ConnectionId, event: ServerEvent) -> bool {
        let zustellung = match self.inner.clients.get(ziel) {
            Some(sender) => sender.senden(event),
            None => {
                tracing::debug!(
                    connection_id = %ziel,
                    event = event.name(),
                    "Senden an unbekannte Verbindung"
                );
                return false;
            }
        };
        match zustellung {
            Zustellung::Zugestellt => true,
            Zustellung::Voll => {
                self.verdraengen(&[*ziel]);
                false
            }
            Zustellung::Geschlossen => false,
        }
    }

    fn an_gruppe_senden(&self, raum_id: &RoomId, event: ServerEvent) -> usize {
        let mitglieder = match self.inner.gruppen.get(raum_id) {
            Some(ids) => ids.clone(),
            None => return 0,
        };
        self.an_empfaenger_senden(mitglieder.iter(), &event)
    }

    fn an_alle_senden(&self, event: ServerEvent) -> usize {
        let alle: Vec<ConnectionId> = self.inner.clients.iter().map(|e| *e.key()).collect();
        self.an_empfaenger_senden(alle.iter(), &event)
    }

    fn gruppe_beitreten(&self, connection_id: ConnectionId, raum_id: RoomId) {
        let mut mitglieder = self.inner.gruppen.entry(raum_id).or_default();
        if !mitglieder.contains(&connection_id) {
            mitglieder.push(connection_id);
        }
        tracing::debug!(connection_id = %connection_id, raum_id = %raum_id, "Raum-Gruppe beigetreten");
    }

    fn gruppe_verlassen(&self, connection_id: &ConnectionId, raum_id: &RoomId) {
        if let Some(mut mitglieder) = self.inner.gruppen.get_mut(raum_id) {
            mitglieder.retain(|id| id != connection_id);
            let ist_leer = mitglieder.is_empty();
            drop(mitglieder);
            if ist_leer {
                self.inner.gruppen.remove_if(raum_id, |_, ids| ids.is_empty());
            }
        }
    }

    fn verbindung_entfernen(&self, connection_id: &ConnectionId) {
        self.inner.clients.remove(connection_id);
        // Aus allen Gruppen entfernen
        self.inner.gruppen.iter_mut().for_each(|mut entry| {
            entry.value_mut().retain(|id| id != connection_id);
        });
        // Leere Gruppen aufraeumen
        self.inner.gruppen.retain(|_, mitglieder| !mitglieder.is_empty());
        tracing::debug!(connection_id = %connection_id, "Client aus Broadcaster entfernt");
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
