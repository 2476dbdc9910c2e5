//! Registry – Wer ist erreichbar, welche Gruppen-Raeume existieren
//!
//! Haelt die beiden einzigen geteilten, veraenderlichen Zustaende des Relays:
//! die aktiven User (ConnectionId -> Peer) und die Gruppen-Raeume
//! (Host-ConnectionId -> Room). Beide Listen behalten die Einfuegereihenfolge,
//! damit Snapshots stabil sind.
//!
//! Die Registry selbst ist nicht synchronisiert. `SignalingState` haelt sie
//! hinter genau einem Mutex, sodass Mutation und anschliessender Snapshot
//! linearisierbar sind.
//!
//! ## Invarianten
//! - Hoechstens ein Peer pro ConnectionId
//! - Hoechstens ein Room pro Host-ConnectionId
//! - RoomIds sind fuer die Prozess-Lebensdauer eindeutig

use videotalker_core::types::{ConnectionId, RoomId};
use videotalker_protocol::{Peer, Room};

/// In-Memory Registry fuer aktive User und Gruppen-Raeume
#[derive(Debug, Default)]
pub struct Registry {
    peers: Vec<Peer>,
    raeume: Vec<Room>,
}

impl Registry {
    /// Erstellt eine leere Registry
    pub fn neu() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Peers
    // -----------------------------------------------------------------------

    /// Registriert oder ersetzt den Peer einer Verbindung
    ///
    /// Doppelte Usernames sind erlaubt. Ein ersetzter Eintrag behaelt seine
    /// Position in der Liste.
    pub fn peer_registrieren(&mut self, connection_id: ConnectionId, username: String) {
        match self
            .peers
            .iter_mut()
            .find(|p| p.connection_id == connection_id)
        {
            Some(peer) => {
                tracing::debug!(connection_id = %connection_id, username = %username, "Peer ersetzt");
                peer.username = username;
            }
            None => {
                tracing::info!(connection_id = %connection_id, username = %username, "Peer registriert");
                self.peers.push(Peer {
                    username,
                    connection_id,
                });
            }
        }
    }

    /// Entfernt den Peer einer Verbindung (idempotent)
    ///
    /// Gibt `true` zurueck wenn ein Eintrag entfernt wurde.
    pub fn peer_entfernen(&mut self, connection_id: &ConnectionId) -> bool {
        let vorher = self.peers.len();
        self.peers.retain(|p| &p.connection_id != connection_id);
        let entfernt = self.peers.len() != vorher;
        if entfernt {
            tracing::info!(connection_id = %connection_id, "Peer entfernt");
        }
        entfernt
    }

    /// Alle aktiven Peers in Registrierungsreihenfolge
    pub fn alle_peers(&self) -> &[Peer] {
        &self.peers
    }

    /// Gibt den Peer einer Verbindung zurueck
    pub fn peer(&self, connection_id: &ConnectionId) -> Option<&Peer> {
        self.peers.iter().find(|p| &p.connection_id == connection_id)
    }

    /// Anzahl der aktiven Peers
    pub fn peer_anzahl(&self) -> usize {
        self.peers.len()
    }

    // -----------------------------------------------------------------------
    // Raeume
    // -----------------------------------------------------------------------

    /// Legt einen neuen Raum fuer den Host an
    ///
    /// Hostet die Verbindung bereits einen Raum, wird dieser ersetzt (eine
    /// Verbindung hostet hoechstens einen Raum). Gibt den neuen Raum und den
    /// ersetzten Raum zurueck.
    pub fn raum_erstellen(
        &mut self,
        host_connection_id: ConnectionId,
        peer_id: String,
        host_name: String,
    ) -> (Room, Option<Room>) {
        let ersetzt = self
            .raeume
            .iter()
            .position(|r| r.host_connection_id == host_connection_id)
            .map(|idx| self.raeume.remove(idx));

        let raum = Room {
            room_id: RoomId::new(),
            peer_id,
            host_name,
            host_connection_id,
        };
        self.raeume.push(raum.clone());

        tracing::info!(
            raum_id = %raum.room_id,
            host = %host_connection_id,
            peer_id = %raum.peer_id,
            ersetzt = ersetzt.is_some(),
            "Gruppen-Raum erstellt"
        );
        (raum, ersetzt)
    }

    /// Entfernt den Raum des Hosts (idempotent)
    ///
    /// Gibt die entfernten Raeume zurueck (leer wenn die Verbindung keinen
    /// Raum hostet).
    pub fn raum_entfernen_nach_host(&mut self, host_connection_id: &ConnectionId) -> Vec<Room> {
        self.raeume_entfernen(|r| &r.host_connection_id == host_connection_id)
    }

    /// Entfernt alle Raeume mit der gegebenen Peer-ID (idempotent)
    ///
    /// Der Schluessel ist die Peer-ID, nicht die Identitaet des Absenders.
    pub fn raum_entfernen_nach_peer_id(&mut self, peer_id: &str) -> Vec<Room> {
        self.raeume_entfernen(|r| r.peer_id == peer_id)
    }

    /// Alle Raeume in Erstellungsreihenfolge
    pub fn alle_raeume(&self) -> &[Room] {
        &self.raeume
    }

    /// Gibt einen Raum anhand seiner ID zurueck
    pub fn raum(&self, raum_id: &RoomId) -> Option<&Room> {
        self.raeume.iter().find(|r| &r.room_id == raum_id)
    }

    /// Anzahl der Raeume
    pub fn raum_anzahl(&self) -> usize {
        self.raeume.len()
    }

    fn raeume_entfernen(&mut self, mut trifft: impl FnMut(&Room) -> bool) -> Vec<Room> {
        let mut entfernt = Vec::new();
        let mut behalten = Vec::with_capacity(self.raeume.len());
        for raum in self.raeume.drain(..) {
            if trifft(&raum) {
                entfernt.push(raum);
            } else {
                behalten.push(raum);
            }
        }
        self.raeume = behalten;

        for raum in &entfernt {
            tracing::info!(raum_id = %raum.room_id, peer_id = %raum.peer_id, "Gruppen-Raum entfernt");
        }
        entfernt
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
