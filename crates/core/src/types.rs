//! Gemeinsame Identifikationstypen fuer Videotalker
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! Verbindungs- und Raum-IDs zur Compilezeit auszuschliessen. Auf dem
//! Draht erscheinen beide als UUID-String.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Transport-Kennung einer Client-Verbindung
///
/// Wird beim Verbindungsaufbau vom Server vergeben und ist fuer die
/// Lebensdauer der Verbindung stabil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

impl FromStr for ConnectionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Prozessweit eindeutige Raum-ID eines Gruppen-Calls
///
/// 128 Bit Zufall (UUID v4), Kollisionen gelten als vernachlaessigbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(pub Uuid);

impl RoomId {
    /// Erstellt eine neue zufaellige RoomId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "room:{}", self.0)
    }
}

impl FromStr for RoomId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_eindeutig() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b, "Zwei neue ConnectionIds muessen verschieden sein");
    }

    #[test]
    fn room_id_eindeutig() {
        let a = RoomId::new();
        let b = RoomId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn room_id_display() {
        let id = RoomId(Uuid::nil());
        assert!(id.to_string().starts_with("room:"));
    }

    #[test]
    fn ids_erscheinen_als_uuid_string() {
        let cid = ConnectionId::new();
        let json = serde_json::to_string(&cid).unwrap();
        assert_eq!(json, format!("\"{}\"", cid.inner()));

        let cid2: ConnectionId = serde_json::from_str(&json).unwrap();
        assert_eq!(cid, cid2);
    }

    #[test]
    fn ungueltige_id_wird_abgelehnt() {
        assert!("kein-uuid".parse::<ConnectionId>().is_err());
        assert!(serde_json::from_str::<RoomId>("\"abc\"").is_err());
    }
}
