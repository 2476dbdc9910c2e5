//! Sitzungs-Lebenszyklus einer Verbindung
//!
//! ## State Machine
//! ```text
//! Verbunden --(Disconnect-Signal des Transports)--> Getrennt
//! ```
//!
//! `Getrennt` ist terminal. Das Disconnect-Signal darf mehrfach ankommen,
//! der Uebergang (und damit die Bereinigung) passiert genau einmal.

use std::time::{Duration, Instant};
use videotalker_core::types::ConnectionId;

/// Zustand einer Verbindung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbindungsZustand {
    /// Verbunden, Events werden verarbeitet
    Verbunden,
    /// Verbindung beendet (terminal)
    Getrennt,
}

/// Sitzung einer einzelnen Verbindung
#[derive(Debug)]
pub struct Sitzung {
    connection_id: ConnectionId,
    zustand: VerbindungsZustand,
    verbunden_seit: Instant,
}

impl Sitzung {
    /// Erstellt eine neue Sitzung im Zustand `Verbunden`
    pub fn neu(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            zustand: VerbindungsZustand::Verbunden,
            verbunden_seit: Instant::now(),
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn zustand(&self) -> VerbindungsZustand {
        self.zustand
    }

    pub fn ist_verbunden(&self) -> bool {
        self.zustand == VerbindungsZustand::Verbunden
    }

    /// Dauer seit dem Verbindungsaufbau
    pub fn dauer(&self) -> Duration {
        self.verbunden_seit.elapsed()
    }

    /// Uebergang nach `Getrennt`
    ///
    /// Gibt nur beim ersten Aufruf `true` zurueck.
    pub fn trennen(&mut self) -> bool {
        match self.zustand {
            VerbindungsZustand::Verbunden => {
                self.zustand = VerbindungsZustand::Getrennt;
                true
            }
            VerbindungsZustand::Getrennt => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neue_sitzung_ist_verbunden() {
        let sitzung = Sitzung::neu(ConnectionId::new());
        assert_eq!(sitzung.zustand(), VerbindungsZustand::Verbunden);
        assert!(sitzung.ist_verbunden());
    }

    #[test]
    fn trennen_genau_einmal() {
        let mut sitzung = Sitzung::neu(ConnectionId::new());
        assert!(sitzung.trennen());
        assert!(!sitzung.trennen());
        assert_eq!(sitzung.zustand(), VerbindungsZustand::Getrennt);
    }
}
