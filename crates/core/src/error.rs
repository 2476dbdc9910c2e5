//! Fehlertypen fuer Videotalker
//!
//! Fehler beim Einlesen von Client-Nachrichten. Untermodule definieren
//! eigene Fehler (Transport, TURN) und konvertieren via `#[from]`.

use thiserror::Error;

/// Globaler Result-Alias fuer Videotalker
pub type Result<T> = std::result::Result<T, VideotalkerError>;

/// Fehler beim Einlesen einer Client-Nachricht
#[derive(Debug, Error)]
pub enum VideotalkerError {
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    #[error("Unbekanntes Event: {0}")]
    UnbekanntesEvent(String),
}

impl VideotalkerError {
    /// Erstellt einen Fehler fuer eine ungueltige Nachricht
    pub fn ungueltig(msg: impl Into<String>) -> Self {
        Self::UngueltigeNachricht(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = VideotalkerError::UnbekanntesEvent("message".into());
        assert_eq!(e.to_string(), "Unbekanntes Event: message");
    }

    #[test]
    fn ungueltig_traegt_grund() {
        let e = VideotalkerError::ungueltig("pre-offer: Payload fehlt");
        assert!(matches!(e, VideotalkerError::UngueltigeNachricht(_)));
        assert_eq!(e.to_string(), "Ungueltige Nachricht: pre-offer: Payload fehlt");
    }
}
