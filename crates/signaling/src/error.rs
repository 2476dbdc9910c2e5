//! Fehlertypen fuer den Signaling-Service

use thiserror::Error;

/// Fehlertyp fuer den Signaling-Service
///
/// Verlaesst nie einen Verbindungs-Task: Fehler einer Verbindung beenden
/// hoechstens diese eine Verbindung.
#[derive(Debug, Error)]
pub enum SignalingError {
    /// WebSocket-Fehler (Lesen, Schreiben)
    #[error("WebSocket-Fehler: {0}")]
    WebSocket(#[from] axum::Error),

    /// Ausgehendes Event nicht serialisierbar
    #[error("Serialisierung fehlgeschlagen: {0}")]
    Serialisierung(#[from] serde_json::Error),
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;
