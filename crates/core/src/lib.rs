//! videotalker-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt die Identifikationstypen und den zentralen
//! Fehler-Enum bereit, die von allen anderen Videotalker-Crates genutzt werden.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{Result, VideotalkerError};
pub use types::{ConnectionId, RoomId};
