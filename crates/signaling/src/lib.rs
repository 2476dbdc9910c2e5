//! videotalker-signaling – Rendezvous- und Signaling-Relay
//!
//! Dieser Crate implementiert den Relay fuer Peer-to-Peer Audio/Video-Calls.
//! Er transportiert keine Medien, sondern nur die kleinen Steuer-Events
//! (Session-Beschreibungen, ICE-Kandidaten, Raum-Events) die zwei oder mehr
//! Clients fuer den direkten Verbindungsaufbau brauchen, und haelt fest wer
//! erreichbar ist und welche Gruppen-Raeume existieren.
//!
//! ## Architektur
//!
//! ```text
//! WebSocket-Endpunkt (ws::signaling_router)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  Sitzung: Verbunden -> Getrennt
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     +-- UserHandler        (register-new-user)
//!     +-- DirectCallHandler  (pre-offer, webRTC-*, user-hanged-up)
//!     +-- GroupCallHandler   (group-call-*)
//!
//! Registry         – aktive User und Gruppen-Raeume (ein Lock)
//! publisher        – Voll-Snapshots an alle Verbindungen
//! EventBroadcaster – Send-Queues und Raum-Gruppen je Verbindung
//! ```

pub mod broadcast;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod publisher;
pub mod registry;
pub mod server_state;
pub mod session;
pub mod ws;

// Bequeme Re-Exporte
pub use broadcast::{EventBroadcaster, SignalTransport};
pub use connection::ClientConnection;
pub use dispatcher::MessageDispatcher;
pub use error::{SignalingError, SignalingResult};
pub use registry::Registry;
pub use server_state::{SignalingConfig, SignalingState};
pub use session::{Sitzung, VerbindungsZustand};
pub use ws::{signaling_router, VerbindungsLimit};
