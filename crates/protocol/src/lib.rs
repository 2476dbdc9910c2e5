//! videotalker-protocol – Signaling-Protokoll-Definitionen
//!
//! Dieses Crate definiert alle Events, Payloads und Registry-Datensaetze
//! die zwischen Client und Relay ueber den Event-Kanal ausgetauscht werden.

pub mod signal;

pub use signal::{
    event_namen, BroadcastPayload, ClientEvent, EventEnvelope, Peer, Room, ServerEvent,
};
