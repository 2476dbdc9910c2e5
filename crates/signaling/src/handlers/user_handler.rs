//! User-Handler – register-new-user
//!
//! Traegt die Verbindung als aktiven User ein und verteilt beide Snapshots,
//! damit der neue Client auch die bereits existierenden Raeume kennt.

use videotalker_core::types::ConnectionId;
use videotalker_protocol::signal::RegisterUserRequest;

use crate::broadcast::SignalTransport;
use crate::publisher;
use crate::server_state::SignalingState;

/// Verarbeitet `register-new-user`
///
/// Als Kennung gilt immer die Transport-ID des Absenders.
pub fn handle_register_new_user<T: SignalTransport>(
    request: RegisterUserRequest,
    absender: ConnectionId,
    state: &SignalingState<T>,
) {
    let mut registry = state.registry.lock();
    registry.peer_registrieren(absender, request.username);

    publisher::aktive_user_veroeffentlichen(&registry, &state.transport);
    publisher::raeume_veroeffentlichen(&registry, &state.transport);
    state.registry_metriken_aktualisieren(&registry);
}
