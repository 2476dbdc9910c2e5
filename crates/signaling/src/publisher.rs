//! Broadcast-Publisher – Voll-Snapshots der Registry an alle Verbindungen
//!
//! Jede Aenderung an einer der beiden Registries wird mit einem kompletten
//! Snapshot an jede verbundene Verbindung beantwortet (nicht nur an
//! Raum-Mitglieder). Empfaenger ersetzen ihren Stand vollstaendig, es gibt
//! kein Diffing.
//!
//! Beide Funktionen muessen aufgerufen werden solange der Registry-Lock
//! gehalten wird, sonst koennte ein aelterer Snapshot einen neueren ueberholen.

use videotalker_protocol::ServerEvent;

use crate::broadcast::SignalTransport;
use crate::registry::Registry;

/// Sendet `ACTIVE_USERS` mit allen registrierten Peers an alle Verbindungen
///
/// Gibt die Anzahl der erreichten Verbindungen zurueck.
pub fn aktive_user_veroeffentlichen<T: SignalTransport>(registry: &Registry, transport: &T) -> usize {
    let event = ServerEvent::active_users(registry.alle_peers().to_vec());
    let erreicht = transport.an_alle_senden(event);
    tracing::debug!(
        peers = registry.peer_anzahl(),
        erreicht,
        "ACTIVE_USERS veroeffentlicht"
    );
    erreicht
}

/// Sendet `GROUP_CALL_ROOMS` mit allen Raeumen an alle Verbindungen
///
/// Gibt die Anzahl der erreichten Verbindungen zurueck.
pub fn raeume_veroeffentlichen<T: SignalTransport>(registry: &Registry, transport: &T) -> usize {
    let event = ServerEvent::group_call_rooms(registry.alle_raeume().to_vec());
    let erreicht = transport.an_alle_senden(event);
    tracing::debug!(
        raeume = registry.raum_anzahl(),
        erreicht,
        "GROUP_CALL_ROOMS veroeffentlicht"
    );
    erreicht
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::EventBroadcaster;
    use videotalker_core::types::ConnectionId;
    use videotalker_protocol::BroadcastPayload;

    #[test]
    fn snapshot_entspricht_registry() {
        let broadcaster = EventBroadcaster::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let mut rx_a = broadcaster.client_registrieren(a);
        let mut rx_b = broadcaster.client_registrieren(b);

        let mut registry = Registry::neu();
        registry.peer_registrieren(a, "alice".into());

        assert_eq!(aktive_user_veroeffentlichen(&registry, &broadcaster), 2);

        for rx in [&mut rx_a, &mut rx_b] {
            match rx.try_recv().expect("Snapshot erwartet") {
                ServerEvent::Broadcast(BroadcastPayload::ActiveUsers { active_users }) => {
                    assert_eq!(active_users, registry.alle_peers());
                }
                andere => panic!("Erwartet ACTIVE_USERS, erhalten {andere:?}"),
            }
        }
    }

    #[test]
    fn leere_raumliste_wird_veroeffentlicht() {
        let broadcaster = EventBroadcaster::neu();
        let mut rx = broadcaster.client_registrieren(ConnectionId::new());

        raeume_veroeffentlichen(&Registry::neu(), &broadcaster);

        assert_eq!(
            rx.try_recv().expect("Snapshot erwartet"),
            ServerEvent::group_call_rooms(Vec::new())
        );
    }
}
