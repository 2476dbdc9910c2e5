//! Group-Call-Handler – Raeume anlegen, beitreten, verlassen, schliessen
//!
//! Raum-Mitgliedschaft lebt ausschliesslich im Transport (Gruppen des
//! EventBroadcasters), die Registry kennt nur Raum und Host. Join- und
//! Leave-Events werden ohne Registry-Pruefung an die Gruppe gesendet:
//! Ein unbekannter Raum hat schlicht keine Mitglieder.

use videotalker_core::types::ConnectionId;
use videotalker_protocol::signal::{
    GroupCallClosedRequest, GroupCallJoinRequest, GroupCallRegisterRequest,
    GroupCallUserLeftRequest,
};
use videotalker_protocol::ServerEvent;

use crate::broadcast::SignalTransport;
use crate::publisher;
use crate::server_state::SignalingState;

/// Verarbeitet `group-call-register`
///
/// Legt einen Raum mit dem Absender als Host an, nimmt den Host in die
/// Raum-Gruppe auf und verteilt den neuen Raum-Snapshot. Ein bereits
/// gehosteter Raum wird ersetzt und seine Gruppe verlassen.
pub fn handle_register<T: SignalTransport>(
    request: GroupCallRegisterRequest,
    absender: ConnectionId,
    state: &SignalingState<T>,
) {
    let mut registry = state.registry.lock();
    let (raum, ersetzt) = registry.raum_erstellen(absender, request.peer_id, request.username);

    if let Some(alt) = ersetzt {
        state.transport.gruppe_verlassen(&absender, &alt.room_id);
    }
    state.transport.gruppe_beitreten(absender, raum.room_id);

    publisher::raeume_veroeffentlichen(&registry, &state.transport);
    state.registry_metriken_aktualisieren(&registry);
}

/// Verarbeitet `group-call-join-request`
///
/// Die bisherigen Mitglieder erfahren vom Beitritt, der Absender selbst
/// nicht. Erst danach tritt er der Gruppe bei. Gibt die Anzahl der
/// benachrichtigten Mitglieder zurueck.
pub fn handle_join_request<T: SignalTransport>(
    request: GroupCallJoinRequest,
    absender: ConnectionId,
    state: &SignalingState<T>,
) -> usize {
    let erreicht = state.transport.an_gruppe_senden(
        &request.room_id,
        ServerEvent::GroupCallJoinRequest {
            peer_id: request.peer_id,
            stream_id: request.stream_id,
        },
    );
    state.transport.gruppe_beitreten(absender, request.room_id);

    tracing::debug!(
        connection_id = %absender,
        raum_id = %request.room_id,
        erreicht,
        "Gruppen-Raum beigetreten"
    );
    erreicht
}

/// Verarbeitet `group-call-user-left`
///
/// Der Absender verlaesst zuerst die Gruppe, die verbleibenden Mitglieder
/// erhalten danach die Stream-ID.
pub fn handle_user_left<T: SignalTransport>(
    request: GroupCallUserLeftRequest,
    absender: ConnectionId,
    state: &SignalingState<T>,
) -> usize {
    state.transport.gruppe_verlassen(&absender, &request.room_id);
    let erreicht = state.transport.an_gruppe_senden(
        &request.room_id,
        ServerEvent::GroupCallUserLeft {
            stream_id: request.stream_id,
        },
    );

    tracing::debug!(
        connection_id = %absender,
        raum_id = %request.room_id,
        erreicht,
        "Gruppen-Raum verlassen"
    );
    erreicht
}

/// Verarbeitet `group-call-closed-by-host`
///
/// Entfernt den Raum anhand der Peer-ID, unabhaengig davon wer das Event
/// sendet. Der Snapshot wird auch verteilt wenn kein Raum passte.
pub fn handle_closed_by_host<T: SignalTransport>(
    request: GroupCallClosedRequest,
    state: &SignalingState<T>,
) {
    let mut registry = state.registry.lock();
    let entfernt = registry.raum_entfernen_nach_peer_id(&request.peer_id);
    if entfernt.is_empty() {
        tracing::debug!(peer_id = %request.peer_id, "Kein Raum mit dieser Peer-ID");
    }

    publisher::raeume_veroeffentlichen(&registry, &state.transport);
    state.registry_metriken_aktualisieren(&registry);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::EventBroadcaster;
    use crate::server_state::SignalingConfig;
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use videotalker_observability::VideotalkerMetrics;
    use videotalker_protocol::{BroadcastPayload, Room};

    fn test_state() -> Arc<SignalingState> {
        SignalingState::neu(
            SignalingConfig::default(),
            EventBroadcaster::neu(),
            VideotalkerMetrics::neu().unwrap(),
        )
    }

    fn raeume_aus(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<Room> {
        match rx.try_recv().unwrap() {
            ServerEvent::Broadcast(BroadcastPayload::GroupCallRooms { group_call_rooms }) => {
                group_call_rooms
            }
            anderes => panic!("Erwartet GROUP_CALL_ROOMS, erhalten: {anderes:?}"),
        }
    }

    fn register(state: &SignalingState, host: ConnectionId, peer_id: &str) {
        handle_register(
            GroupCallRegisterRequest {
                peer_id: peer_id.into(),
                username: "Host".into(),
            },
            host,
            state,
        );
    }

    #[test]
    fn register_legt_raum_an_und_verteilt_snapshot() {
        let state = test_state();
        let host = ConnectionId::new();
        let zuschauer = ConnectionId::new();
        let mut host_rx = state.transport.client_registrieren(host);
        let mut zuschauer_rx = state.transport.client_registrieren(zuschauer);

        register(&state, host, "peer-h");

        let raeume = raeume_aus(&mut zuschauer_rx);
        assert_eq!(raeume.len(), 1);
        assert_eq!(raeume[0].peer_id, "peer-h");
        assert_eq!(raeume[0].host_connection_id, host);
        assert_eq!(raeume_aus(&mut host_rx), raeume);

        assert_eq!(
            state.transport.verbindungen_in_gruppe(&raeume[0].room_id),
            vec![host]
        );
        assert_eq!(state.metriken.group_call_rooms.get(), 1);
    }

    #[test]
    fn erneutes_register_ersetzt_raum_des_hosts() {
        let state = test_state();
        let host = ConnectionId::new();
        let mut rx = state.transport.client_registrieren(host);

        register(&state, host, "erster");
        let alt = raeume_aus(&mut rx).remove(0);
        register(&state, host, "zweiter");
        let raeume = raeume_aus(&mut rx);

        assert_eq!(raeume.len(), 1);
        assert_eq!(raeume[0].peer_id, "zweiter");
        assert!(state.transport.verbindungen_in_gruppe(&alt.room_id).is_empty());
        assert_eq!(state.transport.gruppen_anzahl(), 1);
    }

    #[test]
    fn join_request_erreicht_nur_bisherige_mitglieder() {
        let state = test_state();
        let host = ConnectionId::new();
        let gast = ConnectionId::new();
        let mut host_rx = state.transport.client_registrieren(host);
        let mut gast_rx = state.transport.client_registrieren(gast);

        register(&state, host, "peer-h");
        let raum = raeume_aus(&mut host_rx).remove(0);
        let _ = raeume_aus(&mut gast_rx);

        let erreicht = handle_join_request(
            GroupCallJoinRequest {
                room_id: raum.room_id,
                peer_id: "peer-g".into(),
                stream_id: "stream-g".into(),
            },
            gast,
            &state,
        );

        assert_eq!(erreicht, 1);
        assert_eq!(
            host_rx.try_recv().unwrap(),
            ServerEvent::GroupCallJoinRequest {
                peer_id: "peer-g".into(),
                stream_id: "stream-g".into(),
            }
        );
        assert!(gast_rx.try_recv().is_err(), "Absender erhaelt seinen eigenen Join nicht");
        assert_eq!(state.transport.verbindungen_in_gruppe(&raum.room_id).len(), 2);
    }

    #[test]
    fn user_left_erreicht_nur_verbleibende_mitglieder() {
        let state = test_state();
        let host = ConnectionId::new();
        let gast = ConnectionId::new();
        let mut host_rx = state.transport.client_registrieren(host);
        let mut gast_rx = state.transport.client_registrieren(gast);

        register(&state, host, "peer-h");
        let raum = raeume_aus(&mut host_rx).remove(0);
        let _ = raeume_aus(&mut gast_rx);
        state.transport.gruppe_beitreten(gast, raum.room_id);

        let erreicht = handle_user_left(
            GroupCallUserLeftRequest {
                room_id: raum.room_id,
                stream_id: "stream-g".into(),
            },
            gast,
            &state,
        );

        assert_eq!(erreicht, 1);
        assert_eq!(
            host_rx.try_recv().unwrap(),
            ServerEvent::GroupCallUserLeft {
                stream_id: "stream-g".into()
            }
        );
        assert!(gast_rx.try_recv().is_err());
    }

    #[test]
    fn closed_by_host_wirkt_auch_von_fremdem_absender() {
        let state = test_state();
        let host = ConnectionId::new();
        let mut rx = state.transport.client_registrieren(host);

        register(&state, host, "peer-h");
        let _ = raeume_aus(&mut rx);

        handle_closed_by_host(
            GroupCallClosedRequest {
                peer_id: "peer-h".into(),
            },
            &state,
        );

        assert!(raeume_aus(&mut rx).is_empty());
        assert_eq!(state.registry.lock().raum_anzahl(), 0);
    }

    #[test]
    fn closed_by_host_ohne_treffer_verteilt_trotzdem() {
        let state = test_state();
        let verbindung = ConnectionId::new();
        let mut rx = state.transport.client_registrieren(verbindung);

        handle_closed_by_host(
            GroupCallClosedRequest {
                peer_id: "gibt-es-nicht".into(),
            },
            &state,
        );

        assert!(raeume_aus(&mut rx).is_empty());
    }
}
