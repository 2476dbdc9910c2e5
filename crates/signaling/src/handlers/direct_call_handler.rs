//! Direct-Call-Handler – Punkt-zu-Punkt Signaling zwischen zwei Peers
//!
//! Die Ziel-Verbindung kommt vom Absender selbst (aus einem frueheren
//! Snapshot oder Signaling-Event). Der Relay fuehrt keine Call-Tabelle und
//! prueft nicht, ob Absender und Ziel tatsaechlich miteinander telefonieren.
//!
//! Alle Handler geben `true` zurueck, wenn das Event in die Queue der
//! Ziel-Verbindung gelegt wurde. Ein verschwundenes Ziel ist kein Fehler.

use videotalker_core::types::ConnectionId;
use videotalker_protocol::signal::{
    HangUpRequest, PreOfferAnswerRequest, PreOfferRequest, WebRtcAnswerRequest,
    WebRtcCandidateRequest, WebRtcOfferRequest,
};
use videotalker_protocol::ServerEvent;

use crate::broadcast::SignalTransport;
use crate::server_state::SignalingState;

/// `pre-offer` an den Angerufenen, mit Username und ID des Anrufers
pub fn handle_pre_offer<T: SignalTransport>(
    request: PreOfferRequest,
    absender: ConnectionId,
    state: &SignalingState<T>,
) -> bool {
    state.transport.an_verbindung_senden(
        &request.callee.connection_id,
        ServerEvent::PreOffer {
            caller_username: request.caller.username,
            caller_connection_id: absender,
        },
    )
}

/// `pre-offer-answer` zurueck an den Anrufer
pub fn handle_pre_offer_answer<T: SignalTransport>(
    request: PreOfferAnswerRequest,
    state: &SignalingState<T>,
) -> bool {
    state.transport.an_verbindung_senden(
        &request.caller_connection_id,
        ServerEvent::PreOfferAnswer {
            answer: request.answer,
        },
    )
}

/// `webRTC-offer` an den Angerufenen
pub fn handle_webrtc_offer<T: SignalTransport>(
    request: WebRtcOfferRequest,
    state: &SignalingState<T>,
) -> bool {
    state.transport.an_verbindung_senden(
        &request.callee_connection_id,
        ServerEvent::WebRtcOffer {
            offer: request.offer,
        },
    )
}

/// `webRTC-answer` zurueck an den Anrufer
pub fn handle_webrtc_answer<T: SignalTransport>(
    request: WebRtcAnswerRequest,
    state: &SignalingState<T>,
) -> bool {
    state.transport.an_verbindung_senden(
        &request.caller_connection_id,
        ServerEvent::WebRtcAnswer {
            answer: request.answer,
        },
    )
}

/// `webRTC-candidate` an die verbundene Gegenstelle
pub fn handle_webrtc_candidate<T: SignalTransport>(
    request: WebRtcCandidateRequest,
    state: &SignalingState<T>,
) -> bool {
    state.transport.an_verbindung_senden(
        &request.connected_user_connection_id,
        ServerEvent::WebRtcCandidate {
            candidate: request.candidate,
        },
    )
}

/// `user-hanged-up` an die verbundene Gegenstelle
pub fn handle_user_hanged_up<T: SignalTransport>(
    request: HangUpRequest,
    state: &SignalingState<T>,
) -> bool {
    state
        .transport
        .an_verbindung_senden(&request.connected_user_connection_id, ServerEvent::UserHangedUp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::EventBroadcaster;
    use crate::server_state::SignalingConfig;
    use serde_json::json;
    use std::sync::Arc;
    use videotalker_observability::VideotalkerMetrics;
    use videotalker_protocol::signal::{CalleeRef, CallerRef};

    fn test_state() -> Arc<SignalingState> {
        SignalingState::neu(
            SignalingConfig::default(),
            EventBroadcaster::neu(),
            VideotalkerMetrics::neu().unwrap(),
        )
    }

    #[test]
    fn pre_offer_traegt_absender_id() {
        let state = test_state();
        let anrufer = ConnectionId::new();
        let angerufener = ConnectionId::new();
        let mut rx = state.transport.client_registrieren(angerufener);

        let zugestellt = handle_pre_offer(
            PreOfferRequest {
                callee: CalleeRef {
                    connection_id: angerufener,
                },
                caller: CallerRef {
                    username: "alice".into(),
                },
            },
            anrufer,
            &state,
        );

        assert!(zugestellt);
        assert_eq!(
            rx.try_recv().unwrap(),
            ServerEvent::PreOffer {
                caller_username: "alice".into(),
                caller_connection_id: anrufer,
            }
        );
    }

    #[test]
    fn answer_wird_unveraendert_weitergereicht() {
        let state = test_state();
        let anrufer = ConnectionId::new();
        let mut rx = state.transport.client_registrieren(anrufer);
        let answer = json!({ "type": "answer", "sdp": "v=0" });

        assert!(handle_webrtc_answer(
            WebRtcAnswerRequest {
                caller_connection_id: anrufer,
                answer: answer.clone(),
            },
            &state,
        ));
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::WebRtcAnswer { answer });
    }

    #[test]
    fn kandidat_an_verschwundenes_ziel_ist_no_op() {
        let state = test_state();
        let zuschauer = ConnectionId::new();
        let mut rx = state.transport.client_registrieren(zuschauer);

        let zugestellt = handle_webrtc_candidate(
            WebRtcCandidateRequest {
                connected_user_connection_id: ConnectionId::new(),
                candidate: json!({ "candidate": "candidate:1 1 UDP 2122252543 10.0.0.1 5000 typ host" }),
            },
            &state,
        );

        assert!(!zugestellt);
        assert!(rx.try_recv().is_err(), "Niemand sonst darf etwas empfangen");
    }

    #[test]
    fn auflegen_ohne_payload() {
        let state = test_state();
        let gegenstelle = ConnectionId::new();
        let mut rx = state.transport.client_registrieren(gegenstelle);

        assert!(handle_user_hanged_up(
            HangUpRequest {
                connected_user_connection_id: gegenstelle,
            },
            &state,
        ));
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::UserHangedUp);
    }
}
