//! Message-Dispatcher – Routet ClientEvents an die richtigen Handler
//!
//! Der Dispatcher empfaengt Text-Frames einer ClientConnection, parst sie zu
//! typisierten Events und ruft den zustaendigen Handler auf. Es gibt keine
//! Antworten: Ergebnisse erreichen die Clients ausschliesslich ueber den
//! Transport.
//!
//! ## Fehlerverhalten
//! Unparsbare oder unvollstaendige Events werden verworfen und gezaehlt.
//! Die Verbindung bleibt offen, andere Verbindungen merken nichts davon.

use std::sync::Arc;
use videotalker_core::VideotalkerError;
use videotalker_protocol::ClientEvent;

use crate::broadcast::SignalTransport;
use crate::handlers::{direct_call_handler, group_call_handler, user_handler};
use crate::publisher;
use crate::server_state::SignalingState;
use crate::session::Sitzung;

/// Zentraler Message-Dispatcher
pub struct MessageDispatcher<T> {
    state: Arc<SignalingState<T>>,
}

impl<T: SignalTransport> MessageDispatcher<T> {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<SignalingState<T>>) -> Self {
        Self { state }
    }

    /// Parst einen Text-Frame und dispatcht das Event
    pub fn dispatch_text(&self, text: &str, sitzung: &Sitzung) {
        match ClientEvent::from_json(text) {
            Ok(event) => self.dispatch(event, sitzung),
            Err(e) => {
                let grund = match e {
                    VideotalkerError::UnbekanntesEvent(_) => "unbekanntes_event",
                    _ => "ungueltig",
                };
                tracing::debug!(
                    connection_id = %sitzung.connection_id(),
                    fehler = %e,
                    "Event verworfen"
                );
                self.state.metriken.event_verworfen(grund);
            }
        }
    }

    /// Verarbeitet ein typisiertes Event im Namen der Sitzung
    pub fn dispatch(&self, event: ClientEvent, sitzung: &Sitzung) {
        let name = event.name();
        let absender = sitzung.connection_id();

        if !sitzung.ist_verbunden() {
            tracing::debug!(connection_id = %absender, event = name, "Event nach Trennung ignoriert");
            self.state.metriken.event_verworfen("getrennt");
            return;
        }

        tracing::trace!(connection_id = %absender, event = name, "Event empfangen");
        let state = self.state.as_ref();

        let zugestellt = match event {
            // -------------------------------------------------------------------
            // Peer-Registry
            // -------------------------------------------------------------------
            ClientEvent::RegisterNewUser(req) => {
                user_handler::handle_register_new_user(req, absender, state);
                true
            }

            // -------------------------------------------------------------------
            // Direct Call (Punkt-zu-Punkt)
            // -------------------------------------------------------------------
            ClientEvent::PreOffer(req) => direct_call_handler::handle_pre_offer(req, absender, state),
            ClientEvent::PreOfferAnswer(req) => {
                direct_call_handler::handle_pre_offer_answer(req, state)
            }
            ClientEvent::WebRtcOffer(req) => direct_call_handler::handle_webrtc_offer(req, state),
            ClientEvent::WebRtcAnswer(req) => direct_call_handler::handle_webrtc_answer(req, state),
            ClientEvent::WebRtcCandidate(req) => {
                direct_call_handler::handle_webrtc_candidate(req, state)
            }
            ClientEvent::UserHangedUp(req) => direct_call_handler::handle_user_hanged_up(req, state),

            // -------------------------------------------------------------------
            // Group Call
            // -------------------------------------------------------------------
            ClientEvent::GroupCallRegister(req) => {
                group_call_handler::handle_register(req, absender, state);
                true
            }
            ClientEvent::GroupCallJoinRequest(req) => {
                group_call_handler::handle_join_request(req, absender, state);
                true
            }
            ClientEvent::GroupCallUserLeft(req) => {
                group_call_handler::handle_user_left(req, absender, state);
                true
            }
            ClientEvent::GroupCallClosedByHost(req) => {
                group_call_handler::handle_closed_by_host(req, state);
                true
            }
        };

        if zugestellt {
            self.state.metriken.event_weitergeleitet(name);
        } else {
            tracing::debug!(connection_id = %absender, event = name, "Ziel-Verbindung unbekannt");
            self.state.metriken.event_verworfen("ziel_unbekannt");
        }
    }

    /// Bereinigt alle Spuren einer getrennten Verbindung
    ///
    /// Entfernt Peer-Eintrag, gehosteten Raum und Gruppen-Mitgliedschaften und
    /// verteilt danach beide Snapshots. Weitere Aufrufe fuer dieselbe Sitzung
    /// sind No-Ops.
    pub fn verbindung_getrennt(&self, sitzung: &mut Sitzung) {
        if !sitzung.trennen() {
            return;
        }
        let connection_id = sitzung.connection_id();

        self.state.transport.verbindung_entfernen(&connection_id);

        let mut registry = self.state.registry.lock();
        let peer_entfernt = registry.peer_entfernen(&connection_id);
        let raeume_entfernt = registry.raum_entfernen_nach_host(&connection_id).len();

        publisher::aktive_user_veroeffentlichen(&registry, &self.state.transport);
        publisher::raeume_veroeffentlichen(&registry, &self.state.transport);
        self.state.registry_metriken_aktualisieren(&registry);
        drop(registry);

        tracing::info!(
            connection_id = %connection_id,
            peer_entfernt,
            raeume_entfernt,
            dauer_sek = sitzung.dauer().as_secs(),
            "Verbindung bereinigt"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
