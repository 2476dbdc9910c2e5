//! Signaling-Protokoll (Event-Kanal)
//!
//! Definiert alle Events die zwischen Client und Relay ausgetauscht werden.
//!
//! ## Design
//! - Jede Nachricht ist ein Envelope `{"event": <name>, "data": <payload>}`
//! - Eingehende Events werden zweistufig geparst: erst der Envelope, dann
//!   der typisierte Payload passend zum Event-Namen. So kann ein fehlendes
//!   Ziel-Feld erkannt und das Event verworfen werden, ohne die Verbindung
//!   zu gefaehrden.
//! - SDP-Beschreibungen, ICE-Kandidaten und Antwort-Werte sind opake
//!   `serde_json::Value`s und werden unveraendert weitergereicht.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use videotalker_core::types::{ConnectionId, RoomId};
use videotalker_core::VideotalkerError;

// ---------------------------------------------------------------------------
// Event-Namen
// ---------------------------------------------------------------------------

/// Event-Namen auf dem Draht
pub mod event_namen {
    pub const CONNECTION: &str = "connection";
    pub const BROADCAST: &str = "broadcast";
    pub const REGISTER_NEW_USER: &str = "register-new-user";
    pub const PRE_OFFER: &str = "pre-offer";
    pub const PRE_OFFER_ANSWER: &str = "pre-offer-answer";
    pub const WEBRTC_OFFER: &str = "webRTC-offer";
    pub const WEBRTC_ANSWER: &str = "webRTC-answer";
    pub const WEBRTC_CANDIDATE: &str = "webRTC-candidate";
    pub const USER_HANGED_UP: &str = "user-hanged-up";
    pub const GROUP_CALL_REGISTER: &str = "group-call-register";
    pub const GROUP_CALL_JOIN_REQUEST: &str = "group-call-join-request";
    pub const GROUP_CALL_USER_LEFT: &str = "group-call-user-left";
    pub const GROUP_CALL_CLOSED_BY_HOST: &str = "group-call-closed-by-host";
}

// ---------------------------------------------------------------------------
// Registry-Datensaetze
// ---------------------------------------------------------------------------

/// Ein registrierter Client (Eintrag der aktiven User)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    pub username: String,
    pub connection_id: ConnectionId,
}

/// Ein Gruppen-Call-Raum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: RoomId,
    /// Kennung des Media-Endpunkts den der Host verwendet
    pub peer_id: String,
    pub host_name: String,
    pub host_connection_id: ConnectionId,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Rohes Event wie es ueber den Kanal kommt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event: String,
    #[serde(default)]
    pub data: Option<Value>,
}

// ---------------------------------------------------------------------------
// Eingehende Payloads (Client -> Relay)
// ---------------------------------------------------------------------------

/// Registrierung als aktiver User
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
}

/// Angerufene Gegenstelle eines Pre-Offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalleeRef {
    #[serde(alias = "socketId")]
    pub connection_id: ConnectionId,
}

/// Anrufer eines Pre-Offers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallerRef {
    #[serde(default)]
    pub username: String,
}

/// Ankuendigung eines Direkt-Anrufs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreOfferRequest {
    pub callee: CalleeRef,
    #[serde(default)]
    pub caller: CallerRef,
}

/// Antwort des Angerufenen auf ein Pre-Offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreOfferAnswerRequest {
    #[serde(alias = "callerSocketId")]
    pub caller_connection_id: ConnectionId,
    #[serde(default)]
    pub answer: Value,
}

/// SDP-Offer an den Angerufenen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebRtcOfferRequest {
    #[serde(alias = "calleeSocketId")]
    pub callee_connection_id: ConnectionId,
    #[serde(default)]
    pub offer: Value,
}

/// SDP-Answer an den Anrufer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebRtcAnswerRequest {
    #[serde(alias = "callerSocketId")]
    pub caller_connection_id: ConnectionId,
    #[serde(default)]
    pub answer: Value,
}

/// ICE-Kandidat an die verbundene Gegenstelle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebRtcCandidateRequest {
    #[serde(alias = "connectedUserSocketId")]
    pub connected_user_connection_id: ConnectionId,
    #[serde(default)]
    pub candidate: Value,
}

/// Auflegen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HangUpRequest {
    #[serde(alias = "connectedUserSocketId")]
    pub connected_user_connection_id: ConnectionId,
}

/// Neuen Gruppen-Call-Raum anlegen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCallRegisterRequest {
    pub peer_id: String,
    #[serde(default)]
    pub username: String,
}

/// Beitrittsanfrage an einen Raum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCallJoinRequest {
    pub room_id: RoomId,
    #[serde(default)]
    pub peer_id: String,
    #[serde(default)]
    pub stream_id: String,
}

/// Teilnehmer verlaesst einen Raum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCallUserLeftRequest {
    pub room_id: RoomId,
    #[serde(default)]
    pub stream_id: String,
}

/// Host schliesst seinen Raum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCallClosedRequest {
    pub peer_id: String,
}

// ---------------------------------------------------------------------------
// ClientEvent
// ---------------------------------------------------------------------------

/// Typisiertes eingehendes Event
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    RegisterNewUser(RegisterUserRequest),
    PreOffer(PreOfferRequest),
    PreOfferAnswer(PreOfferAnswerRequest),
    WebRtcOffer(WebRtcOfferRequest),
    WebRtcAnswer(WebRtcAnswerRequest),
    WebRtcCandidate(WebRtcCandidateRequest),
    UserHangedUp(HangUpRequest),
    GroupCallRegister(GroupCallRegisterRequest),
    GroupCallJoinRequest(GroupCallJoinRequest),
    GroupCallUserLeft(GroupCallUserLeftRequest),
    GroupCallClosedByHost(GroupCallClosedRequest),
}

impl ClientEvent {
    /// Parst ein Event aus einem JSON-Text-Frame
    pub fn from_json(text: &str) -> Result<Self, VideotalkerError> {
        let envelope: EventEnvelope = serde_json::from_str(text)
            .map_err(|e| VideotalkerError::ungueltig(format!("Envelope: {e}")))?;
        Self::from_envelope(envelope)
    }

    /// Wandelt einen Envelope in ein typisiertes Event
    ///
    /// Schlaegt fehl bei unbekanntem Event-Namen, fehlendem Payload oder
    /// fehlendem/ungueltigem Ziel-Feld.
    pub fn from_envelope(envelope: EventEnvelope) -> Result<Self, VideotalkerError> {
        use event_namen::*;

        let EventEnvelope { event, data } = envelope;
        let data = data.unwrap_or(Value::Null);

        match event.as_str() {
            REGISTER_NEW_USER => payload(&event, data).map(Self::RegisterNewUser),
            PRE_OFFER => payload(&event, data).map(Self::PreOffer),
            PRE_OFFER_ANSWER => payload(&event, data).map(Self::PreOfferAnswer),
            WEBRTC_OFFER => payload(&event, data).map(Self::WebRtcOffer),
            WEBRTC_ANSWER => payload(&event, data).map(Self::WebRtcAnswer),
            WEBRTC_CANDIDATE => payload(&event, data).map(Self::WebRtcCandidate),
            USER_HANGED_UP => payload(&event, data).map(Self::UserHangedUp),
            GROUP_CALL_REGISTER => payload(&event, data).map(Self::GroupCallRegister),
            GROUP_CALL_JOIN_REQUEST => payload(&event, data).map(Self::GroupCallJoinRequest),
            GROUP_CALL_USER_LEFT => payload(&event, data).map(Self::GroupCallUserLeft),
            GROUP_CALL_CLOSED_BY_HOST => payload(&event, data).map(Self::GroupCallClosedByHost),
            _ => Err(VideotalkerError::UnbekanntesEvent(event)),
        }
    }

    /// Event-Name auf dem Draht
    pub fn name(&self) -> &'static str {
        use event_namen::*;

        match self {
            Self::RegisterNewUser(_) => REGISTER_NEW_USER,
            Self::PreOffer(_) => PRE_OFFER,
            Self::PreOfferAnswer(_) => PRE_OFFER_ANSWER,
            Self::WebRtcOffer(_) => WEBRTC_OFFER,
            Self::WebRtcAnswer(_) => WEBRTC_ANSWER,
            Self::WebRtcCandidate(_) => WEBRTC_CANDIDATE,
            Self::UserHangedUp(_) => USER_HANGED_UP,
            Self::GroupCallRegister(_) => GROUP_CALL_REGISTER,
            Self::GroupCallJoinRequest(_) => GROUP_CALL_JOIN_REQUEST,
            Self::GroupCallUserLeft(_) => GROUP_CALL_USER_LEFT,
            Self::GroupCallClosedByHost(_) => GROUP_CALL_CLOSED_BY_HOST,
        }
    }
}

fn payload<T: DeserializeOwned>(event: &str, data: Value) -> Result<T, VideotalkerError> {
    if data.is_null() {
        return Err(VideotalkerError::ungueltig(format!("{event}: Payload fehlt")));
    }
    serde_json::from_value(data).map_err(|e| VideotalkerError::ungueltig(format!("{event}: {e}")))
}

// ---------------------------------------------------------------------------
// Ausgehende Events (Relay -> Client)
// ---------------------------------------------------------------------------

/// Vollstaendiger Registry-Snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum BroadcastPayload {
    #[serde(rename = "ACTIVE_USERS")]
    ActiveUsers {
        #[serde(rename = "activeUsers")]
        active_users: Vec<Peer>,
    },
    #[serde(rename = "GROUP_CALL_ROOMS")]
    GroupCallRooms {
        #[serde(rename = "groupCallRooms")]
        group_call_rooms: Vec<Room>,
    },
}

/// Typisiertes ausgehendes Event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Begruessung mit der vergebenen Verbindungs-ID
    #[serde(rename = "connection")]
    Connection { connection_id: ConnectionId },
    #[serde(rename = "broadcast")]
    Broadcast(BroadcastPayload),
    #[serde(rename = "pre-offer")]
    PreOffer {
        caller_username: String,
        caller_connection_id: ConnectionId,
    },
    #[serde(rename = "pre-offer-answer")]
    PreOfferAnswer { answer: Value },
    #[serde(rename = "webRTC-offer")]
    WebRtcOffer { offer: Value },
    #[serde(rename = "webRTC-answer")]
    WebRtcAnswer { answer: Value },
    #[serde(rename = "webRTC-candidate")]
    WebRtcCandidate { candidate: Value },
    #[serde(rename = "user-hanged-up")]
    UserHangedUp,
    #[serde(rename = "group-call-join-request")]
    GroupCallJoinRequest { peer_id: String, stream_id: String },
    #[serde(rename = "group-call-user-left")]
    GroupCallUserLeft { stream_id: String },
}

impl ServerEvent {
    /// Snapshot der aktiven User
    pub fn active_users(peers: Vec<Peer>) -> Self {
        Self::Broadcast(BroadcastPayload::ActiveUsers {
            active_users: peers,
        })
    }

    /// Snapshot der Gruppen-Call-Raeume
    pub fn group_call_rooms(rooms: Vec<Room>) -> Self {
        Self::Broadcast(BroadcastPayload::GroupCallRooms {
            group_call_rooms: rooms,
        })
    }

    /// Event-Name auf dem Draht
    pub fn name(&self) -> &'static str {
        use event_namen::*;

        match self {
            Self::Connection { .. } => CONNECTION,
            Self::Broadcast(_) => BROADCAST,
            Self::PreOffer { .. } => PRE_OFFER,
            Self::PreOfferAnswer { .. } => PRE_OFFER_ANSWER,
            Self::WebRtcOffer { .. } => WEBRTC_OFFER,
            Self::WebRtcAnswer { .. } => WEBRTC_ANSWER,
            Self::WebRtcCandidate { .. } => WEBRTC_CANDIDATE,
            Self::UserHangedUp => USER_HANGED_UP,
            Self::GroupCallJoinRequest { .. } => GROUP_CALL_JOIN_REQUEST,
            Self::GroupCallUserLeft { .. } => GROUP_CALL_USER_LEFT,
        }
    }

    /// Serialisiert das Event als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert ein Event aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_new_user_parsen() {
        let event =
            ClientEvent::from_json(r#"{"event":"register-new-user","data":{"username":"alice"}}"#)
                .unwrap();
        assert_eq!(
            event,
            ClientEvent::RegisterNewUser(RegisterUserRequest {
                username: "alice".into()
            })
        );
        assert_eq!(event.name(), "register-new-user");
    }

    #[test]
    fn pre_offer_mit_altem_socket_id_feld() {
        let callee = ConnectionId::new();
        let text = json!({
            "event": "pre-offer",
            "data": {
                "callee": { "socketId": callee.inner().to_string(), "username": "bob" },
                "caller": { "username": "alice" }
            }
        })
        .to_string();

        match ClientEvent::from_json(&text).unwrap() {
            ClientEvent::PreOffer(req) => {
                assert_eq!(req.callee.connection_id, callee);
                assert_eq!(req.caller.username, "alice");
            }
            andere => panic!("Erwartet PreOffer, erhalten {andere:?}"),
        }
    }

    #[test]
    fn opaker_payload_bleibt_unveraendert() {
        let ziel = ConnectionId::new();
        let offer = json!({ "type": "offer", "sdp": "v=0\r\no=- 4611 2 IN IP4 127.0.0.1" });
        let text = json!({
            "event": "webRTC-offer",
            "data": { "calleeConnectionId": ziel.inner(), "offer": offer.clone() }
        })
        .to_string();

        match ClientEvent::from_json(&text).unwrap() {
            ClientEvent::WebRtcOffer(req) => {
                assert_eq!(req.callee_connection_id, ziel);
                assert_eq!(req.offer, offer);
            }
            andere => panic!("Erwartet WebRtcOffer, erhalten {andere:?}"),
        }
    }

    #[test]
    fn fehlendes_ziel_wird_abgelehnt() {
        let ergebnis = ClientEvent::from_json(
            r#"{"event":"webRTC-candidate","data":{"candidate":{"candidate":"a=1"}}}"#,
        );
        assert!(matches!(
            ergebnis,
            Err(VideotalkerError::UngueltigeNachricht(_))
        ));
    }

    #[test]
    fn ungueltige_ziel_id_wird_abgelehnt() {
        let ergebnis = ClientEvent::from_json(
            r#"{"event":"user-hanged-up","data":{"connectedUserConnectionId":"nicht-vorhanden"}}"#,
        );
        assert!(ergebnis.is_err());
    }

    #[test]
    fn null_payload_wird_abgelehnt() {
        let ergebnis = ClientEvent::from_json(r#"{"event":"group-call-user-left","data":null}"#);
        assert!(matches!(
            ergebnis,
            Err(VideotalkerError::UngueltigeNachricht(_))
        ));

        let ohne_data = ClientEvent::from_json(r#"{"event":"group-call-closed-by-host"}"#);
        assert!(ohne_data.is_err());
    }

    #[test]
    fn unbekanntes_event_wird_abgelehnt() {
        let ergebnis = ClientEvent::from_json(r#"{"event":"message","data":"hallo"}"#);
        assert!(matches!(
            ergebnis,
            Err(VideotalkerError::UnbekanntesEvent(ref name)) if name == "message"
        ));
    }

    #[test]
    fn kaputtes_json_wird_abgelehnt() {
        assert!(ClientEvent::from_json("{event:").is_err());
        assert!(ClientEvent::from_json("[]").is_err());
    }

    #[test]
    fn active_users_broadcast_format() {
        let cid = ConnectionId::new();
        let event = ServerEvent::active_users(vec![Peer {
            username: "alice".into(),
            connection_id: cid,
        }]);

        let wert: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(wert["event"], "broadcast");
        assert_eq!(wert["data"]["event"], "ACTIVE_USERS");
        assert_eq!(wert["data"]["activeUsers"][0]["username"], "alice");
        assert_eq!(
            wert["data"]["activeUsers"][0]["connectionId"],
            json!(cid.inner())
        );
    }

    #[test]
    fn group_call_rooms_broadcast_format() {
        let raum = Room {
            room_id: RoomId::new(),
            peer_id: "p1".into(),
            host_name: "H".into(),
            host_connection_id: ConnectionId::new(),
        };
        let event = ServerEvent::group_call_rooms(vec![raum.clone()]);

        let wert: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(wert["data"]["event"], "GROUP_CALL_ROOMS");
        let eintrag = &wert["data"]["groupCallRooms"][0];
        assert_eq!(eintrag["peerId"], "p1");
        assert_eq!(eintrag["hostName"], "H");
        assert_eq!(eintrag["roomId"], json!(raum.room_id.inner()));
        assert_eq!(
            eintrag["hostConnectionId"],
            json!(raum.host_connection_id.inner())
        );
    }

    #[test]
    fn pre_offer_ausgehend_format() {
        let cid = ConnectionId::new();
        let event = ServerEvent::PreOffer {
            caller_username: "alice".into(),
            caller_connection_id: cid,
        };
        let wert: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(wert["event"], "pre-offer");
        assert_eq!(wert["data"]["callerUsername"], "alice");
        assert_eq!(wert["data"]["callerConnectionId"], json!(cid.inner()));
    }

    #[test]
    fn user_hanged_up_ohne_payload() {
        let json = ServerEvent::UserHangedUp.to_json().unwrap();
        let wert: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(wert["event"], "user-hanged-up");
        assert!(wert.get("data").is_none());
        assert_eq!(ServerEvent::from_json(&json).unwrap(), ServerEvent::UserHangedUp);
    }
}
