//! videotalker-api – HTTP-Schnittstelle neben dem Signaling-Kanal
//!
//! - `GET /` – statischer Service-Deskriptor
//! - `GET /api/get-turn-credentials` – TURN-Credentials vom externen Dienst
//!
//! Der Relay-Kern haengt nicht von dieser Crate ab. Der Credential-Dienst
//! steckt hinter dem Trait `TurnCredentialProvider`.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod turn;

use std::sync::Arc;

pub use error::{ApiError, ApiResult};
pub use routes::api_router;
pub use turn::{TurnCredentialProvider, TurnKonfig, TwilioProvider};

/// Axum-State fuer die HTTP-Schnittstelle
#[derive(Clone)]
pub struct ApiState {
    pub turn: Arc<dyn TurnCredentialProvider>,
}

impl ApiState {
    pub fn neu(turn: Arc<dyn TurnCredentialProvider>) -> Self {
        Self { turn }
    }
}
