//! Route-Definitionen fuer die HTTP-Schnittstelle

use axum::{routing::get, Router};

use crate::{handlers, ApiState};

/// Erstellt den Router fuer Service-Deskriptor und TURN-Credentials
pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(handlers::service_info))
        .route(
            "/api/get-turn-credentials",
            get(handlers::get_turn_credentials),
        )
        .with_state(state)
}
