//! REST-Handler der HTTP-Schnittstelle

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::ApiState;

/// GET / – statischer Service-Deskriptor
pub async fn service_info() -> Json<Value> {
    Json(json!({ "api": "video-talker-api" }))
}

/// GET /api/get-turn-credentials – frischer Token vom TURN-Dienst
pub async fn get_turn_credentials(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    let token = state.turn.token_erstellen().await?;
    Ok(Json(json!({ "token": token })))
}
