//! Fehlertypen fuer die HTTP-Schnittstelle

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Alle moeglichen Fehler der HTTP-Schnittstelle
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("TURN-Dienst nicht konfiguriert: {0}")]
    NichtKonfiguriert(String),

    #[error("TURN-Dienst nicht erreichbar: {0}")]
    DienstNichtErreichbar(#[from] reqwest::Error),

    #[error("TURN-Dienst antwortete mit Status {status}")]
    DienstFehler { status: u16 },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// HTTP-Statuscode fuer REST-Fehler
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::NichtKonfiguriert(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::DienstNichtErreichbar(_) | Self::DienstFehler { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            tracing::warn!(fehler = %self, status = status.as_u16(), "API-Anfrage fehlgeschlagen");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
