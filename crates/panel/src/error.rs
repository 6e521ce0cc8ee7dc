//! HTTP error mapping for the control surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use irrigation_engine::{CommandError, SessionError, SetupError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Any action rejected by the session.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        let Self::Session(e) = self;
        match e {
            SessionError::Flow(_) | SessionError::WrongScreen { .. } => StatusCode::CONFLICT,
            SessionError::Setup(SetupError::UnknownZone(_))
            | SessionError::Command(CommandError::UnknownZone(_)) => StatusCode::NOT_FOUND,
            SessionError::Setup(SetupError::Incomplete { .. }) => StatusCode::BAD_REQUEST,
            SessionError::Command(CommandError::Executor(_)) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(status = status.as_u16(), "request rejected: {self}");

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
