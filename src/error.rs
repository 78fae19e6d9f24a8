use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::services::stytch::StytchError;

/// Errors surfaced by route handlers.
///
/// Caller mistakes map to 400, upstream Stytch failures to 502, everything
/// else to 500. Bodies stay generic; details go to the logs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("identity provider call failed: {0}")]
    Provider(#[from] StytchError),

    #[error("session store failure: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Provider(err) => {
                tracing::error!(error = %err, "Stytch call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "Authentication service unavailable".to_string(),
                )
            }
            AppError::Session(err) => {
                tracing::error!(error = %err, "Session store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_maps_to_400_with_message() {
        let response = AppError::BadRequest("Email is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_maps_to_500() {
        let response = AppError::Internal(anyhow::anyhow!("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
