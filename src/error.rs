use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Every way a request to the relay can fail, each with exactly one status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("malformed request body: {0}")]
    MalformedRequest(String),

    #[error("delivery failed: {0}")]
    DeliveryFailure(#[from] crate::mailer::MailerError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Unauthorized" })),
            )
                .into_response(),
            ApiError::MalformedRequest(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid request body" })),
            )
                .into_response(),
            ApiError::DeliveryFailure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to send email" })),
            )
                .into_response(),
        }
    }
}
