use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;

use std::sync::Arc;

use crate::{dto::SendEmailRequest, error::ApiError, service::EmailService};

// The body is taken raw so that any Content-Type is accepted and every
// read or parse failure, oversized bodies included, maps onto the same 400.
#[debug_handler]
pub async fn send_email(
    State(service): State<Arc<EmailService>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request = match body
        .map_err(|e| e.body_text())
        .and_then(|body| SendEmailRequest::from_slice(&body).map_err(|e| e.to_string()))
    {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Rejected malformed request body: {e}");
            return ApiError::MalformedRequest(e).into_response();
        }
    };

    match service.send_email(request).await {
        Ok(r) => (StatusCode::OK, Json(r)).into_response(),
        Err(e) => {
            tracing::error!("Failed to send email: {e}");
            ApiError::DeliveryFailure(e).into_response()
        }
    }
}
