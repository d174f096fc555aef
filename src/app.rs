use axum::{Router, middleware, routing::post};
use tower_http::trace::TraceLayer;

use std::sync::Arc;

use crate::{
    auth::{self, TokenVerifier},
    handler,
    service::EmailService,
};

pub fn router(verifier: Arc<TokenVerifier>, service: Arc<EmailService>) -> Router {
    Router::new()
        .route("/send-email", post(handler::send_email))
        .route_layer(middleware::from_fn_with_state(
            verifier,
            auth::require_bearer,
        ))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}
