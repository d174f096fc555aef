mod app;
mod auth;
mod config;
mod dto;
mod error;
mod handler;
mod mailer;
mod service;

use std::sync::Arc;

use auth::TokenVerifier;
use mailer::SmtpMailer;
use service::EmailService;

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt().init();

    // Load config
    let cfg = config::load_config().unwrap_or_else(|e| {
        tracing::error!("Failed to load configuration: {e}");
        panic!("failed to load configuration: {e}");
    });
    tracing::info!("Successfully loaded notification service config: {:?}", cfg);

    // Setup verifier and mail service
    let verifier = TokenVerifier::new(&cfg).unwrap_or_else(|e| {
        tracing::error!("Failed to build verification client: {e}");
        panic!("failed to build verification client: {e}");
    });
    let mailer = Arc::new(SmtpMailer::new(&cfg));
    let service = EmailService::new(cfg.smtp_user.clone(), mailer);

    // Setup router
    let router = app::router(Arc::new(verifier), Arc::new(service));

    // Start server
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", cfg.port))
        .await
        .expect("Failed to bind to address");
    let addr = listener.local_addr().expect("Failed to read local address");

    tracing::info!("Notification service starting, listening on {}", addr);

    if let Err(e) = axum::serve(listener, router).await {
        tracing::error!("HTTP server error: {e}");
        panic!("failed to start HTTP server: {e}");
    }
}
