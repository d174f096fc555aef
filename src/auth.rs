use axum::{
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};

use std::sync::Arc;

use crate::{config::Config, error::ApiError};

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Allowed,
    Denied,
}

/// Returns the credential carried by an `Authorization` header value.
///
/// The `Bearer ` prefix is matched case-sensitively; a value without it is
/// passed through whole. Empty values carry no credential.
pub fn bearer_token(header: &str) -> Option<&str> {
    if header.is_empty() {
        return None;
    }
    Some(header.strip_prefix(BEARER_PREFIX).unwrap_or(header))
}

/// Delegates token checks to the external verification endpoint.
pub struct TokenVerifier {
    verify_url: String,
    client: reqwest::Client,
}

impl TokenVerifier {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.verify_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(TokenVerifier {
            verify_url: config.jwt_verify_url.clone(),
            client: builder.build()?,
        })
    }

    pub async fn verify(&self, token: &str) -> AuthDecision {
        let response = self
            .client
            .post(&self.verify_url)
            .bearer_auth(token)
            .send()
            .await;

        match response {
            Ok(r) if r.status() == StatusCode::OK => AuthDecision::Allowed,
            Ok(r) => {
                tracing::info!("Verification endpoint rejected token: {}", r.status());
                AuthDecision::Denied
            }
            Err(e) => {
                tracing::warn!(
                    "Verification endpoint {} unreachable: {}",
                    self.verify_url,
                    e
                );
                AuthDecision::Denied
            }
        }
    }
}

/// Gate placed in front of the relay route: nothing downstream runs unless
/// the verification endpoint accepted the caller's token.
pub async fn require_bearer(
    State(verifier): State<Arc<TokenVerifier>>,
    request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_owned);

    let Some(token) = token else {
        tracing::debug!("Request without credential rejected");
        return ApiError::Unauthorized.into_response();
    };

    match verifier.verify(&token).await {
        AuthDecision::Allowed => next.run(request).await,
        AuthDecision::Denied => ApiError::Unauthorized.into_response(),
    }
}


#[cfg(test)]
mod tests {
    use super::{testing::*, *};

    fn config(verify_url: &str) -> Config {
        Config {
            jwt_verify_url: verify_url.to_string(),
            smtp_host: "127.0.0.1".into(),
            smtp_port: 2525,
            smtp_user: String::new(),
            smtp_pass: String::new(),
            port: 8080,
            verify_timeout: Some(std::time::Duration::from_secs(2)),
            smtp_timeout: None,
        }
    }

    #[test]
    fn strips_bearer_prefix_case_sensitively() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("bearer abc"));
        assert_eq!(bearer_token("abc"), Some("abc"));
        assert_eq!(bearer_token(""), None);
    }

    #[tokio::test]
    async fn allows_only_when_endpoint_returns_ok() {
        let stub = spawn_stub_verifier().await;
        let verifier = TokenVerifier::new(&config(&stub.url)).unwrap();

        assert_eq!(verifier.verify(GOOD_TOKEN).await, AuthDecision::Allowed);
        assert_eq!(verifier.verify("bad-token").await, AuthDecision::Denied);
        assert_eq!(stub.hits(), 2);
    }

    #[tokio::test]
    async fn unreachable_endpoint_denies() {
        let verifier = TokenVerifier::new(&config("http://127.0.0.1:1/verify")).unwrap();
        assert_eq!(verifier.verify(GOOD_TOKEN).await, AuthDecision::Denied);
    }
}
