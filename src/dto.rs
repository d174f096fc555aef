use serde::{Deserialize, Serialize};

/// Body of `POST /send-email`. Absent fields fall back to empty strings,
/// the relay is left to reject addresses it cannot use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendEmailRequest {
    pub to: String,
    pub subject: String,
    pub message: String,
}

impl SendEmailRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailResponse {
    pub status: String,
}
