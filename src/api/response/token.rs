use serde::Deserialize;

/// Body of a successful `grant_type=refresh_token` exchange.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct TokenGrant {
    pub access_token: String,
    /// Absent when the upstream keeps the current refresh token
    pub refresh_token: Option<String>,
    /// Seconds
    pub expires_in: i64,
    pub token_type: String,
}
