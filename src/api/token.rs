use crate::api::response::token::TokenGrant;
use chrono::{DateTime, Duration, Utc};

/// Access tokens count as expired this long before their actual expiry.
pub const EXPIRY_MARGIN_SECS: i64 = 5 * 60;

/// OAuth tokens of one client session.
#[derive(Debug, Clone)]
pub struct TokenState {
    access_token: String,
    refresh_token: String,
    expiry: DateTime<Utc>,
}

impl TokenState {
    /// A session whose expiry is unknown counts as expired until the first refresh.
    pub fn new(access_token: String, refresh_token: String, expiry: Option<DateTime<Utc>>) -> Self {
        TokenState {
            access_token,
            refresh_token,
            expiry: expiry.unwrap_or_default(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    pub fn set_access_token(&mut self, token: String) {
        self.access_token = token;
    }

    pub fn set_refresh_token(&mut self, token: String) {
        self.refresh_token = token;
    }

    pub fn set_expiry(&mut self, expiry: DateTime<Utc>) {
        self.expiry = expiry;
    }

    /// True once `now` is within [`EXPIRY_MARGIN_SECS`] of the expiry, boundary included.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expiry
    }

    /// Store the result of a successful refresh. An absent or empty refresh token in
    /// the grant means the old one stays valid.
    pub(crate) fn apply(&mut self, grant: TokenGrant, now: DateTime<Utc>) {
        self.access_token = grant.access_token;
        if let Some(refresh_token) = grant.refresh_token.filter(|t| !t.is_empty()) {
            self.refresh_token = refresh_token;
        }
        self.expiry = Duration::try_seconds(grant.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(now);
    }
}
