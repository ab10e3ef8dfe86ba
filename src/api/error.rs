use crate::model::SiteId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Which OAuth token an [`Error::TokenExpired`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminant of [`Error`], for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Api,
    AuthFailure,
    TokenExpired,
    RateLimited,
    Unsupported,
    EnergySite,
    Precondition,
    Decode,
    Transport,
    Internal,
}

#[derive(Debug, Error)]
pub enum Error {
    /// Upstream answered with a status the client has no specific mapping for.
    /// `body` holds the response bytes as received.
    #[error(
        "API call to {url} returned unexpected status code {status} ({:?})",
        String::from_utf8_lossy(.body)
    )]
    Api {
        url: String,
        status: u16,
        body: Vec<u8>,
    },

    #[error("Authentication Failed: {error_text} ({message})")]
    AuthFailure {
        url: String,
        error_text: String,
        message: String,
    },

    /// The access token was rejected (HTTP 401) or the refresh token could not be exchanged.
    #[error("OAuth token expired: {token} token expired at {}", .expires_at.to_rfc3339())]
    TokenExpired {
        token: TokenKind,
        expires_at: DateTime<Utc>,
    },

    #[error(
        "Rate limit exceeded for {endpoint}: {remaining}/{limit} remaining, resets at {} (retry after {retry_after}s)",
        .reset_time.to_rfc3339()
    )]
    RateLimited {
        endpoint: String,
        limit: u32,
        remaining: u32,
        reset_time: DateTime<Utc>,
        /// Seconds
        retry_after: u64,
    },

    /// Local gateway operation without a Fleet API equivalent. Never hits the network.
    #[error("Operation '{operation}' not supported: {reason}")]
    Unsupported {
        operation: &'static str,
        reason: &'static str,
    },

    #[error("Energy site {site_id} error ({error_type}): {message}")]
    EnergySite {
        site_id: SiteId,
        error_type: String,
        message: String,
    },

    #[error("no energy site selected - call select_energy_site() first")]
    NoSiteSelected,

    #[error("{message}")]
    InvalidArgument {
        field: &'static str,
        message: String,
    },

    #[error("Error unmarshalling Fleet API '{endpoint}' response: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },

    /// Connection, TLS or timeout failure below HTTP; the cause is opaque to the client.
    #[error("Fleet API transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Api { .. } => ErrorKind::Api,
            Error::AuthFailure { .. } => ErrorKind::AuthFailure,
            Error::TokenExpired { .. } => ErrorKind::TokenExpired,
            Error::RateLimited { .. } => ErrorKind::RateLimited,
            Error::Unsupported { .. } => ErrorKind::Unsupported,
            Error::EnergySite { .. } => ErrorKind::EnergySite,
            Error::NoSiteSelected | Error::InvalidArgument { .. } => ErrorKind::Precondition,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn invalid_argument<S: Into<String>>(field: &'static str, message: S) -> Self {
        Error::InvalidArgument {
            field,
            message: message.into(),
        }
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Internal(format!("metrics registry: {}", err))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn token_expired_display() {
        let err = Error::TokenExpired {
            token: TokenKind::Refresh,
            expires_at: Utc.with_ymd_and_hms(2024, 1, 2, 22, 4, 5).unwrap(),
        };
        assert_eq!(
            "OAuth token expired: refresh token expired at 2024-01-02T22:04:05+00:00",
            err.to_string()
        );
        assert_eq!(ErrorKind::TokenExpired, err.kind());
    }

    #[test]
    fn rate_limited_display() {
        let err = Error::RateLimited {
            endpoint: "/api/1/products".to_owned(),
            limit: 60,
            remaining: 0,
            reset_time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 30).unwrap(),
            retry_after: 30,
        };
        assert_eq!(
            "Rate limit exceeded for /api/1/products: 0/60 remaining, resets at 2024-01-02T00:00:30+00:00 (retry after 30s)",
            err.to_string()
        );
    }

    #[test]
    fn api_error_quotes_body() {
        let err = Error::Api {
            url: "https://example.test/api/1/products".to_owned(),
            status: 500,
            body: b"{\"error\":\"boom\"}".to_vec(),
        };
        assert_eq!(
            "API call to https://example.test/api/1/products returned unexpected status code 500 (\"{\\\"error\\\":\\\"boom\\\"}\")",
            err.to_string()
        );
        assert_eq!(ErrorKind::Api, err.kind());
    }

    #[test]
    fn api_error_displays_invalid_utf8_lossily() {
        let err = Error::Api {
            url: "https://example.test/api/1/products".to_owned(),
            status: 502,
            body: vec![0x7b, 0xff, 0xfe, 0x7d],
        };
        assert!(err.to_string().ends_with("(\"{\u{fffd}\u{fffd}}\")"));
    }

    #[test]
    fn local_failures_are_preconditions() {
        assert_eq!(ErrorKind::Precondition, Error::NoSiteSelected.kind());
        let err = Error::invalid_argument("period", "invalid period: fortnight");
        assert_eq!(ErrorKind::Precondition, err.kind());
        assert_eq!("invalid period: fortnight", err.to_string());
    }

    #[test]
    fn site_scoped_and_auth_failures() {
        let err = Error::EnergySite {
            site_id: 42,
            error_type: "offline".to_owned(),
            message: "gateway unreachable".to_owned(),
        };
        assert_eq!("Energy site 42 error (offline): gateway unreachable", err.to_string());
        assert_eq!(ErrorKind::EnergySite, err.kind());

        let err = Error::AuthFailure {
            url: "https://auth.example.test/token".to_owned(),
            error_text: "invalid_grant".to_owned(),
            message: "refresh token revoked".to_owned(),
        };
        assert_eq!("Authentication Failed: invalid_grant (refresh token revoked)", err.to_string());
        assert_eq!(ErrorKind::AuthFailure, err.kind());
    }

    #[test]
    fn unsupported_display() {
        let err = Error::Unsupported {
            operation: "networks",
            reason: "Fleet API does not expose local network configuration",
        };
        assert_eq!(
            "Operation 'networks' not supported: Fleet API does not expose local network configuration",
            err.to_string()
        );
    }
}
