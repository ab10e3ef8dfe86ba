pub mod control;
pub mod diagnostics;
pub mod endpoint;
pub mod error;
pub mod history;
pub mod metrics;
pub mod rate_limit;
pub mod response;
pub mod sites;
pub mod token;
pub mod unsupported;

use crate::model::{ApiUsage, RateLimitConfig, SiteId};
use chrono::{DateTime, Utc};
use diagnostics::{Diagnostics, NoopDiagnostics};
use endpoint::Endpoint;
pub use error::{Error, ErrorKind, Result, TokenKind};
use http::header::{ACCEPT, RETRY_AFTER, USER_AGENT};
use http::{Method, StatusCode};
use metrics::ClientMetrics;
use rate_limit::{RateLimiter, RequestClass};
use response::token::TokenGrant;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use token::TokenState;
use tokio::sync::Mutex;

pub const API_URL: &str = "https://fleet-api.prd.na.vn.cloud.tesla.com";
pub const AUTH_URL: &str = "https://fleet-auth.prd.vn.cloud.tesla.com/oauth2/v3/token";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Assumed when a 429 carries no usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

const CLIENT_USER_AGENT: &str = concat!("powerwall-fleet-rs/", env!("CARGO_PKG_VERSION"));

/// Authenticated, rate-limited session against the Fleet API for one account.
///
/// Requests take `&self`, so one client can be shared between tasks (e.g. behind an
/// `Arc`). Token refreshes are serialized: whichever request notices the expired
/// token first refreshes it while the others wait for the result.
pub struct Client {
    http: reqwest::Client,
    api_url: String,
    auth_url: String,
    client_id: String,
    site_id: SiteId,
    tokens: Mutex<TokenState>,
    limiter: RateLimiter,
    metrics: ClientMetrics,
    diagnostics: Arc<dyn Diagnostics>,
}

pub struct ClientBuilder {
    client_id: String,
    access_token: String,
    refresh_token: String,
    api_url: String,
    auth_url: String,
    timeout: Duration,
    rate_limit: RateLimitConfig,
    token_expiry: Option<DateTime<Utc>>,
    site_id: SiteId,
    diagnostics: Arc<dyn Diagnostics>,
    http_client: Option<reqwest::Client>,
}

impl ClientBuilder {
    pub fn api_url<S: Into<String>>(mut self, url: S) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn auth_url<S: Into<String>>(mut self, url: S) -> Self {
        self.auth_url = url.into();
        self
    }

    /// Total timeout of each HTTP exchange. Ignored when [`Self::http_client`] is set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn rate_limit_config(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Known expiry of the access token. Without it the first request refreshes.
    pub fn token_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.token_expiry = Some(expiry);
        self
    }

    pub fn site_id(mut self, site_id: SiteId) -> Self {
        self.site_id = site_id;
        self
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<Client> {
        let http = match self.http_client {
            Some(client) => client,
            None => reqwest::ClientBuilder::new().timeout(self.timeout).build()?,
        };

        let client = Client {
            http,
            api_url: self.api_url.trim_end_matches('/').to_owned(),
            auth_url: self.auth_url,
            client_id: self.client_id,
            site_id: self.site_id,
            tokens: Mutex::new(TokenState::new(
                self.access_token,
                self.refresh_token,
                self.token_expiry,
            )),
            limiter: RateLimiter::new(self.rate_limit),
            metrics: ClientMetrics::new()?,
            diagnostics: self.diagnostics,
        };
        client.trace("New Fleet API client created");
        Ok(client)
    }
}

impl Client {
    pub fn builder<S: Into<String>>(client_id: S, access_token: S, refresh_token: S) -> ClientBuilder {
        ClientBuilder {
            client_id: client_id.into(),
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            api_url: API_URL.to_owned(),
            auth_url: AUTH_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            rate_limit: RateLimitConfig::default(),
            token_expiry: None,
            site_id: 0,
            diagnostics: Arc::new(NoopDiagnostics),
            http_client: None,
        }
    }

    /// Client with default settings; its first request refreshes the access token.
    pub fn new<S: Into<String>>(client_id: S, access_token: S, refresh_token: S) -> Result<Self> {
        Client::builder(client_id, access_token, refresh_token).build()
    }

    fn trace(&self, message: &str) {
        self.diagnostics
            .trace(&format!("{{FleetAPI {:p}}} {}", self, message));
    }

    /* Energy site selection */

    pub fn select_energy_site(&mut self, site_id: SiteId) {
        self.site_id = site_id;
        self.trace(&format!("Selected energy site {}", site_id));
    }

    pub fn selected_energy_site(&self) -> Option<SiteId> {
        if self.site_id == 0 {
            None
        } else {
            Some(self.site_id)
        }
    }

    pub(crate) fn require_site(&self) -> Result<SiteId> {
        self.selected_energy_site().ok_or(Error::NoSiteSelected)
    }

    /* Tokens */

    pub async fn access_token(&self) -> String {
        self.tokens.lock().await.access_token().to_owned()
    }

    /// Current refresh token; it may have been rotated by a refresh, so persist this one.
    pub async fn refresh_token(&self) -> String {
        self.tokens.lock().await.refresh_token().to_owned()
    }

    pub async fn token_expiry(&self) -> DateTime<Utc> {
        self.tokens.lock().await.expiry()
    }

    pub fn set_access_token<S: Into<String>>(&mut self, token: S) {
        self.tokens.get_mut().set_access_token(token.into());
        self.trace("Set access token");
    }

    pub fn set_refresh_token<S: Into<String>>(&mut self, token: S) {
        self.tokens.get_mut().set_refresh_token(token.into());
        self.trace("Set refresh token");
    }

    pub fn set_token_expiry(&mut self, expiry: DateTime<Utc>) {
        self.tokens.get_mut().set_expiry(expiry);
    }

    pub async fn is_token_expired(&self) -> bool {
        self.tokens.lock().await.is_expired_at(Utc::now())
    }

    /// Exchange the refresh token for a new access token regardless of the current expiry.
    pub async fn refresh_access_token(&self) -> Result<()> {
        let mut tokens = self.tokens.lock().await;
        self.refresh(&mut tokens).await
    }

    async fn refresh(&self, tokens: &mut TokenState) -> Result<()> {
        self.trace(&format!(
            "Refreshing OAuth access token using client_id: {}",
            self.client_id
        ));

        match self.exchange_refresh_token(tokens.refresh_token()).await {
            Ok(grant) => {
                tokens.apply(grant, Utc::now());
                self.metrics.token_refreshed(metrics::REFRESH_OK);
                self.trace(&format!(
                    "Token refresh successful, expires at {}",
                    tokens.expiry().to_rfc3339()
                ));
                Ok(())
            }
            Err(e) => {
                self.metrics.token_refreshed(metrics::REFRESH_FAILED);
                Err(e)
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<TokenGrant> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];

        let response = self
            .http
            .post(&self.auth_url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .form(&form)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status != StatusCode::OK {
            self.trace(&format!(
                "Token refresh failed: status={} body={}",
                status.as_u16(),
                String::from_utf8_lossy(&body)
            ));
            return Err(Error::TokenExpired {
                token: TokenKind::Refresh,
                expires_at: Utc::now(),
            });
        }

        self.decode("token_refresh", &body)
    }

    /* Rate limiting and usage */

    /// Set the ceiling for data reads, in requests per minute. 0 disables pacing.
    ///
    /// Only GET requests are paced by this tier. Commands (POST) keep
    /// `commands_rpm`, which is changed with [`Client::set_commands_rate_limit`].
    pub async fn set_rate_limit(&self, rpm: u32) {
        self.limiter.set_limit(RequestClass::RealtimeData, rpm).await;
        self.trace(&format!("Set rate limit to {} requests per minute", rpm));
    }

    pub async fn set_commands_rate_limit(&self, rpm: u32) {
        self.limiter.set_limit(RequestClass::Command, rpm).await;
        self.trace(&format!("Set command rate limit to {} requests per minute", rpm));
    }

    pub async fn rate_limit_config(&self) -> RateLimitConfig {
        self.limiter.config().await
    }

    pub fn api_usage_stats(&self) -> ApiUsage {
        self.metrics.usage()
    }

    /// Client counters in the Prometheus text exposition format.
    pub fn metrics_text(&self) -> Result<String> {
        self.metrics.read()
    }

    /* Request pipeline */

    /// Send one authenticated request and return the raw body of a 200/201 response,
    /// together with the endpoint and its encoded query as sent.
    pub(crate) async fn do_request(
        &self,
        method: Method,
        endpoint: &Endpoint,
        query: &[(&str, &str)],
        payload: Option<&Value>,
    ) -> Result<(String, Vec<u8>)> {
        let class = RequestClass::for_method(&method);
        let waited = self.limiter.wait(class).await;
        if !waited.is_zero() {
            self.trace(&format!(
                "Rate limiting: waited {:?} before next request",
                waited
            ));
        }
        self.metrics.rate_limit_waited(waited.as_secs_f64());

        let (access_token, expires_at) = {
            let mut tokens = self.tokens.lock().await;
            if tokens.is_expired_at(Utc::now()) {
                self.trace("Access token expired, refreshing...");
                self.refresh(&mut tokens).await?;
            }
            (tokens.access_token().to_owned(), tokens.expiry())
        };

        let mut builder = self
            .http
            .request(method.clone(), format!("{}{}", self.api_url, endpoint))
            .bearer_auth(access_token)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header(ACCEPT, "application/json");
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(payload) = payload {
            builder = builder.json(payload);
        }
        let request = builder.build()?;
        let url = request.url().to_string();
        let target = match request.url().query() {
            Some(query) => format!("{}?{}", endpoint, query),
            None => endpoint.to_owned(),
        };

        self.trace(&format!("Fleet API request: method={} url={}", method, url));
        self.metrics.request_sent();

        let response = self.http.execute(request).await?;
        let status = response.status();
        self.metrics.response_received(method.as_str(), status.as_u16());

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.bytes().await?.to_vec();

        match status {
            StatusCode::OK | StatusCode::CREATED => {
                self.trace(&format!(
                    "Fleet API request successful: status={}",
                    status.as_u16()
                ));
                Ok((target, body))
            }
            StatusCode::UNAUTHORIZED => {
                self.trace(&format!(
                    "Fleet API authentication failed: status={} body={}",
                    status.as_u16(),
                    String::from_utf8_lossy(&body)
                ));
                Err(Error::TokenExpired {
                    token: TokenKind::Access,
                    expires_at,
                })
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                log::warn!("Fleet API rate limited on {}, retry after {}s", target, retry_after);

                let now = Utc::now();
                let reset_time = i64::try_from(retry_after)
                    .ok()
                    .and_then(chrono::Duration::try_seconds)
                    .and_then(|d| now.checked_add_signed(d))
                    .unwrap_or(now);
                Err(Error::RateLimited {
                    endpoint: target,
                    limit: self.limiter.limit(class).await,
                    remaining: 0,
                    reset_time,
                    retry_after,
                })
            }
            _ => {
                self.trace(&format!(
                    "Fleet API request failed: status={} body={}",
                    status.as_u16(),
                    String::from_utf8_lossy(&body)
                ));
                Err(Error::Api {
                    url,
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let (target, body) = self.do_request(Method::GET, endpoint, query, None).await?;
        self.decode(&target, &body)
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        payload: &Value,
    ) -> Result<T> {
        let (target, body) = self
            .do_request(Method::POST, endpoint, &[], Some(payload))
            .await?;
        self.decode(&target, &body)
    }

    fn decode<T: DeserializeOwned>(&self, endpoint: &Endpoint, body: &[u8]) -> Result<T> {
        log::trace!(
            "endpoint: {}, response_text: {}",
            endpoint,
            String::from_utf8_lossy(body)
        );

        serde_json::from_slice(body).map_err(|source| {
            self.diagnostics.error(
                &format!(
                    "Error unmarshalling Fleet API '{}' response {}",
                    endpoint,
                    String::from_utf8_lossy(body)
                ),
                &source,
            );
            Error::Decode {
                endpoint: endpoint.to_owned(),
                source,
            }
        })
    }
}
