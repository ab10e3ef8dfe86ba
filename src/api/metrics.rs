use crate::api::error::Result;
use crate::model::ApiUsage;
use prometheus::{opts, Counter, Encoder, IntCounter, IntCounterVec, Registry, TextEncoder};

pub const REFRESH_OK: &str = "ok";
pub const REFRESH_FAILED: &str = "failed";

/// Per-client counters. Each client owns its registry so several clients in one
/// process never share numbers.
pub struct ClientMetrics {
    registry: Registry,
    requests: IntCounter,
    responses: IntCounterVec,
    token_refreshes: IntCounterVec,
    rate_limit_wait: Counter,
}

impl ClientMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new_custom(Some("powerwall_fleet".to_owned()), None)?;

        let requests = IntCounter::with_opts(opts!(
            "requests_total",
            "requests sent to the Fleet API, token refreshes excluded",
        ))?;
        let responses = IntCounterVec::new(
            opts!("responses_total", "Fleet API responses by HTTP status"),
            &["method", "status"],
        )?;
        let token_refreshes = IntCounterVec::new(
            opts!("token_refreshes_total", "OAuth refresh attempts by outcome"),
            &["outcome"],
        )?;
        let rate_limit_wait = Counter::with_opts(opts!(
            "rate_limit_wait_seconds_total",
            "time spent waiting on the client-side rate limiter",
        ))?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(responses.clone()))?;
        registry.register(Box::new(token_refreshes.clone()))?;
        registry.register(Box::new(rate_limit_wait.clone()))?;

        Ok(ClientMetrics {
            registry,
            requests,
            responses,
            token_refreshes,
            rate_limit_wait,
        })
    }

    pub fn request_sent(&self) {
        self.requests.inc();
    }

    pub fn response_received(&self, method: &str, status: u16) {
        self.responses
            .with_label_values(&[method, &status.to_string()])
            .inc();
    }

    pub fn token_refreshed(&self, outcome: &str) {
        self.token_refreshes.with_label_values(&[outcome]).inc();
    }

    pub fn rate_limit_waited(&self, seconds: f64) {
        if seconds > 0.0 {
            self.rate_limit_wait.inc_by(seconds);
        }
    }

    pub fn usage(&self) -> ApiUsage {
        ApiUsage {
            request_count: self.requests.get(),
            token_refreshes: self.token_refreshes.with_label_values(&[REFRESH_OK]).get(),
            rate_limit_wait_seconds: self.rate_limit_wait.get(),
        }
    }

    /// Render every counter in the Prometheus text exposition format.
    pub fn read(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| crate::api::Error::Internal(format!("metrics are not UTF-8: {}", e)))
    }
}
