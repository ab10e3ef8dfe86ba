//! Client-side request pacing.
//!
//! A single "last request" slot guarded by an async mutex: each request waits
//! until `60s / rpm` has passed since the previous one. The lock is held across
//! the wait, so concurrent callers queue up behind each other.

use crate::model::RateLimitConfig;
use http::Method;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Which upstream tier a request counts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Reads of live and historical data
    RealtimeData,
    /// Control commands
    Command,
}

impl RequestClass {
    pub fn for_method(method: &Method) -> Self {
        if *method == Method::GET {
            RequestClass::RealtimeData
        } else {
            RequestClass::Command
        }
    }
}

#[derive(Debug)]
struct LimiterState {
    config: RateLimitConfig,
    last_request: Option<Instant>,
}

#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<LimiterState>,
}

/// Minimum spacing for `rpm` requests per minute; 0 disables pacing.
pub fn min_interval(rpm: u32) -> Duration {
    if rpm == 0 {
        Duration::ZERO
    } else {
        Duration::from_secs(60) / rpm
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        RateLimiter {
            state: Mutex::new(LimiterState {
                config,
                last_request: None,
            }),
        }
    }

    /// Block until a request of `class` may go out and record it as sent.
    /// Returns how long the caller was held back.
    pub async fn wait(&self, class: RequestClass) -> Duration {
        let mut state = self.state.lock().await;
        let interval = min_interval(state.limit(class));

        let mut waited = Duration::ZERO;
        if let Some(last) = state.last_request {
            let elapsed = last.elapsed();
            if elapsed < interval {
                waited = interval - elapsed;
                sleep(waited).await;
            }
        }

        state.last_request = Some(Instant::now());
        waited
    }

    pub async fn config(&self) -> RateLimitConfig {
        self.state.lock().await.config
    }

    pub async fn limit(&self, class: RequestClass) -> u32 {
        self.state.lock().await.limit(class)
    }

    pub async fn set_limit(&self, class: RequestClass, rpm: u32) {
        let mut state = self.state.lock().await;
        match class {
            RequestClass::RealtimeData => state.config.realtime_data_rpm = rpm,
            RequestClass::Command => state.config.commands_rpm = rpm,
        }
    }
}

impl LimiterState {
    fn limit(&self, class: RequestClass) -> u32 {
        match class {
            RequestClass::RealtimeData => self.config.realtime_data_rpm,
            RequestClass::Command => self.config.commands_rpm,
        }
    }
}
