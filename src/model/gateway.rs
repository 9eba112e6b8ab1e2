//! Provider gateway: ordered failover across model backends.
//!
//! Backends are tried in priority order. Transient failures (network, 5xx,
//! timeout) are retried against the same backend with exponential backoff;
//! rate-limit and auth failures mark the backend's health and move on. The
//! first usable response short-circuits the rest. Only total exhaustion
//! surfaces as an error.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep, Instant};

use crate::model::provider::ProviderId;
use crate::model::traits::ModelBackend;
use crate::model::types::{GenerateRequest, ModelError, StructuredCall};

const DEFAULT_RETRY_ATTEMPTS: u32 = 2;
const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(500);
const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Health of a single backend. In-memory only; reset on process restart.
#[derive(Debug, Clone)]
pub enum HealthStatus {
    Available,
    RateLimited { until: Instant },
    Unavailable { reason: String },
}

#[derive(Debug, Clone)]
struct ProviderHealth {
    status: HealthStatus,
    consecutive_failures: u32,
}

impl Default for ProviderHealth {
    fn default() -> Self {
        Self {
            status: HealthStatus::Available,
            consecutive_failures: 0,
        }
    }
}

/// Snapshot of one provider's health, for status reporting.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProviderStatus {
    pub provider: ProviderId,
    pub status: String,
    pub consecutive_failures: u32,
}

/// Successful gateway result: which provider answered, its free text, and
/// an optional structured call.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub provider: ProviderId,
    pub content: String,
    pub call: Option<StructuredCall>,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("all providers failed: {last_error}")]
    AllProvidersFailed { last_error: String },
}

pub struct ProviderGateway {
    backends: Vec<Box<dyn ModelBackend>>,
    health: Mutex<HashMap<ProviderId, ProviderHealth>>,
    retry_attempts: u32,
    base_backoff: Duration,
}

impl ProviderGateway {
    /// Build a gateway over backends in failover priority order.
    pub fn new(backends: Vec<Box<dyn ModelBackend>>) -> Self {
        Self {
            backends,
            health: Mutex::new(HashMap::new()),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            base_backoff: DEFAULT_BASE_BACKOFF,
        }
    }

    /// Override the per-provider retry policy.
    pub fn with_retry_policy(mut self, retry_attempts: u32, base_backoff: Duration) -> Self {
        self.retry_attempts = retry_attempts.max(1);
        self.base_backoff = base_backoff;
        self
    }

    /// Try each healthy backend in order until one produces a response.
    pub async fn generate(&self, req: &GenerateRequest) -> Result<GatewayResponse, GatewayError> {
        let mut last_error: Option<String> = None;

        for backend in &self.backends {
            let id = backend.id();
            if !self.ready(id) {
                tracing::debug!(provider = %id, "skipping backend, not healthy");
                continue;
            }

            for attempt in 0..self.retry_attempts {
                tracing::debug!(provider = %id, attempt, "invoking backend");
                match backend.invoke(req).await {
                    Ok(response) => {
                        self.mark_success(id);
                        tracing::info!(
                            provider = %id,
                            structured = response.call.is_some(),
                            "backend responded"
                        );
                        return Ok(GatewayResponse {
                            provider: id,
                            content: response.content,
                            call: response.call,
                        });
                    }
                    Err(err) => {
                        tracing::warn!(provider = %id, error = %err, "backend call failed");
                        last_error = Some(format!("{id}: {err}"));
                        match err {
                            ModelError::RateLimited { retry_after } => {
                                self.mark_rate_limited(id, retry_after);
                                break;
                            }
                            ModelError::Auth(reason) => {
                                self.mark_unavailable(id, reason);
                                break;
                            }
                            e if e.is_transient() => {
                                self.mark_failure(id);
                                if attempt + 1 < self.retry_attempts {
                                    sleep(self.backoff_delay(attempt)).await;
                                }
                            }
                            _ => {
                                self.mark_failure(id);
                                break;
                            }
                        }
                    }
                }
            }
        }

        Err(GatewayError::AllProvidersFailed {
            last_error: last_error.unwrap_or_else(|| "no backends configured".to_string()),
        })
    }

    /// Per-provider health snapshot, in failover order.
    pub fn provider_status(&self) -> Vec<ProviderStatus> {
        let guard = self.health.lock().expect("gateway health mutex poisoned");
        self.backends
            .iter()
            .map(|backend| {
                let id = backend.id();
                let health = guard.get(&id).cloned().unwrap_or_default();
                let status = match health.status {
                    HealthStatus::Available => "available".to_string(),
                    HealthStatus::RateLimited { until } => {
                        let remaining = until.saturating_duration_since(Instant::now());
                        format!("rate limited for {}s", remaining.as_secs())
                    }
                    HealthStatus::Unavailable { reason } => format!("unavailable: {reason}"),
                };
                ProviderStatus {
                    provider: id,
                    status,
                    consecutive_failures: health.consecutive_failures,
                }
            })
            .collect()
    }

    fn ready(&self, id: ProviderId) -> bool {
        let mut guard = self.health.lock().expect("gateway health mutex poisoned");
        let health = guard.entry(id).or_default();
        match health.status {
            HealthStatus::Available => true,
            HealthStatus::RateLimited { until } => {
                if Instant::now() >= until {
                    health.status = HealthStatus::Available;
                    true
                } else {
                    false
                }
            }
            HealthStatus::Unavailable { .. } => false,
        }
    }

    fn mark_success(&self, id: ProviderId) {
        let mut guard = self.health.lock().expect("gateway health mutex poisoned");
        let health = guard.entry(id).or_default();
        health.status = HealthStatus::Available;
        health.consecutive_failures = 0;
    }

    fn mark_failure(&self, id: ProviderId) {
        let mut guard = self.health.lock().expect("gateway health mutex poisoned");
        guard.entry(id).or_default().consecutive_failures += 1;
    }

    fn mark_rate_limited(&self, id: ProviderId, retry_after: Option<Duration>) {
        let window = retry_after.unwrap_or(DEFAULT_RATE_LIMIT_WINDOW);
        let mut guard = self.health.lock().expect("gateway health mutex poisoned");
        let health = guard.entry(id).or_default();
        health.status = HealthStatus::RateLimited {
            until: Instant::now() + window,
        };
        health.consecutive_failures += 1;
        tracing::info!(provider = %id, window_secs = window.as_secs(), "backend rate limited");
    }

    fn mark_unavailable(&self, id: ProviderId, reason: String) {
        let mut guard = self.health.lock().expect("gateway health mutex poisoned");
        let health = guard.entry(id).or_default();
        tracing::warn!(provider = %id, reason = %reason, "backend marked unavailable");
        health.status = HealthStatus::Unavailable { reason };
        health.consecutive_failures += 1;
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..100));
        self.base_backoff * 2u32.saturating_pow(attempt) + jitter
    }
}
