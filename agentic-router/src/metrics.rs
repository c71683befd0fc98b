//! Per-provider running counters and static descriptors.

use std::time::{SystemTime, UNIX_EPOCH};

/// Static metadata about a registered provider.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    /// Provider name, as registered in the router.
    pub name: String,
    /// Higher priority wins ties in the fallback routing rule.
    pub priority: u32,
    /// Model identifiers this provider can serve.
    pub models: Vec<String>,
    /// Capability tags advertised per model (e.g. `code`, `reasoning`,
    /// `fast`, `large-context`), keyed by model identifier.
    pub model_capabilities: std::collections::HashMap<String, Vec<String>>,
    /// Whether the provider is administratively enabled.
    pub enabled: bool,
}

impl ProviderDescriptor {
    /// Create a descriptor with no models or capability tags declared yet.
    pub fn new(name: impl Into<String>, priority: u32) -> Self {
        Self {
            name: name.into(),
            priority,
            models: Vec::new(),
            model_capabilities: std::collections::HashMap::new(),
            enabled: true,
        }
    }

    /// Declare a model this provider serves, with its capability tags.
    pub fn with_model(mut self, model: impl Into<String>, capabilities: &[&str]) -> Self {
        let model = model.into();
        self.model_capabilities.insert(
            model.clone(),
            capabilities.iter().map(|c| c.to_string()).collect(),
        );
        self.models.push(model);
        self
    }

    /// Whether any declared model advertises all of `required`.
    pub fn supports_all(&self, required: &[String]) -> bool {
        self.models.iter().any(|model| {
            let tags = self
                .model_capabilities
                .get(model)
                .map(|v| v.as_slice())
                .unwrap_or(&[]);
            required.iter().all(|r| tags.iter().any(|t| t == r))
        })
    }
}

/// Running per-provider counters, updated under a mutex after every request.
#[derive(Debug, Clone, Default)]
pub struct ProviderMetrics {
    /// Total requests attempted.
    pub total_requests: u64,
    /// Requests that completed successfully.
    pub successful_requests: u64,
    /// Requests that failed.
    pub failed_requests: u64,
    /// Sum of all observed response times, in seconds.
    total_response_time_secs: f64,
    /// Unix timestamp (seconds) of the last request, if any.
    pub last_request_unix_secs: Option<i64>,
    /// Unix timestamp (seconds) this provider was first recorded.
    pub uptime_since_unix_secs: Option<i64>,
}

impl ProviderMetrics {
    /// Record the outcome of one request.
    pub fn record(&mut self, success: bool, elapsed_secs: f64) {
        self.record_at(success, elapsed_secs, now_unix_secs());
    }

    /// Record the outcome of one request at an explicit timestamp.
    /// Exposed for deterministic tests.
    pub fn record_at(&mut self, success: bool, elapsed_secs: f64, at_unix_secs: i64) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
        self.total_response_time_secs += elapsed_secs;
        self.last_request_unix_secs = Some(at_unix_secs);
        self.uptime_since_unix_secs.get_or_insert(at_unix_secs);
    }

    /// Fraction of requests that succeeded, in `[0, 1]`. `1.0` if no
    /// requests have been recorded yet (optimistic default).
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            1.0
        } else {
            self.successful_requests as f64 / self.total_requests as f64
        }
    }

    /// Fraction of requests that failed, in `[0, 1]`.
    pub fn error_rate(&self) -> f64 {
        1.0 - self.success_rate()
    }

    /// Moving (here: cumulative) average response time, in seconds.
    pub fn avg_response_time_secs(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.total_response_time_secs / self.total_requests as f64
        }
    }
}

pub(crate) fn now_unix_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
