//! The provider router itself: capability-scored selection and failover.

use crate::adapter::AskCapable;
use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::metrics::{now_unix_secs, ProviderMetrics};
use neuron_turn::ProviderMessage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

/// How demanding the caller expects the request to be. Declaring `Low`
/// is what makes the fast-path routing rule eligible to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Complexity {
    /// A quick, simple request; prefer the lowest-latency provider.
    Low,
    /// No particular latency preference (the default).
    #[default]
    Normal,
    /// A demanding request; skip the fast-path rule entirely.
    High,
}

/// Caller-supplied hints that narrow provider selection.
#[derive(Debug, Clone, Default)]
pub struct AskContext {
    /// Capability tags the selected model must advertise (e.g. `code`).
    pub required_capabilities: Vec<String>,
    /// Provider name to use, bypassing routing rules entirely.
    pub pinned_provider: Option<String>,
    /// The caller's declared complexity for this request. Only `Low`
    /// makes the fast-path rule eligible.
    pub complexity: Option<Complexity>,
}

/// A routing recommendation: which provider/model to use and how confident
/// the router is in that pick.
#[derive(Debug, Clone)]
pub struct Recommendation {
    /// Chosen provider name.
    pub provider: String,
    /// Chosen model, if the provider advertises one matching the request.
    pub model: Option<String>,
    /// Confidence in `[0, 1]`, derived from the provider's scoring inputs.
    pub confidence: f64,
}

struct Registered {
    provider: Arc<dyn AskCapable>,
}

/// Routes `ask` calls across registered providers using capability matching,
/// fast-path latency preference, and priority-ordered fallback, in that
/// order, per the router's three ordered selection rules.
pub struct ProviderRouter {
    providers: RwLock<HashMap<String, Registered>>,
    metrics: Mutex<HashMap<String, ProviderMetrics>>,
    config: RouterConfig,
    default_provider: RwLock<Option<String>>,
}

impl ProviderRouter {
    /// Create an empty router.
    pub fn new(config: RouterConfig) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            metrics: Mutex::new(HashMap::new()),
            config,
            default_provider: RwLock::new(None),
        }
    }

    /// Register a provider under its own `name()`. The first provider
    /// registered becomes the default.
    pub fn register(&self, provider: Arc<dyn AskCapable>) {
        let name = provider.name().to_string();
        let mut providers = self.providers.write().expect("router providers poisoned");
        providers.insert(name.clone(), Registered { provider });
        self.metrics
            .lock()
            .expect("router metrics poisoned")
            .entry(name.clone())
            .or_default();
        let mut default = self.default_provider.write().expect("router default poisoned");
        default.get_or_insert(name);
    }

    /// Explicitly set the default provider used when no rule and no pin
    /// select one.
    pub fn switch_provider(&self, name: &str) -> Result<(), RouterError> {
        let providers = self.providers.read().expect("router providers poisoned");
        if !providers.contains_key(name) {
            return Err(RouterError::UnknownProvider(name.to_string()));
        }
        *self.default_provider.write().expect("router default poisoned") = Some(name.to_string());
        Ok(())
    }

    /// Switch the default provider to whichever registered provider serves
    /// `model`.
    pub fn switch_model(&self, model: &str) -> Result<(), RouterError> {
        let providers = self.providers.read().expect("router providers poisoned");
        let hit = providers
            .values()
            .find(|r| r.provider.list_models().iter().any(|m| m.name == model))
            .map(|r| r.provider.name().to_string());
        drop(providers);
        match hit {
            Some(name) => self.switch_provider(&name),
            None => Err(RouterError::UnknownProvider(model.to_string())),
        }
    }

    /// Record the outcome of a completed request against a provider's
    /// metrics.
    pub fn record(&self, provider: &str, success: bool, elapsed_secs: f64) {
        let mut metrics = self.metrics.lock().expect("router metrics poisoned");
        metrics.entry(provider.to_string()).or_default().record(success, elapsed_secs);
    }

    fn score(&self, name: &str, metrics: &ProviderMetrics) -> f64 {
        let mut score = metrics.success_rate() * 100.0;
        let latency_penalty =
            (metrics.avg_response_time_secs() - self.config.scoring_latency_floor_secs).max(0.0) * 10.0;
        score -= latency_penalty;

        if let Some(last) = metrics.last_request_unix_secs {
            let age = now_unix_secs() - last;
            if age <= self.config.recency_bonus_window_secs {
                score += 5.0;
            } else if age >= self.config.recency_penalty_window_secs {
                score -= 5.0;
            }
        }

        score -= metrics.error_rate() * 50.0;
        tracing::trace!(provider = name, score, "scored provider");
        score
    }

    /// Select a provider name per the ordered routing rules: capability
    /// match, then fast-path latency among providers with enough samples,
    /// then priority fallback.
    pub fn select(&self, context: &AskContext) -> Option<String> {
        if let Some(pinned) = &context.pinned_provider {
            let providers = self.providers.read().expect("router providers poisoned");
            if providers.contains_key(pinned) {
                return Some(pinned.clone());
            }
            return None;
        }

        let providers = self.providers.read().expect("router providers poisoned");
        let metrics = self.metrics.lock().expect("router metrics poisoned");

        let mut candidates: Vec<&Registered> = providers
            .values()
            .filter(|r| r.provider.is_available())
            .collect();

        if !context.required_capabilities.is_empty() {
            candidates.retain(|r| r.provider.descriptor().supports_all(&context.required_capabilities));
        }

        if candidates.is_empty() {
            return None;
        }

        // Rule 2: fast-path — only eligible when the caller declares low
        // complexity; picks the lowest moving-average response time among
        // providers with enough samples to trust.
        if context.complexity == Some(Complexity::Low) {
            let fastest = candidates
                .iter()
                .filter(|r| {
                    metrics
                        .get(r.provider.name())
                        .map(|m| m.total_requests >= self.config.fast_path_min_samples as u64)
                        .unwrap_or(false)
                })
                .min_by(|a, b| {
                    let ta = metrics.get(a.provider.name()).map(|m| m.avg_response_time_secs()).unwrap_or(f64::MAX);
                    let tb = metrics.get(b.provider.name()).map(|m| m.avg_response_time_secs()).unwrap_or(f64::MAX);
                    ta.partial_cmp(&tb).unwrap_or(std::cmp::Ordering::Equal)
                });
            if let Some(r) = fastest {
                return Some(r.provider.name().to_string());
            }
        }

        // Rule 3: priority fallback — highest-priority available provider;
        // the blended score only breaks ties between equal priorities.
        candidates
            .into_iter()
            .max_by(|a, b| {
                a.provider
                    .descriptor()
                    .priority
                    .cmp(&b.provider.descriptor().priority)
                    .then_with(|| {
                        let sa =
                            self.score(a.provider.name(), metrics.get(a.provider.name()).unwrap_or(&ProviderMetrics::default()));
                        let sb =
                            self.score(b.provider.name(), metrics.get(b.provider.name()).unwrap_or(&ProviderMetrics::default()));
                        sa.partial_cmp(&sb).unwrap_or(std::cmp::Ordering::Equal)
                    })
            })
            .map(|r| r.provider.name().to_string())
            .or_else(|| self.default_provider.read().expect("router default poisoned").clone())
    }

    /// Produce a routing recommendation for `task_text` without sending a
    /// request.
    pub fn recommend(&self, task_text: &str) -> Option<Recommendation> {
        let mut context = AskContext::default();
        if task_text.to_lowercase().contains("code") {
            context.required_capabilities.push("code".to_string());
        }
        let provider_name = self.select(&context)?;
        let providers = self.providers.read().expect("router providers poisoned");
        let registered = providers.get(&provider_name)?;
        let model = registered.provider.list_models().into_iter().next().map(|m| m.name);
        let metrics = self.metrics.lock().expect("router metrics poisoned");
        let confidence = metrics
            .get(&provider_name)
            .map(|m| (self.score(&provider_name, m) / 100.0).clamp(0.0, 1.0))
            .unwrap_or(0.5);
        Some(Recommendation {
            provider: provider_name,
            model,
            confidence,
        })
    }

    /// Ask a specific provider (if `provider` is `Some`) or route via
    /// [`ProviderRouter::select`], retrying exactly once against a
    /// different provider on failure.
    pub async fn ask_via(
        &self,
        provider: Option<&str>,
        prompt: &str,
        history: &[ProviderMessage],
        context: &AskContext,
        model: Option<&str>,
    ) -> Result<String, RouterError> {
        let mut context = context.clone();
        if let Some(p) = provider {
            context.pinned_provider = Some(p.to_string());
        }

        let first = self.select(&context).ok_or(RouterError::NoProviderAvailable)?;
        match self.try_ask(&first, prompt, history, model).await {
            Ok(text) => Ok(text),
            Err(_) if provider.is_none() => {
                let mut retry_context = context.clone();
                retry_context.pinned_provider = None;
                let excluded = first.clone();
                let fallback = {
                    let providers = self.providers.read().expect("router providers poisoned");
                    providers
                        .keys()
                        .filter(|name| **name != excluded)
                        .cloned()
                        .collect::<Vec<_>>()
                };
                for candidate in fallback {
                    retry_context.pinned_provider = Some(candidate.clone());
                    if let Some(selected) = self.select(&retry_context) {
                        return self.try_ask(&selected, prompt, history, model).await;
                    }
                }
                Err(RouterError::NoProviderAvailable)
            }
            Err(e) => Err(e),
        }
    }

    async fn try_ask(
        &self,
        provider_name: &str,
        prompt: &str,
        history: &[ProviderMessage],
        model: Option<&str>,
    ) -> Result<String, RouterError> {
        let provider = {
            let providers = self.providers.read().expect("router providers poisoned");
            providers
                .get(provider_name)
                .map(|r| Arc::clone(&r.provider))
                .ok_or_else(|| RouterError::UnknownProvider(provider_name.to_string()))?
        };

        let start = Instant::now();
        let result = provider.ask(prompt, history, None, model).await;
        let elapsed = start.elapsed().as_secs_f64();
        self.record(provider_name, result.is_ok(), elapsed);
        result
    }
}
