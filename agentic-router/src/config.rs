//! Construction-time configuration for the provider router.

/// Static configuration for a [`crate::ProviderRouter`].
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Minimum sample count before a provider's moving-average response
    /// time is trusted by the fast-path routing rule.
    pub fast_path_min_samples: u32,
    /// Response time, in seconds, above which the scoring formula starts
    /// penalising a provider.
    pub scoring_latency_floor_secs: f64,
    /// Age, in seconds, under which a provider's last request counts as
    /// "recent" for the scoring formula's recency bonus.
    pub recency_bonus_window_secs: i64,
    /// Age, in seconds, beyond which a provider's last request counts as
    /// "stale" for the scoring formula's recency penalty.
    pub recency_penalty_window_secs: i64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            fast_path_min_samples: 3,
            scoring_latency_floor_secs: 2.0,
            recency_bonus_window_secs: 3600,
            recency_penalty_window_secs: 86_400,
        }
    }
}
