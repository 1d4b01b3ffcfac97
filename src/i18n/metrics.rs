//! Translation metrics and observability module.
//!
//! Tracks how translation requests were satisfied (memo, store, provider, or
//! bypass) and how the provider and store behaved. One instance is owned by
//! each `Translator` so independent translators never share counters.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for translation operations.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Distinct keys satisfied from the in-process memo cache
    memo_hits: AtomicUsize,

    /// Distinct keys satisfied from the persistent cache store
    store_hits: AtomicUsize,

    /// Distinct keys found in neither cache tier
    cache_misses: AtomicUsize,

    /// Requests short-circuited because the target is the source locale
    bypasses: AtomicUsize,

    /// `TranslationProvider::translate` invocations, one per locale per batch.
    /// The HTTP adapter may split one invocation into several requests.
    provider_calls: AtomicUsize,

    /// Texts submitted to the translation provider
    provider_texts: AtomicUsize,

    /// Provider calls that failed
    provider_failures: AtomicUsize,

    /// Store reads or writes that failed
    store_failures: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_memo_hits(&self, count: usize) {
        self.memo_hits.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_store_hits(&self, count: usize) {
        self.store_hits.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_cache_misses(&self, count: usize) {
        self.cache_misses.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_bypass(&self) {
        self.bypasses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one provider request carrying `texts` strings.
    pub fn record_provider_call(&self, texts: usize) {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
        self.provider_texts.fetch_add(texts, Ordering::Relaxed);
    }

    pub fn record_provider_failure(&self) {
        self.provider_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn memo_hits(&self) -> usize {
        self.memo_hits.load(Ordering::Relaxed)
    }

    pub fn store_hits(&self) -> usize {
        self.store_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn bypasses(&self) -> usize {
        self.bypasses.load(Ordering::Relaxed)
    }

    pub fn provider_calls(&self) -> usize {
        self.provider_calls.load(Ordering::Relaxed)
    }

    pub fn provider_texts(&self) -> usize {
        self.provider_texts.load(Ordering::Relaxed)
    }

    pub fn provider_failures(&self) -> usize {
        self.provider_failures.load(Ordering::Relaxed)
    }

    pub fn store_failures(&self) -> usize {
        self.store_failures.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let memo_hits = self.memo_hits();
        let store_hits = self.store_hits();
        let misses = self.cache_misses();
        let hits = memo_hits + store_hits;
        let total_cache_queries = hits + misses;
        let cache_hit_rate = if total_cache_queries > 0 {
            (hits as f64 / total_cache_queries as f64) * 100.0
        } else {
            0.0
        };

        let calls = self.provider_calls();
        let failures = self.provider_failures();
        let provider_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            memo_hits,
            store_hits,
            cache_misses: misses,
            cache_hit_rate,
            bypasses: self.bypasses(),
            provider_calls: calls,
            provider_texts: self.provider_texts(),
            provider_failures: failures,
            provider_success_rate,
            store_failures: self.store_failures(),
        }
    }
}

/// Metrics report containing current translation statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub memo_hits: usize,
    pub store_hits: usize,
    pub cache_misses: usize,

    /// Cache hit rate across both tiers as a percentage (0-100)
    pub cache_hit_rate: f64,

    pub bypasses: usize,

    /// Provider invocations, not HTTP requests
    pub provider_calls: usize,
    pub provider_texts: usize,
    pub provider_failures: usize,

    /// Provider success rate as a percentage (0-100)
    pub provider_success_rate: f64,

    pub store_failures: usize,
}

impl MetricsReport {
    /// Format the report as a one-line summary for logs.
    pub fn format(&self) -> String {
        format!(
            "cache: {} memo + {} store hits, {} misses ({:.1}% hit rate) | provider: {} calls, {} texts, {} failures ({:.1}% success) | {} bypasses, {} store failures",
            self.memo_hits,
            self.store_hits,
            self.cache_misses,
            self.cache_hit_rate,
            self.provider_calls,
            self.provider_texts,
            self.provider_failures,
            self.provider_success_rate,
            self.bypasses,
            self.store_failures
        )
    }
}
