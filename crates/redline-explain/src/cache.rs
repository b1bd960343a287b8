//! Explanation reuse
//!
//! Boilerplate clauses recur across contracts with only whitespace or case
//! changes. An LLM answer is stored under the normalized clause wording plus
//! the verdict it explains, so the same verdict on the same wording never
//! costs a second call. Template output is never cached.
//!
//! Author: hephaex@gmail.com

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use redline_core::{ExplanationText, Perspective, PipelineConfig, RiskLevel};

/// Verdict plus wording fingerprint
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct ExplanationKey {
    wording: u64,
    rationale_code: String,
    risk_level: RiskLevel,
    perspective: Perspective,
}

impl ExplanationKey {
    pub fn new(
        clause_text: &str,
        rationale_code: &str,
        risk_level: RiskLevel,
        perspective: Perspective,
    ) -> Self {
        Self {
            wording: fingerprint(clause_text),
            rationale_code: rationale_code.to_string(),
            risk_level,
            perspective,
        }
    }
}

/// Lowercased words joined by single spaces, hashed
fn fingerprint(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    for word in text.split_whitespace() {
        for c in word.chars().flat_map(char::to_lowercase) {
            c.hash(&mut hasher);
        }
        ' '.hash(&mut hasher);
    }
    hasher.finish()
}

/// Bounded, TTL-evicting store of LLM explanations
#[derive(Clone)]
pub struct ExplanationCache {
    entries: Cache<ExplanationKey, ExplanationText>,
    counters: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

/// Point-in-time view of cache traffic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
}

impl CacheStats {
    /// Share of lookups answered from the cache
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }
}

impl ExplanationCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            counters: Arc::default(),
        }
    }

    /// Sized by `pipeline.cache_capacity` and `pipeline.cache_ttl_secs`
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.cache_capacity, Duration::from_secs(config.cache_ttl_secs))
    }

    pub async fn get(&self, key: &ExplanationKey) -> Option<ExplanationText> {
        let found = self.entries.get(key).await;
        let counter = if found.is_some() {
            &self.counters.hits
        } else {
            &self.counters.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub async fn put(&self, key: ExplanationKey, explanation: ExplanationText) {
        self.entries.insert(key, explanation).await;
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks().await;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
        }
    }
}

impl Default for ExplanationCache {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}
