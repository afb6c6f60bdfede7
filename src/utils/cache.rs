//! In-Memory Assessment Cache
//!
//! Thread-safe caching of completed policy analyses, keyed by the
//! SHA-256 fingerprint of (document text, policyholder profile). Spares
//! the LLM a second pass when the same document is resubmitted within
//! the TTL window.
//!
//! Features:
//! - TTL-based expiration
//! - Cache HIT/MISS logging and counters
//! - DashMap store, no lock contention

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::core::analyzer::PolicyAnalysis;
use crate::utils::constants::DEFAULT_CACHE_TTL_SECS;

/// Cache entry with creation timestamp for TTL validation
#[derive(Clone)]
pub struct CacheEntry {
    pub analysis: PolicyAnalysis,
    pub created_at: Instant,
    pub ttl_secs: u64,
}

impl CacheEntry {
    pub fn new(analysis: PolicyAnalysis, ttl_secs: u64) -> Self {
        Self {
            analysis,
            created_at: Instant::now(),
            ttl_secs,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > Duration::from_secs(self.ttl_secs)
    }
}

/// Aggregate cache counters
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub hit_rate: f64,
}

/// Fingerprint-keyed analysis cache
#[derive(Clone)]
pub struct AnalysisCache {
    store: Arc<DashMap<String, CacheEntry>>,
    ttl_secs: u64,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL_SECS)
    }

    pub fn with_ttl(ttl_secs: u64) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            ttl_secs,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Get with TTL validation. Expired entries are evicted on read.
    pub fn get(&self, fingerprint: &str) -> Option<PolicyAnalysis> {
        if let Some(entry) = self.store.get(fingerprint) {
            if entry.is_expired() {
                drop(entry);
                self.store.remove(fingerprint);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(fingerprint, "cache EXPIRED");
                return None;
            }
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(fingerprint, "cache HIT");
            return Some(entry.analysis.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(fingerprint, "cache MISS");
        None
    }

    pub fn insert(&self, fingerprint: String, analysis: PolicyAnalysis) {
        self.store
            .insert(fingerprint, CacheEntry::new(analysis, self.ttl_secs));
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired());
        let removed = before - self.store.len();
        if removed > 0 {
            info!(removed, "cache cleanup removed expired entries");
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hits,
            misses,
            entries: self.store.len(),
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}
