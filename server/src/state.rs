use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::warn;

use crate::config::{
    default_clan_tag, max_proxy_cache_entries, proxy_cache_ttl_secs, upstream_connect_timeout,
    upstream_http_timeout, upstream_url,
};

/// Proxy behaviour knobs, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub upstream_url: String,
    pub default_clan_tag: String,
    pub cache_ttl_secs: i64,
    pub max_cache_entries: usize,
}

impl ProxySettings {
    pub fn from_env() -> Self {
        Self {
            upstream_url: upstream_url(),
            default_clan_tag: default_clan_tag(),
            cache_ttl_secs: proxy_cache_ttl_secs(),
            max_cache_entries: max_proxy_cache_entries(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub body: Bytes,
    pub fetched_at: DateTime<Utc>,
}

impl CachedResponse {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl_secs: i64) -> bool {
        now.signed_duration_since(self.fetched_at).num_seconds() < ttl_secs
    }
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<ProxySettings>,
    /// Upstream GET bodies keyed by path and query.
    pub proxy_cache: Arc<DashMap<String, CachedResponse>>,
    /// One lock per cache key being fetched, so concurrent misses share a fetch.
    pub fetch_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    pub http_client: reqwest::Client,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    proxy_requests_total: AtomicU64,
    proxy_cache_hits_total: AtomicU64,
    proxy_cache_misses_total: AtomicU64,
    proxy_upstream_errors_total: AtomicU64,
    proxy_rejected_paths_total: AtomicU64,
    proxy_writes_total: AtomicU64,
    proxy_cache_evictions_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct ObservabilitySnapshot {
    pub proxy_requests_total: u64,
    pub proxy_cache_hits_total: u64,
    pub proxy_cache_misses_total: u64,
    pub proxy_upstream_errors_total: u64,
    pub proxy_rejected_paths_total: u64,
    pub proxy_writes_total: u64,
    pub proxy_cache_evictions_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            proxy_requests_total: self.proxy_requests_total.load(Ordering::Relaxed),
            proxy_cache_hits_total: self.proxy_cache_hits_total.load(Ordering::Relaxed),
            proxy_cache_misses_total: self.proxy_cache_misses_total.load(Ordering::Relaxed),
            proxy_upstream_errors_total: self.proxy_upstream_errors_total.load(Ordering::Relaxed),
            proxy_rejected_paths_total: self.proxy_rejected_paths_total.load(Ordering::Relaxed),
            proxy_writes_total: self.proxy_writes_total.load(Ordering::Relaxed),
            proxy_cache_evictions_total: self.proxy_cache_evictions_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_proxy_request(&self) {
        self.proxy_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.proxy_cache_hits_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.proxy_cache_misses_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_error(&self) {
        self.proxy_upstream_errors_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_path(&self) {
        self.proxy_rejected_paths_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.proxy_writes_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_evictions(&self, count: u64) {
        self.proxy_cache_evictions_total
            .fetch_add(count, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new(settings: ProxySettings) -> Self {
        let request_timeout = upstream_http_timeout();
        let connect_timeout = upstream_connect_timeout();
        let http_client = reqwest::Client::builder()
            .user_agent("clanboard/0.1")
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .or_else(|e| {
                warn!(
                    error = %e,
                    "failed to build configured HTTP client, retrying without custom user-agent"
                );
                reqwest::Client::builder()
                    .timeout(request_timeout)
                    .connect_timeout(connect_timeout)
                    .build()
            })
            .unwrap_or_else(|e| {
                panic!("failed to build timeout-configured HTTP client: {e}");
            });
        Self {
            settings: Arc::new(settings),
            proxy_cache: Arc::new(DashMap::new()),
            fetch_locks: Arc::new(DashMap::new()),
            http_client,
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }

    /// Drop entries older than the TTL; returns how many were removed.
    pub fn evict_stale(&self, now: DateTime<Utc>) -> usize {
        let ttl = self.settings.cache_ttl_secs;
        let before = self.proxy_cache.len();
        self.proxy_cache
            .retain(|_, cached| cached.is_fresh(now, ttl));
        let evicted = before.saturating_sub(self.proxy_cache.len());
        self.observability.record_cache_evictions(evicted as u64);
        evicted
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use chrono::{Duration, Utc};

    use super::{AppState, CachedResponse, ProxySettings};

    fn settings() -> ProxySettings {
        ProxySettings {
            upstream_url: "http://127.0.0.1:9".into(),
            default_clan_tag: "2PR8R8V8P".into(),
            cache_ttl_secs: 30,
            max_cache_entries: 4,
        }
    }

    #[test]
    fn evict_stale_keeps_fresh_entries() {
        let state = AppState::new(settings());
        let now = Utc::now();
        state.proxy_cache.insert(
            "fresh".into(),
            CachedResponse {
                body: Bytes::from_static(b"{}"),
                fetched_at: now - Duration::seconds(5),
            },
        );
        state.proxy_cache.insert(
            "stale".into(),
            CachedResponse {
                body: Bytes::from_static(b"{}"),
                fetched_at: now - Duration::seconds(31),
            },
        );

        assert_eq!(state.evict_stale(now), 1);
        assert!(state.proxy_cache.contains_key("fresh"));
        assert_eq!(state.observability.snapshot().proxy_cache_evictions_total, 1);
    }
}
