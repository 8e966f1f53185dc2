//! Stale-while-revalidate request cache.
//!
//! Every fetch goes through a [`RequestCache`] keyed by URL. Requests for the
//! same key are coalesced while one is in flight and for [`DEDUPE_WINDOW_MS`]
//! after it settles; previous data stays visible while a refresh runs.

use std::collections::HashMap;
use std::future::Future;

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use clanboard_shared::FetchError;

pub const DEDUPE_WINDOW_MS: f64 = 2_000.0;

#[derive(Debug, Clone, PartialEq)]
struct CacheEntry<T> {
    data: Option<T>,
    error: Option<FetchError>,
    fetched_at: Option<f64>,
    in_flight: bool,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            fetched_at: None,
            in_flight: false,
        }
    }
}

/// What a view needs to render one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub data: Option<T>,
    pub error: Option<FetchError>,
    /// Nothing to show yet.
    pub is_loading: bool,
    /// A refresh is running while older data is shown.
    pub is_validating: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestCache<T> {
    entries: HashMap<String, CacheEntry<T>>,
    dedupe_window_ms: f64,
}

impl<T> Default for RequestCache<T> {
    fn default() -> Self {
        Self::new(DEDUPE_WINDOW_MS)
    }
}

impl<T> RequestCache<T> {
    pub fn new(dedupe_window_ms: f64) -> Self {
        Self {
            entries: HashMap::new(),
            dedupe_window_ms,
        }
    }

    /// Whether `key` was ever requested.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl<T: Clone> RequestCache<T> {
    /// Whether a request for `key` should go out now. `force` skips the
    /// dedupe window but still never doubles up on an in-flight request.
    pub fn should_fetch(&self, key: &str, now_ms: f64, force: bool) -> bool {
        let Some(entry) = self.entries.get(key) else {
            return true;
        };
        if entry.in_flight {
            return false;
        }
        if force {
            return true;
        }
        match entry.fetched_at {
            Some(at) => now_ms - at >= self.dedupe_window_ms,
            None => true,
        }
    }

    pub fn begin(&mut self, key: &str) {
        self.entries.entry(key.to_string()).or_default().in_flight = true;
    }

    /// Record a settled request. An error keeps the previous data.
    pub fn settle(&mut self, key: &str, result: Result<T, FetchError>, now_ms: f64) {
        let entry = self.entries.entry(key.to_string()).or_default();
        entry.in_flight = false;
        entry.fetched_at = Some(now_ms);
        match result {
            Ok(data) => {
                entry.data = Some(data);
                entry.error = None;
            }
            Err(e) => entry.error = Some(e),
        }
    }

    pub fn state(&self, key: &str) -> ResourceState<T> {
        match self.entries.get(key) {
            Some(entry) => ResourceState {
                data: entry.data.clone(),
                error: entry.error.clone(),
                is_loading: entry.data.is_none() && entry.in_flight,
                is_validating: entry.data.is_some() && entry.in_flight,
            },
            None => ResourceState {
                data: None,
                error: None,
                is_loading: false,
                is_validating: false,
            },
        }
    }
}

fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Reactive handle over a [`RequestCache`].
pub struct Swr<T: Send + Sync + 'static> {
    cache: RwSignal<RequestCache<T>>,
}

impl<T: Send + Sync + 'static> Clone for Swr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Send + Sync + 'static> Copy for Swr<T> {}

impl<T: Clone + Send + Sync + 'static> Swr<T> {
    pub fn new() -> Self {
        Self {
            cache: RwSignal::new(RequestCache::default()),
        }
    }

    /// Tracked read for use inside views and memos.
    pub fn state(&self, key: &str) -> ResourceState<T> {
        self.cache.with(|cache| cache.state(key))
    }

    /// Untracked; for deciding whether an explicit refresh should include `key`.
    pub fn is_requested(&self, key: &str) -> bool {
        self.cache.with_untracked(|cache| cache.contains(key))
    }

    /// Fetch unless a recent or running request already covers `key`.
    pub fn fetch<F, Fut>(&self, key: String, fetcher: F)
    where
        F: FnOnce(String) -> Fut + 'static,
        Fut: Future<Output = Result<T, FetchError>> + 'static,
    {
        self.run(key, fetcher, false);
    }

    /// Explicit refresh: ignores the dedupe window.
    pub fn revalidate<F, Fut>(&self, key: String, fetcher: F)
    where
        F: FnOnce(String) -> Fut + 'static,
        Fut: Future<Output = Result<T, FetchError>> + 'static,
    {
        self.run(key, fetcher, true);
    }

    fn run<F, Fut>(&self, key: String, fetcher: F, force: bool)
    where
        F: FnOnce(String) -> Fut + 'static,
        Fut: Future<Output = Result<T, FetchError>> + 'static,
    {
        let cache = self.cache;
        let go = cache
            .try_update(|cache| {
                let go = cache.should_fetch(&key, now_ms(), force);
                if go {
                    cache.begin(&key);
                }
                go
            })
            .unwrap_or(false);
        if !go {
            return;
        }

        spawn_local(async move {
            let result = fetcher(key.clone()).await;
            if let Err(e) = &result {
                web_sys::console::warn_1(&format!("fetch {key} failed: {e}").into());
            }
            cache.update(|cache| cache.settle(&key, result, now_ms()));
        });
    }
}
