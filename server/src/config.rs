use std::time::Duration;

use clanboard_shared::tag::normalize_tag;

pub const DEFAULT_UPSTREAM_URL: &str = "http://localhost:5050";
pub const DEFAULT_CLAN_TAG: &str = "2PR8R8V8P";
pub const DEFAULT_PROXY_CACHE_TTL_SECS: i64 = 30;
pub const DEFAULT_MAX_PROXY_CACHE_ENTRIES: usize = 256;
pub const CACHE_EVICTION_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_STATIC_DIR: &str = "client/dist";
pub const SERVER_PORT: u16 = 3000;

/// Base URL of the dashboard REST API, without a trailing slash.
pub fn upstream_url() -> String {
    std::env::var("CLANBOARD_UPSTREAM_URL")
        .ok()
        .map(|value| value.trim().trim_end_matches('/').to_string())
        .filter(|value| value.starts_with("http://") || value.starts_with("https://"))
        .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string())
}

/// Clan tag appended to roster requests that do not name one.
pub fn default_clan_tag() -> String {
    std::env::var("DEFAULT_CLAN_TAG")
        .ok()
        .and_then(|value| normalize_tag(&value).ok())
        .unwrap_or_else(|| DEFAULT_CLAN_TAG.to_string())
}

pub fn proxy_cache_ttl_secs() -> i64 {
    std::env::var("PROXY_CACHE_TTL_SECS")
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_PROXY_CACHE_TTL_SECS)
}

pub fn max_proxy_cache_entries() -> usize {
    std::env::var("MAX_PROXY_CACHE_ENTRIES")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAX_PROXY_CACHE_ENTRIES)
}

pub fn upstream_http_timeout() -> Duration {
    std::env::var("UPSTREAM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    std::env::var("UPSTREAM_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}

pub fn static_dir() -> String {
    std::env::var("STATIC_DIR")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
}
