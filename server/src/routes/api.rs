use std::fmt::Write as _;
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use chrono::Utc;
use clanboard_shared::tag::normalize_tag;
use serde::Serialize;
use tracing::{debug, warn};

use crate::state::{AppState, CachedResponse, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
const MAX_PROXY_PATH_LEN: usize = 512;
const PROXIED_CACHE_CONTROL: &str = "no-cache";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    upstream_url: String,
    default_clan_tag: String,
    proxy_cache_size: usize,
    proxy_cache_ttl_secs: i64,
    observability: ObservabilitySnapshot,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        upstream_url: state.settings.upstream_url.clone(),
        default_clan_tag: state.settings.default_clan_tag.clone(),
        proxy_cache_size: state.proxy_cache.len(),
        proxy_cache_ttl_secs: state.settings.cache_ttl_secs,
        observability: state.observability.snapshot(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_prometheus_metrics(state.proxy_cache.len(), state.observability.snapshot());

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn write_metric(body: &mut String, name: &str, kind: &str, help: &str, value: u64) {
    let _ = writeln!(body, "# HELP {name} {help}");
    let _ = writeln!(body, "# TYPE {name} {kind}");
    let _ = writeln!(body, "{name} {value}");
}

fn render_prometheus_metrics(cache_size: usize, observability: ObservabilitySnapshot) -> String {
    let mut body = String::new();
    write_metric(
        &mut body,
        "clanboard_proxy_cache_size",
        "gauge",
        "Current number of cached upstream responses.",
        cache_size as u64,
    );
    write_metric(
        &mut body,
        "clanboard_proxy_requests_total",
        "counter",
        "Total proxied GET requests.",
        observability.proxy_requests_total,
    );
    write_metric(
        &mut body,
        "clanboard_proxy_cache_hits_total",
        "counter",
        "Total proxied GET requests served from cache.",
        observability.proxy_cache_hits_total,
    );
    write_metric(
        &mut body,
        "clanboard_proxy_cache_misses_total",
        "counter",
        "Total proxied GET requests fetched from upstream.",
        observability.proxy_cache_misses_total,
    );
    write_metric(
        &mut body,
        "clanboard_proxy_upstream_errors_total",
        "counter",
        "Total upstream transport failures.",
        observability.proxy_upstream_errors_total,
    );
    write_metric(
        &mut body,
        "clanboard_proxy_rejected_paths_total",
        "counter",
        "Total proxy requests rejected before reaching upstream.",
        observability.proxy_rejected_paths_total,
    );
    write_metric(
        &mut body,
        "clanboard_proxy_writes_total",
        "counter",
        "Total proxied POST requests.",
        observability.proxy_writes_total,
    );
    write_metric(
        &mut body,
        "clanboard_proxy_cache_evictions_total",
        "counter",
        "Total cache entries evicted for age or capacity.",
        observability.proxy_cache_evictions_total,
    );
    body
}

/// Reject paths that could escape the API prefix or confuse the upstream.
/// Player routes additionally need a well-formed tag.
fn validate_proxy_path(path: &str) -> Result<(), StatusCode> {
    if path.is_empty() || path.len() > MAX_PROXY_PATH_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }
    if path.contains("..") || path.chars().any(|ch| ch.is_control() || ch == '\\') {
        return Err(StatusCode::BAD_REQUEST);
    }

    let mut segments = path.split('/');
    if segments.next() == Some("player") {
        let tag = segments.next().unwrap_or_default();
        normalize_tag(tag).map_err(|_| StatusCode::BAD_REQUEST)?;
    }
    Ok(())
}

/// Upstream endpoints that answer 400 without a `clanTag`.
fn takes_clan_param(path: &str) -> bool {
    path.starts_with("/api/v2/") || path == "/api/insights"
}

/// Full upstream URL for a request, with the default clan appended to
/// clan-scoped calls that do not name one.
fn upstream_request_url(state: &AppState, uri: &Uri) -> Result<reqwest::Url, StatusCode> {
    let mut url = reqwest::Url::parse(&format!("{}{}", state.settings.upstream_url, uri.path()))
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    url.set_query(uri.query().filter(|q| !q.is_empty()));

    let names_clan = url.query_pairs().any(|(key, value)| key == "clanTag" && !value.is_empty());
    if takes_clan_param(url.path()) && !names_clan {
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "clanTag")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(pairs)
            .append_pair("clanTag", &state.settings.default_clan_tag);
    }
    Ok(url)
}

fn cache_key(url: &reqwest::Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

fn cached_body(state: &AppState, key: &str) -> Option<Bytes> {
    let cached = state.proxy_cache.get(key)?;
    cached
        .is_fresh(Utc::now(), state.settings.cache_ttl_secs)
        .then(|| cached.body.clone())
}

pub async fn proxy_get(
    State(state): State<AppState>,
    Path(path): Path<String>,
    uri: Uri,
) -> Result<Response, StatusCode> {
    state.observability.record_proxy_request();
    if let Err(status) = validate_proxy_path(&path) {
        state.observability.record_rejected_path();
        return Err(status);
    }

    let url = upstream_request_url(&state, &uri)?;
    let key = cache_key(&url);

    if let Some(body) = cached_body(&state, &key) {
        state.observability.record_cache_hit();
        return Ok(json_bytes_response(StatusCode::OK, body, PROXIED_CACHE_CONTROL));
    }

    let lock = state.fetch_locks.entry(key.clone()).or_default().clone();
    let result = {
        let _guard = lock.lock().await;
        // A concurrent request may have filled the cache while we waited.
        if let Some(body) = cached_body(&state, &key) {
            state.observability.record_cache_hit();
            Ok(json_bytes_response(StatusCode::OK, body, PROXIED_CACHE_CONTROL))
        } else {
            state.observability.record_cache_miss();
            fetch_and_cache(&state, url, key.clone()).await
        }
    };
    drop(lock);
    state
        .fetch_locks
        .remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);
    result
}

async fn fetch_and_cache(
    state: &AppState,
    url: reqwest::Url,
    key: String,
) -> Result<Response, StatusCode> {
    debug!(%url, "fetching upstream");
    let resp = state.http_client.get(url).send().await.map_err(|e| {
        state.observability.record_upstream_error();
        warn!(error = %e, "upstream request failed");
        StatusCode::BAD_GATEWAY
    })?;

    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let body = resp.bytes().await.map_err(|e| {
        state.observability.record_upstream_error();
        warn!(error = %e, "failed to read upstream body");
        StatusCode::BAD_GATEWAY
    })?;

    if status.is_success() {
        cache_payload(state, key, body.clone());
    }
    Ok(json_bytes_response(status, body, PROXIED_CACHE_CONTROL))
}

pub async fn proxy_post(
    State(state): State<AppState>,
    Path(path): Path<String>,
    uri: Uri,
    body: Bytes,
) -> Result<Response, StatusCode> {
    state.observability.record_write();
    if let Err(status) = validate_proxy_path(&path) {
        state.observability.record_rejected_path();
        return Err(status);
    }

    let url = upstream_request_url(&state, &uri)?;
    let resp = state
        .http_client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|e| {
            state.observability.record_upstream_error();
            warn!(error = %e, "upstream write failed");
            StatusCode::BAD_GATEWAY
        })?;

    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let body = resp.bytes().await.map_err(|_| StatusCode::BAD_GATEWAY)?;
    if status.is_success() {
        // Writes start ingestion jobs, which change every snapshot.
        state.proxy_cache.clear();
    }
    Ok(json_bytes_response(status, body, "no-store"))
}

fn cache_payload(state: &AppState, key: String, body: Bytes) {
    if !state.proxy_cache.contains_key(&key) {
        while state.proxy_cache.len() >= state.settings.max_cache_entries {
            if !evict_oldest_entry(state) {
                break;
            }
        }
    }

    state.proxy_cache.insert(
        key,
        CachedResponse {
            body,
            fetched_at: Utc::now(),
        },
    );
}

fn evict_oldest_entry(state: &AppState) -> bool {
    let Some(oldest_key) = state
        .proxy_cache
        .iter()
        .min_by_key(|entry| entry.value().fetched_at)
        .map(|entry| entry.key().clone())
    else {
        return false;
    };
    let removed = state.proxy_cache.remove(&oldest_key).is_some();
    if removed {
        state.observability.record_cache_evictions(1);
    }
    removed
}

fn json_bytes_response(status: StatusCode, body: Bytes, cache_control: &'static str) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    response
}
