use serde::de::DeserializeOwned;

use clanboard_shared::history::{PlayerHistoryMeta, PlayerHistoryPoint, PlayerHistoryResponse, compute_deltas};
use clanboard_shared::insights::{ClanInsights, not_found_as_empty};
use clanboard_shared::tag::normalize_tag;
use clanboard_shared::{
    ApiEnvelope, FetchError, FormerMembersResponse, IngestionJob, RosterSnapshot, WarMetricsMap,
    WarMetricsResponse,
};

/// Recent-war window requested for war columns.
pub const WAR_METRICS_WINDOW: u32 = 10;

fn with_clan(path: &str, clan_tag: Option<&str>) -> String {
    match clan_tag.and_then(|tag| normalize_tag(tag).ok()) {
        Some(tag) => format!("{path}?clanTag={tag}"),
        None => path.to_string(),
    }
}

pub fn roster_url(clan_tag: Option<&str>) -> String {
    with_clan("/api/v2/roster", clan_tag)
}

pub fn former_url(clan_tag: Option<&str>) -> String {
    with_clan("/api/v2/roster/former", clan_tag)
}

pub fn war_metrics_url(clan_tag: Option<&str>) -> String {
    let base = with_clan("/api/v2/war/metrics", clan_tag);
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}wars={WAR_METRICS_WINDOW}")
}

pub fn insights_url(clan_tag: Option<&str>) -> String {
    with_clan("/api/insights", clan_tag)
}

pub fn history_url(tag: &str, days: u32) -> Result<String, FetchError> {
    let tag = normalize_tag(tag).map_err(|e| FetchError::Api {
        message: e.to_string(),
    })?;
    Ok(format!("/api/player/{tag}/history?days={days}"))
}

async fn get_envelope<T: DeserializeOwned>(url: &str) -> Result<T, FetchError> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    if !resp.ok() {
        return Err(FetchError::Http {
            status: resp.status(),
        });
    }

    resp.json::<ApiEnvelope<T>>()
        .await
        .map_err(|e| FetchError::Parse(e.to_string()))?
        .into_result()
}

pub async fn fetch_roster(url: String) -> Result<RosterSnapshot, FetchError> {
    get_envelope(&url).await
}

pub async fn fetch_former(url: String) -> Result<FormerMembersResponse, FetchError> {
    get_envelope(&url).await
}

pub async fn fetch_war_metrics(url: String) -> Result<WarMetricsMap, FetchError> {
    get_envelope::<WarMetricsResponse>(&url)
        .await
        .map(WarMetricsResponse::normalized)
}

/// `None` until upstream has computed insights for the clan.
pub async fn fetch_insights(url: String) -> Result<Option<ClanInsights>, FetchError> {
    not_found_as_empty(get_envelope(&url).await)
}

/// History points with deltas filled in, oldest first.
pub async fn fetch_history(
    url: String,
) -> Result<(Vec<PlayerHistoryPoint>, PlayerHistoryMeta), FetchError> {
    let resp = gloo_net::http::Request::get(&url)
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    if !resp.ok() {
        return Err(FetchError::Http {
            status: resp.status(),
        });
    }

    let (points, meta) = resp
        .json::<PlayerHistoryResponse>()
        .await
        .map_err(|e| FetchError::Parse(e.to_string()))?
        .into_result()?;
    Ok((compute_deltas(points), meta))
}

pub async fn start_ingestion(clan_tag: Option<&str>) -> Result<IngestionJob, FetchError> {
    let body = serde_json::json!({
        "clanTag": clan_tag.and_then(|tag| normalize_tag(tag).ok()),
    });
    let resp = gloo_net::http::Request::post("/api/ingestion/jobs")
        .json(&body)
        .map_err(|e| FetchError::Parse(e.to_string()))?
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    if !resp.ok() {
        return Err(FetchError::Http {
            status: resp.status(),
        });
    }

    resp.json::<ApiEnvelope<IngestionJob>>()
        .await
        .map_err(|e| FetchError::Parse(e.to_string()))?
        .into_result()
}

pub async fn fetch_ingestion_job(job_id: &str) -> Result<IngestionJob, FetchError> {
    get_envelope(&format!("/api/ingestion/jobs/{job_id}")).await
}
