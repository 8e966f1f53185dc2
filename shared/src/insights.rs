use serde::{Deserialize, Serialize};

use crate::FetchError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsMetadata {
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub snapshot_date: Option<String>,
    #[serde(default)]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightItem {
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "description")]
    pub detail: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "priority")]
    pub severity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartInsightsPayload {
    #[serde(default)]
    pub metadata: InsightsMetadata,
    #[serde(default)]
    pub headlines: Vec<InsightItem>,
    #[serde(default)]
    pub recommendations: Vec<InsightItem>,
}

/// `data` of `GET /api/insights?clanTag=`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanInsights {
    #[serde(default)]
    pub clan_tag: String,
    #[serde(default)]
    pub snapshot_date: Option<String>,
    #[serde(default)]
    pub smart_insights_payload: Option<SmartInsightsPayload>,
}

impl ClanInsights {
    /// Headlines first, then recommendations; untitled entries are skipped.
    pub fn items(&self) -> Vec<&InsightItem> {
        self.smart_insights_payload
            .iter()
            .flat_map(|payload| payload.headlines.iter().chain(&payload.recommendations))
            .filter(|item| !item.title.trim().is_empty())
            .collect()
    }

    /// Snapshot the insights were computed from, preferring the payload's own stamp.
    pub fn snapshot_label(&self) -> Option<&str> {
        self.smart_insights_payload
            .as_ref()
            .and_then(|payload| payload.metadata.snapshot_date.as_deref())
            .or(self.snapshot_date.as_deref())
    }
}

/// Upstream answers 404 until the first insights run for a clan.
pub fn not_found_as_empty(
    result: Result<ClanInsights, FetchError>,
) -> Result<Option<ClanInsights>, FetchError> {
    match result {
        Ok(insights) => Ok(Some(insights)),
        Err(FetchError::Http { status: 404 }) => Ok(None),
        Err(e) => Err(e),
    }
}
