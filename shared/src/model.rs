use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// In-clan role. Upstream sends the Clash API spellings (`coLeader`, `admin`);
/// dashboards and older snapshots use looser ones, so parsing is lenient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Leader,
    CoLeader,
    #[serde(alias = "elder")]
    Admin,
    #[default]
    #[serde(other)]
    Member,
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "leader" => Self::Leader,
            "coleader" => Self::CoLeader,
            "admin" | "elder" => Self::Admin,
            _ => Self::Member,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Leader => "Leader",
            Self::CoLeader => "Co-Leader",
            Self::Admin => "Elder",
            Self::Member => "Member",
        }
    }

    /// Ordering weight for role columns: leader first.
    pub fn rank(self) -> u8 {
        match self {
            Self::Leader => 4,
            Self::CoLeader => 3,
            Self::Admin => 2,
            Self::Member => 1,
        }
    }

    pub fn is_leadership(self) -> bool {
        matches!(self, Self::Leader | Self::CoLeader)
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::Leader => "leader",
            Self::CoLeader => "coLeader",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

/// League as already resolved by the ingestion side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueRef {
    pub name: String,
    #[serde(default)]
    pub tier: Option<u8>,
}

/// External activity evidence attached to a member by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvidence {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub last_seen_at: Option<String>,
}

/// One member as delivered by the roster snapshot endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterMember {
    pub tag: String,
    pub name: String,
    #[serde(default)]
    pub town_hall_level: Option<u8>,
    /// Legacy snapshots carried the town hall as `th`.
    #[serde(default)]
    pub th: Option<u8>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub trophies: Option<i64>,
    #[serde(default)]
    pub ranked_trophies: Option<i64>,
    #[serde(default)]
    pub ranked_league_id: Option<i64>,
    #[serde(default)]
    pub ranked_league_name: Option<String>,
    #[serde(default)]
    pub resolved_trophies: Option<i64>,
    #[serde(default)]
    pub resolved_league: Option<LeagueRef>,
    #[serde(default)]
    pub donations: Option<i64>,
    #[serde(default)]
    pub donations_received: Option<i64>,
    #[serde(default)]
    pub tenure_days: Option<u32>,
    #[serde(default)]
    pub bk: Option<u8>,
    #[serde(default)]
    pub aq: Option<u8>,
    #[serde(default)]
    pub gw: Option<u8>,
    #[serde(default)]
    pub rc: Option<u8>,
    #[serde(default)]
    pub mp: Option<u8>,
    #[serde(default)]
    pub activity: Option<ActivityEvidence>,
    #[serde(default)]
    pub vip_score: Option<f64>,
    #[serde(default)]
    pub war_stars: Option<i64>,
    #[serde(default)]
    pub clan_capital_contributions: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    #[serde(default)]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub fetched_at: Option<String>,
    #[serde(default)]
    pub member_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSnapshot {
    #[serde(default)]
    pub members: Vec<RosterMember>,
    #[serde(default)]
    pub clan_name: Option<String>,
    #[serde(default)]
    pub clan_tag: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub snapshot_metadata: Option<SnapshotMetadata>,
}

/// Departed member; only last-known fields survive.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormerMember {
    pub tag: String,
    pub name: String,
    #[serde(default)]
    pub last_role: Option<String>,
    #[serde(default)]
    pub last_town_hall_level: Option<u8>,
    #[serde(default)]
    pub last_ranked_league_name: Option<String>,
    #[serde(default)]
    pub departed_at: Option<String>,
    #[serde(default)]
    pub tenure_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormerMembersResponse {
    #[serde(default)]
    pub members: Vec<FormerMember>,
}

/// Per-player aggregate over the last N wars. Upstream reports
/// `tripleRate` and `lowHitRate` as percentages (0..100), the same unit as
/// `avgDestructionPct`; [`WarMetricsResponse::normalized`] turns them into
/// 0..1 fractions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarMetrics {
    #[serde(default)]
    pub avg_stars: Option<f64>,
    #[serde(default)]
    pub triple_rate: Option<f64>,
    #[serde(default)]
    pub low_hit_rate: Option<f64>,
    #[serde(default)]
    pub avg_destruction_pct: Option<f64>,
    #[serde(default)]
    pub attacks_used: Option<u32>,
}

impl WarMetrics {
    fn with_fraction_rates(self) -> Self {
        Self {
            triple_rate: self.triple_rate.map(|pct| pct / 100.0),
            low_hit_rate: self.low_hit_rate.map(|pct| pct / 100.0),
            ..self
        }
    }
}

/// War metrics keyed by normalized player tag, rates as 0..1 fractions.
pub type WarMetricsMap = HashMap<String, WarMetrics>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarMetricsResponse {
    #[serde(default)]
    pub metrics: WarMetricsMap,
    #[serde(default)]
    pub war_count: Option<u32>,
}

impl WarMetricsResponse {
    /// Re-key by normalized tag so lookups from roster rows always match,
    /// whatever spelling upstream used (`#abc`, `ABC`), and convert the
    /// percentage rates to fractions.
    pub fn normalized(self) -> WarMetricsMap {
        self.metrics
            .into_iter()
            .filter_map(|(tag, metrics)| {
                crate::tag::normalize_tag(&tag)
                    .ok()
                    .map(|tag| (tag, metrics.with_fraction_rates()))
            })
            .collect()
    }
}

/// Upstream wraps every payload as `{ success, data, error }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_result(self) -> Result<T, crate::FetchError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (_, _) => Err(crate::FetchError::Api {
                message: self
                    .error
                    .unwrap_or_else(|| "response carried no data".to_string()),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl IngestionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionJob {
    pub job_id: String,
    pub status: IngestionStatus,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{ApiEnvelope, IngestionJob, IngestionStatus, Role, RosterSnapshot, WarMetricsResponse};
    use crate::FetchError;

    #[test]
    fn role_parse_accepts_loose_spellings() {
        assert_eq!(Role::parse("coLeader"), Role::CoLeader);
        assert_eq!(Role::parse("co-leader"), Role::CoLeader);
        assert_eq!(Role::parse("Elder"), Role::Admin);
        assert_eq!(Role::parse("LEADER"), Role::Leader);
        assert_eq!(Role::parse("recruit"), Role::Member);
    }

    #[test]
    fn role_deserializes_unknown_values_as_member() {
        let role: Role = serde_json::from_str("\"mystery\"").expect("role should parse");
        assert_eq!(role, Role::Member);
        let role: Role = serde_json::from_str("\"elder\"").expect("role should parse");
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn snapshot_parses_with_missing_optional_fields() {
        let payload = r##"{
            "members": [
                {"tag": "#2PR8R8V8P", "name": "warfroggy", "role": "leader", "trophies": 380, "donations": 72},
                {"tag": "#Q0LY", "name": "andrew", "th": 9}
            ],
            "clanName": "Froggies"
        }"##;

        let snapshot: RosterSnapshot = serde_json::from_str(payload).expect("snapshot should parse");
        assert_eq!(snapshot.members.len(), 2);
        assert_eq!(snapshot.members[0].trophies, Some(380));
        assert_eq!(snapshot.members[1].th, Some(9));
        assert_eq!(snapshot.members[1].town_hall_level, None);
        assert!(snapshot.snapshot_metadata.is_none());
    }

    #[test]
    fn envelope_failure_becomes_api_error() {
        let payload = r#"{"success": false, "error": "clan not found"}"#;
        let envelope: ApiEnvelope<RosterSnapshot> =
            serde_json::from_str(payload).expect("envelope should parse");
        assert_eq!(
            envelope.into_result(),
            Err(FetchError::Api {
                message: "clan not found".to_string()
            })
        );
    }

    #[test]
    fn war_metrics_are_rekeyed_by_normalized_tag() {
        let payload = r##"{"metrics": {"#q0ly": {"avgStars": 2.5}, "bad tag!": {"avgStars": 1.0}}}"##;
        let response: WarMetricsResponse =
            serde_json::from_str(payload).expect("metrics should parse");
        let map = response.normalized();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("Q0LY").and_then(|m| m.avg_stars), Some(2.5));
    }

    #[test]
    fn war_rates_become_fractions_once() {
        let payload = r##"{"metrics": {
            "#Q0LY": {"tripleRate": 1.0, "lowHitRate": 0.5, "avgDestructionPct": 88.0},
            "#PQ1": {"tripleRate": 75.0}
        }}"##;
        let response: WarMetricsResponse =
            serde_json::from_str(payload).expect("metrics should parse");
        let map = response.normalized();
        let low = map.get("Q0LY").expect("Q0LY metrics");
        assert_eq!(low.triple_rate, Some(0.01));
        assert_eq!(low.low_hit_rate, Some(0.005));
        assert_eq!(low.avg_destruction_pct, Some(88.0));
        assert_eq!(map.get("PQ1").and_then(|m| m.triple_rate), Some(0.75));
        assert_eq!(map.get("PQ1").and_then(|m| m.low_hit_rate), None);
    }

    #[test]
    fn ingestion_job_status_is_snake_case() {
        let job: IngestionJob =
            serde_json::from_str(r#"{"jobId": "j-1", "status": "running"}"#).expect("job");
        assert_eq!(job.status, IngestionStatus::Running);
        assert!(!job.status.is_terminal());
        assert!(IngestionStatus::Failed.is_terminal());
    }
}
