use serde::{Deserialize, Serialize};

use crate::FetchError;

pub const DEFAULT_HISTORY_DAYS: u32 = 30;
pub const MAX_HISTORY_DAYS: u32 = 90;

/// Window switches offered in the player drawer.
pub const HISTORY_WINDOWS: [u32; 3] = [30, 60, 90];

/// Day window actually requested; `None` or `0` means the default window.
pub fn clamp_history_days(days: Option<u32>) -> u32 {
    match days {
        None | Some(0) => DEFAULT_HISTORY_DAYS,
        Some(days) => days.min(MAX_HISTORY_DAYS),
    }
}

/// Change against the previous point in the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDeltas {
    pub trophies: i64,
    pub donations: i64,
    pub donations_received: i64,
}

/// One daily snapshot of a player.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerHistoryPoint {
    pub date: String,
    #[serde(default)]
    pub trophies: Option<i64>,
    #[serde(default)]
    pub donations: Option<i64>,
    #[serde(default)]
    pub donations_received: Option<i64>,
    #[serde(default)]
    pub town_hall_level: Option<u8>,
    #[serde(default)]
    pub war_stars: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deltas: Option<HistoryDeltas>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerHistoryMeta {
    #[serde(default)]
    pub days: Option<u32>,
    #[serde(default)]
    pub snapshots_found: Option<u32>,
    #[serde(default)]
    pub player_tag: Option<String>,
}

/// History is the one payload that carries a `meta` block beside `data`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerHistoryResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Vec<PlayerHistoryPoint>,
    #[serde(default)]
    pub meta: PlayerHistoryMeta,
    #[serde(default)]
    pub error: Option<String>,
}

impl PlayerHistoryResponse {
    pub fn into_result(self) -> Result<(Vec<PlayerHistoryPoint>, PlayerHistoryMeta), FetchError> {
        if !self.success {
            return Err(FetchError::Api {
                message: self.error.unwrap_or_else(|| "history unavailable".to_string()),
            });
        }
        Ok((self.data, self.meta))
    }
}

fn delta(current: Option<i64>, previous: Option<i64>) -> i64 {
    match (current, previous) {
        (Some(current), Some(previous)) => current - previous,
        _ => 0,
    }
}

/// Order points oldest first and fill each point's delta against its
/// predecessor. The first point has no delta.
pub fn compute_deltas(mut points: Vec<PlayerHistoryPoint>) -> Vec<PlayerHistoryPoint> {
    points.sort_by(|a, b| a.date.cmp(&b.date));
    let mut previous: Option<PlayerHistoryPoint> = None;
    for point in &mut points {
        point.deltas = previous.as_ref().map(|prev| HistoryDeltas {
            trophies: delta(point.trophies, prev.trophies),
            donations: delta(point.donations, prev.donations),
            donations_received: delta(point.donations_received, prev.donations_received),
        });
        previous = Some(point.clone());
    }
    points
}

/// Net change between the first and last point for the drawer summary.
pub fn window_change(points: &[PlayerHistoryPoint]) -> Option<HistoryDeltas> {
    let first = points.first()?;
    let last = points.last()?;
    if points.len() < 2 {
        return None;
    }
    Some(HistoryDeltas {
        trophies: delta(last.trophies, first.trophies),
        donations: delta(last.donations, first.donations),
        donations_received: delta(last.donations_received, first.donations_received),
    })
}
