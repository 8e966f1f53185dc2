//! Where one player stands against the rest of the current roster.

use serde::{Deserialize, Serialize};

use crate::model::RosterMember;
use crate::resolver::{ResolvedMember, donation_ratio, resolve_role, resolve_town_hall, resolve_trophies};
use crate::tag::tag_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonMetric {
    Trophies,
    Donations,
    DonationsReceived,
    WarStars,
    ClanCapitalContributions,
    DonationRatio,
}

impl ComparisonMetric {
    pub const ALL: [ComparisonMetric; 6] = [
        ComparisonMetric::Trophies,
        ComparisonMetric::Donations,
        ComparisonMetric::DonationsReceived,
        ComparisonMetric::WarStars,
        ComparisonMetric::ClanCapitalContributions,
        ComparisonMetric::DonationRatio,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Trophies => "Trophies",
            Self::Donations => "Donations",
            Self::DonationsReceived => "Received",
            Self::WarStars => "War Stars",
            Self::ClanCapitalContributions => "Capital Gold",
            Self::DonationRatio => "Donation Ratio",
        }
    }

    fn value(self, member: &RosterMember) -> Option<f64> {
        match self {
            Self::Trophies => resolve_trophies(member).map(|v| v as f64),
            Self::Donations => member.donations.map(|v| v as f64),
            Self::DonationsReceived => member.donations_received.map(|v| v as f64),
            Self::WarStars => member.war_stars.map(|v| v as f64),
            Self::ClanCapitalContributions => member.clan_capital_contributions.map(|v| v as f64),
            Self::DonationRatio => donation_ratio(member),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    pub metric: ComparisonMetric,
    pub player_value: f64,
    pub clan_average: f64,
    pub clan_median: f64,
    /// Share of the clan at or below the player, 0..=100.
    pub percentile: f64,
    /// 1 is best.
    pub rank: usize,
    pub total_players: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAverage {
    pub label: String,
    pub average_trophies: f64,
    pub players: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerComparison {
    pub tag: String,
    pub metrics: Vec<MetricComparison>,
    pub town_hall: Option<GroupAverage>,
    pub role: GroupAverage,
}

fn median(sorted: &[f64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2],
        n => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

fn compare_metric(metric: ComparisonMetric, player: &RosterMember, roster: &[RosterMember]) -> MetricComparison {
    let mut values: Vec<f64> = roster
        .iter()
        .map(|m| metric.value(m).filter(|v| v.is_finite()).unwrap_or(0.0))
        .collect();
    values.sort_by(|a, b| a.total_cmp(b));
    let player_value = metric.value(player).filter(|v| v.is_finite()).unwrap_or(0.0);
    let total = values.len();
    let average = if total == 0 {
        0.0
    } else {
        values.iter().sum::<f64>() / total as f64
    };
    let at_or_below = values.iter().filter(|v| **v <= player_value).count();
    let above = values.iter().filter(|v| **v > player_value).count();

    MetricComparison {
        metric,
        player_value,
        clan_average: average,
        clan_median: median(&values),
        percentile: if total == 0 {
            0.0
        } else {
            (at_or_below as f64 / total as f64 * 100.0).round()
        },
        rank: above + 1,
        total_players: total,
    }
}

fn average_trophies<'a>(members: impl Iterator<Item = &'a RosterMember>) -> (f64, usize) {
    let (sum, count) = members.fold((0.0, 0usize), |(sum, count), m| {
        (sum + resolve_trophies(m).unwrap_or(0) as f64, count + 1)
    });
    if count == 0 { (0.0, 0) } else { (sum / count as f64, count) }
}

/// `None` when the tag is not in the roster.
pub fn compare_player(tag: &str, roster: &[RosterMember]) -> Option<PlayerComparison> {
    let key = tag_key(tag);
    let player = roster.iter().find(|m| tag_key(&m.tag) == key)?;

    let metrics = ComparisonMetric::ALL
        .into_iter()
        .map(|metric| compare_metric(metric, player, roster))
        .collect();

    let town_hall = resolve_town_hall(player).map(|th| {
        let (average_trophies, players) =
            average_trophies(roster.iter().filter(|m| resolve_town_hall(m) == Some(th)));
        GroupAverage {
            label: format!("TH{th}"),
            average_trophies,
            players,
        }
    });

    let role = resolve_role(player);
    let (role_average, role_players) =
        average_trophies(roster.iter().filter(|m| resolve_role(m) == role));

    Some(PlayerComparison {
        tag: key,
        metrics,
        town_hall,
        role: GroupAverage {
            label: role.label().to_string(),
            average_trophies: role_average,
            players: role_players,
        },
    })
}

/// Convenience for the drawer, which already holds resolved rows.
pub fn compare_row(row: &ResolvedMember, rows: &[ResolvedMember]) -> Option<PlayerComparison> {
    let roster: Vec<RosterMember> = rows.iter().map(|r| r.member.clone()).collect();
    compare_player(&row.member.tag, &roster)
}

#[cfg(test)]
mod tests {
    use super::{ComparisonMetric, compare_player};
    use crate::model::RosterMember;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn member(tag: &str, th: u8, role: &str, trophies: i64, donations: i64) -> RosterMember {
        RosterMember {
            tag: tag.into(),
            name: tag.into(),
            town_hall_level: Some(th),
            role: Some(role.into()),
            trophies: Some(trophies),
            donations: Some(donations),
            ..RosterMember::default()
        }
    }

    fn roster() -> Vec<RosterMember> {
        vec![
            member("#PQ2", 15, "leader", 5000, 100),
            member("#PQ8", 15, "member", 4000, 300),
            member("#PQ9", 14, "member", 3000, 0),
            member("#PQY", 13, "admin", 2000, 200),
        ]
    }

    #[test]
    fn unknown_tag_has_no_comparison() {
        assert!(compare_player("#GGGG", &roster()).is_none());
    }

    #[test]
    fn trophies_rank_and_percentile() {
        let cmp = compare_player("pq8", &roster()).expect("player present");
        let trophies = &cmp.metrics[0];
        assert_eq!(trophies.metric, ComparisonMetric::Trophies);
        assert_close(trophies.player_value, 4000.0);
        assert_close(trophies.clan_average, 3500.0);
        assert_close(trophies.clan_median, 3500.0);
        assert_eq!(trophies.rank, 2);
        assert_eq!(trophies.total_players, 4);
        assert_close(trophies.percentile, 75.0);
    }

    #[test]
    fn donations_leader_ranks_first() {
        let cmp = compare_player("#PQ8", &roster()).expect("player present");
        let donations = &cmp.metrics[1];
        assert_eq!(donations.rank, 1);
        assert_close(donations.percentile, 100.0);
    }

    #[test]
    fn group_averages_use_same_town_hall_and_role() {
        let cmp = compare_player("#PQ9", &roster()).expect("player present");
        let th = cmp.town_hall.expect("town hall known");
        assert_eq!(th.label, "TH14");
        assert_eq!(th.players, 1);
        assert_eq!(cmp.role.label, "Member");
        assert_eq!(cmp.role.players, 2);
        assert_close(cmp.role.average_trophies, 3500.0);
    }

    #[test]
    fn metrics_missing_everywhere_compare_as_zero() {
        let cmp = compare_player("#PQ2", &roster()).expect("player present");
        let war_stars = &cmp.metrics[3];
        assert_close(war_stars.player_value, 0.0);
        assert_eq!(war_stars.rank, 1);
    }
}
