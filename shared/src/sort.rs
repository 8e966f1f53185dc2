use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::resolver::ResolvedMember;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    League,
    Th,
    Trophies,
    Donations,
    Received,
    Rush,
    Srs,
    Vip,
    Tenure,
    Name,
    WarAvgStars,
    WarTripleRate,
    WarLowHitRate,
    WarAvgDestruction,
    WarAttacks,
}

impl SortKey {
    pub const ALL: [SortKey; 15] = [
        SortKey::League,
        SortKey::Th,
        SortKey::Trophies,
        SortKey::Donations,
        SortKey::Received,
        SortKey::Rush,
        SortKey::Srs,
        SortKey::Vip,
        SortKey::Tenure,
        SortKey::Name,
        SortKey::WarAvgStars,
        SortKey::WarTripleRate,
        SortKey::WarLowHitRate,
        SortKey::WarAvgDestruction,
        SortKey::WarAttacks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::League => "league",
            Self::Th => "th",
            Self::Trophies => "trophies",
            Self::Donations => "donations",
            Self::Received => "received",
            Self::Rush => "rush",
            Self::Srs => "srs",
            Self::Vip => "vip",
            Self::Tenure => "tenure",
            Self::Name => "name",
            Self::WarAvgStars => "war_avg_stars",
            Self::WarTripleRate => "war_triple_rate",
            Self::WarLowHitRate => "war_low_hit_rate",
            Self::WarAvgDestruction => "war_avg_destruction",
            Self::WarAttacks => "war_attacks",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(raw))
    }

    /// Numeric value used by the simple comparator; missing values sort as 0.
    fn numeric_value(self, row: &ResolvedMember) -> f64 {
        let war = row.war.as_ref();
        let value = match self {
            Self::League | Self::Name => None,
            Self::Th => row.town_hall.map(f64::from),
            Self::Trophies => row.trophies.map(|v| v as f64),
            Self::Donations => row.member.donations.map(|v| v as f64),
            Self::Received => row.member.donations_received.map(|v| v as f64),
            Self::Rush => row.rush_percent,
            Self::Srs => row.activity.score,
            Self::Vip => row.member.vip_score,
            Self::Tenure => row.member.tenure_days.map(f64::from),
            Self::WarAvgStars => war.and_then(|w| w.avg_stars),
            Self::WarTripleRate => war.and_then(|w| w.triple_rate),
            Self::WarLowHitRate => war.and_then(|w| w.low_hit_rate),
            Self::WarAvgDestruction => war.and_then(|w| w.avg_destruction_pct),
            Self::WarAttacks => war.and_then(|w| w.attacks_used).map(f64::from),
        };
        value.filter(|v| v.is_finite()).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::League,
            direction: SortDirection::Desc,
        }
    }
}

impl SortState {
    /// Header click: same key flips, a new key starts descending.
    pub fn click(self, key: SortKey) -> Self {
        if self.key == key {
            Self {
                key,
                direction: self.direction.flipped(),
            }
        } else {
            Self {
                key,
                direction: SortDirection::Desc,
            }
        }
    }

    /// `key:dir` form used in local storage.
    pub fn encode(self) -> String {
        format!("{}:{}", self.key.as_str(), self.direction.as_str())
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let (key, dir) = raw.split_once(':')?;
        Some(Self {
            key: SortKey::parse(key)?,
            direction: SortDirection::parse(dir)?,
        })
    }
}

/// Leagued members always come first; within them, league prestige then town
/// hall then trophies, with the direction applied to that inner chain only.
fn league_cmp(a: &ResolvedMember, b: &ResolvedMember, direction: SortDirection) -> Ordering {
    match (&a.league, &b.league) {
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
        (Some(la), Some(lb)) => {
            let ascending = la
                .prestige_cmp(lb)
                .then_with(|| a.town_hall.unwrap_or(0).cmp(&b.town_hall.unwrap_or(0)))
                .then_with(|| a.trophies.unwrap_or(0).cmp(&b.trophies.unwrap_or(0)));
            direction.apply(ascending)
        }
    }
}

fn name_cmp(a: &ResolvedMember, b: &ResolvedMember) -> Ordering {
    a.member
        .name
        .to_lowercase()
        .cmp(&b.member.name.to_lowercase())
}

pub fn compare(a: &ResolvedMember, b: &ResolvedMember, state: SortState) -> Ordering {
    match state.key {
        SortKey::League => league_cmp(a, b, state.direction),
        SortKey::Name => state.direction.apply(name_cmp(a, b)),
        key => {
            let ordering = key
                .numeric_value(a)
                .partial_cmp(&key.numeric_value(b))
                .unwrap_or(Ordering::Equal);
            state.direction.apply(ordering)
        }
    }
}

/// Stable sort; equal rows keep their incoming order.
pub fn sort_members(rows: &mut [ResolvedMember], state: SortState) {
    rows.sort_by(|a, b| compare(a, b, state));
}

#[cfg(test)]
mod tests {
    use super::{SortDirection, SortKey, SortState, sort_members};
    use crate::model::{ActivityEvidence, RosterMember, WarMetrics, WarMetricsMap};
    use crate::resolver::{ResolvedMember, resolve_all};

    fn member(name: &str, league: Option<&str>, th: u8, trophies: i64) -> RosterMember {
        RosterMember {
            tag: format!("#{}", "P".repeat(3 + name.len() % 5)),
            name: name.into(),
            town_hall_level: Some(th),
            ranked_league_name: league.map(str::to_string),
            trophies: Some(trophies),
            ..RosterMember::default()
        }
    }

    fn names(rows: &[ResolvedMember]) -> Vec<&str> {
        rows.iter().map(|row| row.member.name.as_str()).collect()
    }

    fn resolved(members: &[RosterMember]) -> Vec<ResolvedMember> {
        resolve_all(members, &WarMetricsMap::new())
    }

    #[test]
    fn leagued_members_precede_unleagued_in_both_directions() {
        let members = vec![
            member("rich_unranked", None, 17, 6000),
            member("bronze", Some("Bronze League III"), 7, 100),
            member("also_unranked", Some("Unranked"), 16, 5000),
            member("legend", Some("Legend League"), 16, 5200),
        ];

        for direction in [SortDirection::Desc, SortDirection::Asc] {
            let mut rows = resolved(&members);
            sort_members(
                &mut rows,
                SortState {
                    key: SortKey::League,
                    direction,
                },
            );
            let order = names(&rows);
            assert!(order[..2].contains(&"bronze"));
            assert!(order[..2].contains(&"legend"));
            assert_eq!(&order[2..], &["rich_unranked", "also_unranked"]);
        }
    }

    #[test]
    fn league_descending_orders_by_prestige_then_tier() {
        let members = vec![
            member("titan3", Some("Titan League III"), 15, 100),
            member("gold1", Some("Gold League I"), 15, 100),
            member("titan1", Some("Titan League I"), 15, 100),
            member("legend", Some("Legend League"), 15, 100),
        ];
        let mut rows = resolved(&members);
        sort_members(&mut rows, SortState::default());
        assert_eq!(names(&rows), vec!["legend", "titan1", "titan3", "gold1"]);
    }

    #[test]
    fn same_league_ties_break_on_town_hall_then_trophies() {
        let members = vec![
            member("th15_low", Some("Master League II"), 15, 100),
            member("th16", Some("Master League II"), 16, 50),
            member("th15_high", Some("Master League II"), 15, 300),
        ];
        let mut rows = resolved(&members);
        sort_members(&mut rows, SortState::default());
        assert_eq!(names(&rows), vec!["th16", "th15_high", "th15_low"]);
    }

    #[test]
    fn numeric_sort_treats_missing_as_zero() {
        let mut with_donations = member("giver", None, 12, 0);
        with_donations.donations = Some(40);
        let mut no_donations = member("none", None, 12, 0);
        no_donations.donations = None;
        let members = vec![no_donations, with_donations];

        let mut rows = resolved(&members);
        sort_members(
            &mut rows,
            SortState {
                key: SortKey::Donations,
                direction: SortDirection::Desc,
            },
        );
        assert_eq!(names(&rows), vec!["giver", "none"]);

        sort_members(
            &mut rows,
            SortState {
                key: SortKey::Donations,
                direction: SortDirection::Asc,
            },
        );
        assert_eq!(names(&rows), vec!["none", "giver"]);
    }

    #[test]
    fn war_keys_read_joined_metrics() {
        let members = vec![member("a", None, 12, 0), member("bb", None, 12, 0)];
        let mut war = WarMetricsMap::new();
        let key_b = crate::tag::tag_key(&members[1].tag);
        war.insert(
            key_b,
            WarMetrics {
                triple_rate: Some(0.8),
                ..WarMetrics::default()
            },
        );
        let mut rows = resolve_all(&members, &war);
        sort_members(
            &mut rows,
            SortState {
                key: SortKey::WarTripleRate,
                direction: SortDirection::Desc,
            },
        );
        assert_eq!(names(&rows), vec!["bb", "a"]);
    }

    fn sorted(members: &[RosterMember], key: SortKey, direction: SortDirection) -> Vec<String> {
        let mut rows = resolved(members);
        sort_members(&mut rows, SortState { key, direction });
        names(&rows).into_iter().map(str::to_string).collect()
    }

    #[test]
    fn rush_sorts_by_hero_shortfall_with_unknown_as_zero() {
        let mut maxed = member("maxed", None, 9, 0);
        (maxed.bk, maxed.aq, maxed.mp) = (Some(30), Some(30), Some(10));
        let mut half = member("half", None, 9, 0);
        (half.bk, half.aq, half.mp) = (Some(15), Some(15), Some(5));
        let unknown = member("unknown", None, 9, 0);
        let members = vec![maxed, unknown, half];

        assert_eq!(
            sorted(&members, SortKey::Rush, SortDirection::Desc),
            vec!["half", "maxed", "unknown"]
        );
        assert_eq!(
            sorted(&members, SortKey::Rush, SortDirection::Asc),
            vec!["maxed", "unknown", "half"]
        );
    }

    #[test]
    fn srs_sorts_by_activity_score_keeping_tied_rows_in_place() {
        let scored = |name: &str, score: Option<f64>| RosterMember {
            activity: Some(ActivityEvidence {
                score,
                level: Some("active".into()),
                ..ActivityEvidence::default()
            }),
            ..member(name, None, 12, 0)
        };
        let members = vec![
            scored("quiet", Some(20.0)),
            scored("first_tie", Some(70.0)),
            scored("no_score", None),
            scored("busy", Some(95.0)),
            scored("second_tie", Some(70.0)),
        ];

        assert_eq!(
            sorted(&members, SortKey::Srs, SortDirection::Desc),
            vec!["busy", "first_tie", "second_tie", "quiet", "no_score"]
        );
        assert_eq!(
            sorted(&members, SortKey::Srs, SortDirection::Asc),
            vec!["no_score", "quiet", "first_tie", "second_tie", "busy"]
        );
    }

    #[test]
    fn vip_sorts_by_score_and_ignores_non_finite_values() {
        let vip = |name: &str, score: Option<f64>| RosterMember {
            vip_score: score,
            ..member(name, None, 12, 0)
        };
        let members = vec![
            vip("mid", Some(3.5)),
            vip("broken", Some(f64::NAN)),
            vip("top_a", Some(7.0)),
            vip("missing", None),
            vip("top_b", Some(7.0)),
        ];

        assert_eq!(
            sorted(&members, SortKey::Vip, SortDirection::Desc),
            vec!["top_a", "top_b", "mid", "broken", "missing"]
        );
        assert_eq!(
            sorted(&members, SortKey::Vip, SortDirection::Asc),
            vec!["broken", "missing", "mid", "top_a", "top_b"]
        );
    }

    #[test]
    fn clicking_same_key_flips_and_new_key_resets_to_desc() {
        let state = SortState::default();
        let flipped = state.click(SortKey::League);
        assert_eq!(flipped.direction, SortDirection::Asc);
        let back = flipped.click(SortKey::League);
        assert_eq!(back, state);

        let other = flipped.click(SortKey::Trophies);
        assert_eq!(
            other,
            SortState {
                key: SortKey::Trophies,
                direction: SortDirection::Desc
            }
        );
    }

    #[test]
    fn double_click_restores_original_order() {
        let members = vec![
            member("a", None, 10, 300),
            member("bb", None, 12, 100),
            member("ccc", None, 11, 200),
        ];
        let start = SortState {
            key: SortKey::Trophies,
            direction: SortDirection::Desc,
        };
        let mut rows = resolved(&members);
        sort_members(&mut rows, start);
        let original = names(&rows).join(",");

        let once = start.click(SortKey::Trophies);
        sort_members(&mut rows, once);
        assert_eq!(names(&rows), vec!["bb", "ccc", "a"]);

        let twice = once.click(SortKey::Trophies);
        sort_members(&mut rows, twice);
        assert_eq!(names(&rows).join(","), original);
    }

    #[test]
    fn sort_state_encoding_rejects_unknown_keys() {
        let state = SortState {
            key: SortKey::WarAvgStars,
            direction: SortDirection::Asc,
        };
        assert_eq!(SortState::decode(&state.encode()), Some(state));
        assert_eq!(SortState::decode("bogus:asc"), None);
        assert_eq!(SortState::decode("th"), None);
    }
}
