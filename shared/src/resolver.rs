//! Pure mapping from raw member records to display-ready values.
//!
//! Nothing here fails: missing or malformed fields degrade to `None` so a single
//! bad record cannot take down a roster render.

use crate::activity::{Activity, classify_activity};
use crate::heroes::{HeroLevel, hero_levels, rush_percent};
use crate::league::{League, parse_league_name};
use crate::model::{Role, RosterMember, WarMetrics, WarMetricsMap};
use crate::tag::tag_key;

pub fn resolve_town_hall(member: &RosterMember) -> Option<u8> {
    member
        .town_hall_level
        .or(member.th)
        .filter(|level| *level > 0)
}

fn has_ranked_league(member: &RosterMember) -> bool {
    member.ranked_league_id.is_some()
        || member
            .ranked_league_name
            .as_deref()
            .is_some_and(|name| parse_league_name(name).is_some())
}

/// Trophy count shown everywhere: ranked trophies for members placed in a
/// ranked league, regular trophies otherwise.
pub fn trophies_source_of_truth(member: &RosterMember) -> Option<i64> {
    if has_ranked_league(member)
        && let Some(ranked) = member.ranked_trophies
    {
        return Some(ranked);
    }
    member.trophies.or(member.ranked_trophies)
}

pub fn resolve_trophies(member: &RosterMember) -> Option<i64> {
    member
        .resolved_trophies
        .or_else(|| trophies_source_of_truth(member))
}

pub fn resolve_league(member: &RosterMember) -> Option<League> {
    if let Some(resolved) = member.resolved_league.as_ref() {
        return parse_league_name(&resolved.name).map(|parsed| League {
            tier: resolved.tier.or(parsed.tier),
            name: parsed.name,
        });
    }
    member
        .ranked_league_name
        .as_deref()
        .and_then(parse_league_name)
}

pub fn resolve_role(member: &RosterMember) -> Role {
    member.role.as_deref().map(Role::parse).unwrap_or_default()
}

pub fn resolve_activity(member: &RosterMember) -> Activity {
    classify_activity(member.activity.as_ref())
}

pub fn resolve_rush_percent(member: &RosterMember) -> Option<f64> {
    rush_percent(member, resolve_town_hall(member))
}

/// Donations given per donation received; `None` when nothing was received.
pub fn donation_ratio(member: &RosterMember) -> Option<f64> {
    let given = member.donations.unwrap_or(0);
    match member.donations_received {
        Some(received) if received > 0 => Some(given as f64 / received as f64),
        _ => None,
    }
}

/// A member with every derived field computed once per render cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMember {
    pub key: String,
    pub member: RosterMember,
    pub role: Role,
    pub town_hall: Option<u8>,
    pub trophies: Option<i64>,
    pub league: Option<League>,
    pub rush_percent: Option<f64>,
    pub activity: Activity,
    pub heroes: Vec<HeroLevel>,
    pub war: Option<WarMetrics>,
}

impl ResolvedMember {
    pub fn resolve(member: &RosterMember, war_metrics: &WarMetricsMap) -> Self {
        let key = tag_key(&member.tag);
        let town_hall = resolve_town_hall(member);
        Self {
            role: resolve_role(member),
            town_hall,
            trophies: resolve_trophies(member),
            league: resolve_league(member),
            rush_percent: rush_percent(member, town_hall),
            activity: resolve_activity(member),
            heroes: hero_levels(member, town_hall),
            war: war_metrics.get(&key).cloned(),
            member: member.clone(),
            key,
        }
    }

    pub fn tenure_days(&self) -> Option<u32> {
        self.member.tenure_days
    }
}

pub fn resolve_all(members: &[RosterMember], war_metrics: &WarMetricsMap) -> Vec<ResolvedMember> {
    members
        .iter()
        .map(|member| ResolvedMember::resolve(member, war_metrics))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        ResolvedMember, donation_ratio, resolve_league, resolve_role, resolve_town_hall,
        resolve_trophies,
    };
    use crate::activity::ActivityLevel;
    use crate::league::League;
    use crate::model::{LeagueRef, Role, RosterMember, WarMetrics, WarMetricsMap};

    fn base() -> RosterMember {
        RosterMember {
            tag: "#2PR8R8V8P".into(),
            name: "warfroggy".into(),
            ..RosterMember::default()
        }
    }

    #[test]
    fn town_hall_falls_back_to_legacy_field() {
        let mut m = base();
        assert_eq!(resolve_town_hall(&m), None);
        m.th = Some(12);
        assert_eq!(resolve_town_hall(&m), Some(12));
        m.town_hall_level = Some(14);
        assert_eq!(resolve_town_hall(&m), Some(14));
    }

    #[test]
    fn trophies_prefer_pre_resolved_value() {
        let mut m = base();
        m.trophies = Some(380);
        m.resolved_trophies = Some(5100);
        assert_eq!(resolve_trophies(&m), Some(5100));
    }

    #[test]
    fn ranked_members_use_ranked_trophies() {
        let mut m = base();
        m.trophies = Some(4900);
        m.ranked_trophies = Some(210);
        assert_eq!(resolve_trophies(&m), Some(4900));
        m.ranked_league_id = Some(105_000_034);
        assert_eq!(resolve_trophies(&m), Some(210));
    }

    #[test]
    fn no_trophy_data_is_none() {
        assert_eq!(resolve_trophies(&base()), None);
    }

    #[test]
    fn league_prefers_pre_resolved_then_raw_name() {
        let mut m = base();
        m.ranked_league_name = Some("Gold League II".into());
        assert_eq!(
            resolve_league(&m),
            Some(League {
                name: "Gold League".into(),
                tier: Some(2)
            })
        );
        m.resolved_league = Some(LeagueRef {
            name: "Titan League".into(),
            tier: Some(1),
        });
        assert_eq!(
            resolve_league(&m),
            Some(League {
                name: "Titan League".into(),
                tier: Some(1)
            })
        );
    }

    #[test]
    fn role_defaults_to_member() {
        let mut m = base();
        assert_eq!(resolve_role(&m), Role::Member);
        m.role = Some("coLeader".into());
        assert_eq!(resolve_role(&m), Role::CoLeader);
    }

    #[test]
    fn donation_ratio_needs_received_donations() {
        let mut m = base();
        m.donations = Some(72);
        assert_eq!(donation_ratio(&m), None);
        m.donations_received = Some(36);
        assert_eq!(donation_ratio(&m), Some(2.0));
    }

    #[test]
    fn resolve_joins_war_metrics_by_normalized_tag() {
        let mut war = WarMetricsMap::new();
        war.insert(
            "2PR8R8V8P".into(),
            WarMetrics {
                avg_stars: Some(2.4),
                ..WarMetrics::default()
            },
        );
        let mut m = base();
        m.tag = "#2pr8r8v8p".into();
        let resolved = ResolvedMember::resolve(&m, &war);
        assert_eq!(resolved.key, "2PR8R8V8P");
        assert_eq!(resolved.war.and_then(|w| w.avg_stars), Some(2.4));
        assert_eq!(resolved.activity.level, ActivityLevel::Unknown);
    }
}
