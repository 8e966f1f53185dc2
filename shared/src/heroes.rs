use serde::{Deserialize, Serialize};

use crate::model::RosterMember;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hero {
    Bk,
    Aq,
    Gw,
    Rc,
    Mp,
}

impl Hero {
    pub const ALL: [Hero; 5] = [Hero::Bk, Hero::Aq, Hero::Gw, Hero::Rc, Hero::Mp];

    pub fn short_label(self) -> &'static str {
        match self {
            Self::Bk => "BK",
            Self::Aq => "AQ",
            Self::Gw => "GW",
            Self::Rc => "RC",
            Self::Mp => "MP",
        }
    }

    fn level_of(self, member: &RosterMember) -> Option<u8> {
        match self {
            Self::Bk => member.bk,
            Self::Aq => member.aq,
            Self::Gw => member.gw,
            Self::Rc => member.rc,
            Self::Mp => member.mp,
        }
    }
}

/// Max hero level per town hall, `[bk, aq, gw, rc, mp]`; index 0 is TH7.
/// Zero means the hero is not unlocked at that town hall.
const HERO_CAPS: [[u8; 5]; 11] = [
    [5, 0, 0, 0, 0],       // TH7
    [10, 0, 0, 0, 0],      // TH8
    [30, 30, 0, 0, 10],    // TH9
    [40, 40, 0, 0, 20],    // TH10
    [50, 50, 20, 0, 30],   // TH11
    [65, 65, 40, 0, 40],   // TH12
    [75, 75, 50, 25, 50],  // TH13
    [80, 80, 55, 30, 60],  // TH14
    [90, 90, 65, 40, 70],  // TH15
    [95, 95, 70, 45, 80],  // TH16
    [100, 100, 75, 50, 90], // TH17
];
const FIRST_CAPPED_TH: u8 = 7;

/// Cap for a hero at a town hall; town halls past the table use the last row.
pub fn hero_cap(town_hall: u8, hero: Hero) -> u8 {
    if town_hall < FIRST_CAPPED_TH {
        return 0;
    }
    let row = usize::from(town_hall - FIRST_CAPPED_TH).min(HERO_CAPS.len() - 1);
    let col = Hero::ALL
        .iter()
        .position(|candidate| *candidate == hero)
        .unwrap_or(0);
    HERO_CAPS[row][col]
}

/// One hero's level against its town-hall cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeroLevel {
    pub hero: Hero,
    pub level: Option<u8>,
    pub cap: u8,
}

impl HeroLevel {
    pub fn is_maxed(&self) -> bool {
        self.cap > 0 && self.level.is_some_and(|level| level >= self.cap)
    }
}

/// Heroes unlocked at the member's town hall, in display order.
pub fn hero_levels(member: &RosterMember, town_hall: Option<u8>) -> Vec<HeroLevel> {
    let Some(th) = town_hall else {
        return Vec::new();
    };
    Hero::ALL
        .iter()
        .map(|hero| HeroLevel {
            hero: *hero,
            level: hero.level_of(member),
            cap: hero_cap(th, *hero),
        })
        .filter(|entry| entry.cap > 0)
        .collect()
}

/// Hero shortfall against town-hall caps as a 0..=100 percentage (one decimal).
pub fn rush_percent(member: &RosterMember, town_hall: Option<u8>) -> Option<f64> {
    let levels = hero_levels(member, town_hall);
    if levels.is_empty() || levels.iter().all(|entry| entry.level.is_none()) {
        return None;
    }

    let (missing, total) = levels.iter().fold((0u32, 0u32), |(missing, total), entry| {
        let level = entry.level.unwrap_or(0).min(entry.cap);
        (
            missing + u32::from(entry.cap - level),
            total + u32::from(entry.cap),
        )
    });
    if total == 0 {
        return None;
    }

    let pct = f64::from(missing) * 100.0 / f64::from(total);
    Some((pct * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::{Hero, hero_cap, hero_levels, rush_percent};
    use crate::model::RosterMember;

    fn member(bk: Option<u8>, aq: Option<u8>, mp: Option<u8>) -> RosterMember {
        RosterMember {
            tag: "#Q0LY".into(),
            name: "andrew".into(),
            bk,
            aq,
            mp,
            ..RosterMember::default()
        }
    }

    #[test]
    fn caps_clamp_above_the_table() {
        assert_eq!(hero_cap(17, Hero::Bk), 100);
        assert_eq!(hero_cap(18, Hero::Bk), 100);
        assert_eq!(hero_cap(6, Hero::Bk), 0);
        assert_eq!(hero_cap(12, Hero::Rc), 0);
    }

    #[test]
    fn maxed_heroes_are_not_rushed() {
        let m = member(Some(30), Some(30), Some(10));
        assert_eq!(rush_percent(&m, Some(9)), Some(0.0));
    }

    #[test]
    fn missing_levels_count_as_zero_when_some_data_exists() {
        // TH9 caps: bk 30, aq 30, mp 10 => total 70, missing 30 (aq) + 10 (mp) = 40
        let m = member(Some(30), None, None);
        assert_eq!(rush_percent(&m, Some(9)), Some(57.1));
    }

    #[test]
    fn unknown_without_town_hall_or_hero_data() {
        assert_eq!(rush_percent(&member(Some(10), None, None), None), None);
        assert_eq!(rush_percent(&member(None, None, None), Some(12)), None);
    }

    #[test]
    fn over_cap_levels_do_not_go_negative() {
        let m = member(Some(90), Some(90), Some(90));
        assert_eq!(rush_percent(&m, Some(9)), Some(0.0));
    }

    #[test]
    fn hero_levels_only_lists_unlocked_heroes() {
        let m = member(Some(5), None, None);
        let levels = hero_levels(&m, Some(8));
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].hero, Hero::Bk);
        assert!(!levels[0].is_maxed());
    }
}
