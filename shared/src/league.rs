use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Display-ready league: base name plus optional tier (I = best within the base).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct League {
    pub name: String,
    pub tier: Option<u8>,
}

/// Base leagues from most to least prestigious, with their rank weight.
const LEAGUE_RANKS: [(&str, u8); 8] = [
    ("legend", 9),
    ("titan", 8),
    ("champion", 7),
    ("master", 6),
    ("crystal", 5),
    ("gold", 4),
    ("silver", 3),
    ("bronze", 2),
];

/// Any other named league still outranks "no league".
const UNLISTED_LEAGUE_RANK: u8 = 1;

impl League {
    pub fn label(&self) -> String {
        match self.tier {
            Some(tier) => format!("{} {}", self.name, roman(tier)),
            None => self.name.clone(),
        }
    }

    /// Rank weight of the base league name (Legend 9 .. Bronze 2, others 1).
    pub fn base_rank(&self) -> u8 {
        let lower = self.name.to_ascii_lowercase();
        LEAGUE_RANKS
            .iter()
            .find(|(key, _)| lower.split_whitespace().any(|word| word == *key))
            .map(|(_, rank)| *rank)
            .unwrap_or(UNLISTED_LEAGUE_RANK)
    }

    /// Prestige ordering: higher base first, then lower tier numeral first.
    /// A base league without tiers ranks above its own tier I.
    pub fn prestige_cmp(&self, other: &League) -> Ordering {
        self.base_rank()
            .cmp(&other.base_rank())
            .then_with(|| tier_weight(other.tier).cmp(&tier_weight(self.tier)))
    }
}

fn tier_weight(tier: Option<u8>) -> u8 {
    tier.unwrap_or(0)
}

/// Split a raw league name like `"Titan League II"` into base and tier.
/// Empty or `"Unranked"` names mean the member has no league.
pub fn parse_league_name(raw: &str) -> Option<League> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unranked") {
        return None;
    }

    if let Some((base, last)) = trimmed.rsplit_once(char::is_whitespace)
        && let Some(tier) = parse_tier(last)
    {
        let base = base.trim_end();
        if !base.is_empty() {
            return Some(League {
                name: base.to_string(),
                tier: Some(tier),
            });
        }
    }

    Some(League {
        name: trimmed.to_string(),
        tier: None,
    })
}

fn parse_tier(token: &str) -> Option<u8> {
    match token.to_ascii_uppercase().as_str() {
        "I" => Some(1),
        "II" => Some(2),
        "III" => Some(3),
        "IV" => Some(4),
        "V" => Some(5),
        digits if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
            digits.parse::<u8>().ok().filter(|tier| *tier > 0)
        }
        _ => None,
    }
}

fn roman(tier: u8) -> String {
    match tier {
        1 => "I".to_string(),
        2 => "II".to_string(),
        3 => "III".to_string(),
        4 => "IV".to_string(),
        5 => "V".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::{League, parse_league_name};

    fn league(name: &str, tier: Option<u8>) -> League {
        League {
            name: name.to_string(),
            tier,
        }
    }

    #[test]
    fn parses_roman_and_numeric_tiers() {
        assert_eq!(
            parse_league_name("Titan League II"),
            Some(league("Titan League", Some(2)))
        );
        assert_eq!(
            parse_league_name("Gold League 3"),
            Some(league("Gold League", Some(3)))
        );
        assert_eq!(
            parse_league_name("Legend League"),
            Some(league("Legend League", None))
        );
    }

    #[test]
    fn unranked_and_empty_have_no_league() {
        assert_eq!(parse_league_name(""), None);
        assert_eq!(parse_league_name("  Unranked "), None);
    }

    #[test]
    fn single_token_tier_is_kept_as_name() {
        assert_eq!(parse_league_name("III"), Some(league("III", None)));
    }

    #[test]
    fn base_rank_follows_prestige_table() {
        assert_eq!(league("Legend League", None).base_rank(), 9);
        assert_eq!(league("Bronze League", Some(3)).base_rank(), 2);
        assert_eq!(league("Skeleton League", Some(1)).base_rank(), 1);
    }

    #[test]
    fn lower_tier_numeral_ranks_higher() {
        let titan_one = league("Titan League", Some(1));
        let titan_three = league("Titan League", Some(3));
        let legend = league("Legend League", None);
        assert_eq!(titan_one.prestige_cmp(&titan_three), Ordering::Greater);
        assert_eq!(legend.prestige_cmp(&titan_one), Ordering::Greater);
        assert_eq!(
            league("Master League", None).prestige_cmp(&league("Master League", Some(1))),
            Ordering::Greater
        );
    }

    #[test]
    fn label_renders_roman_tier() {
        assert_eq!(league("Crystal League", Some(2)).label(), "Crystal League II");
    }
}
