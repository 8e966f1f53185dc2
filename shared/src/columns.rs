use serde::{Deserialize, Serialize};

use crate::resolver::{ResolvedMember, donation_ratio};
use crate::sort::SortKey;

/// Placeholder for any value we cannot show.
pub const MISSING: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKey {
    Role,
    Th,
    League,
    Trophies,
    Vip,
    Rush,
    Heroes,
    Srs,
    Donations,
    Received,
    Ratio,
    Tenure,
    WarAvgStars,
    WarTripleRate,
    WarLowHitRate,
    WarAvgDestruction,
    WarAttacks,
}

impl ColumnKey {
    pub const ALL: [ColumnKey; 17] = [
        ColumnKey::Role,
        ColumnKey::Th,
        ColumnKey::League,
        ColumnKey::Trophies,
        ColumnKey::Vip,
        ColumnKey::Rush,
        ColumnKey::Heroes,
        ColumnKey::Srs,
        ColumnKey::Donations,
        ColumnKey::Received,
        ColumnKey::Ratio,
        ColumnKey::Tenure,
        ColumnKey::WarAvgStars,
        ColumnKey::WarTripleRate,
        ColumnKey::WarLowHitRate,
        ColumnKey::WarAvgDestruction,
        ColumnKey::WarAttacks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Th => "th",
            Self::League => "league",
            Self::Trophies => "trophies",
            Self::Vip => "vip",
            Self::Rush => "rush",
            Self::Heroes => "heroes",
            Self::Srs => "srs",
            Self::Donations => "donations",
            Self::Received => "received",
            Self::Ratio => "ratio",
            Self::Tenure => "tenure",
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

    pub fn label(self) -> &'static str {
        match self {
            Self::Role => "Role",
            Self::Th => "TH",
            Self::League => "League",
            Self::Trophies => "Trophies",
            Self::Vip => "VIP",
            Self::Rush => "Rush %",
            Self::Heroes => "Heroes",
            Self::Srs => "Activity",
            Self::Donations => "Donated",
            Self::Received => "Received",
            Self::Ratio => "Ratio",
            Self::Tenure => "Tenure",
            Self::WarAvgStars => "Avg ★",
            Self::WarTripleRate => "3★ %",
            Self::WarLowHitRate => "Low Hit %",
            Self::WarAvgDestruction => "Avg Dest %",
            Self::WarAttacks => "Attacks",
        }
    }

    pub fn sort_key(self) -> Option<SortKey> {
        match self {
            Self::Th => Some(SortKey::Th),
            Self::League => Some(SortKey::League),
            Self::Trophies => Some(SortKey::Trophies),
            Self::Vip => Some(SortKey::Vip),
            Self::Rush => Some(SortKey::Rush),
            Self::Srs => Some(SortKey::Srs),
            Self::Donations => Some(SortKey::Donations),
            Self::Received => Some(SortKey::Received),
            Self::Tenure => Some(SortKey::Tenure),
            Self::WarAvgStars => Some(SortKey::WarAvgStars),
            Self::WarTripleRate => Some(SortKey::WarTripleRate),
            Self::WarLowHitRate => Some(SortKey::WarLowHitRate),
            Self::WarAvgDestruction => Some(SortKey::WarAvgDestruction),
            Self::WarAttacks => Some(SortKey::WarAttacks),
            Self::Role | Self::Heroes | Self::Ratio => None,
        }
    }

    pub fn is_war(self) -> bool {
        matches!(
            self,
            Self::WarAvgStars
                | Self::WarTripleRate
                | Self::WarLowHitRate
                | Self::WarAvgDestruction
                | Self::WarAttacks
        )
    }

    /// Relative width weight used by the layout heuristic.
    fn weight(self) -> f64 {
        match self {
            Self::League => 2.0,
            Self::Heroes => 2.4,
            Self::Role | Self::Srs => 1.4,
            Self::Trophies | Self::Donations | Self::Received | Self::Tenure => 1.2,
            Self::Th | Self::Vip | Self::Rush | Self::Ratio => 1.0,
            Self::WarAvgStars | Self::WarAttacks => 1.0,
            Self::WarTripleRate | Self::WarLowHitRate | Self::WarAvgDestruction => 1.2,
        }
    }

    /// Cell text for one member; never panics, missing data renders as `—`.
    pub fn cell_text(self, row: &ResolvedMember) -> String {
        let war = row.war.as_ref();
        let text = match self {
            Self::Role => Some(row.role.label().to_string()),
            Self::Th => row.town_hall.map(|th| th.to_string()),
            Self::League => row.league.as_ref().map(|league| league.label()),
            Self::Trophies => row.trophies.map(format_thousands),
            Self::Vip => row.member.vip_score.map(|v| format!("{v:.1}")),
            Self::Rush => row.rush_percent.map(|v| format!("{v:.1}%")),
            Self::Heroes => heroes_text(row),
            Self::Srs => Some(match row.activity.score {
                Some(score) => format!("{} ({score:.0})", row.activity.level.label()),
                None => row.activity.level.label().to_string(),
            }),
            Self::Donations => row.member.donations.map(format_thousands),
            Self::Received => row.member.donations_received.map(format_thousands),
            Self::Ratio => donation_ratio(&row.member).map(|v| format!("{v:.2}")),
            Self::Tenure => row.member.tenure_days.map(|days| format!("{days}d")),
            Self::WarAvgStars => war.and_then(|w| w.avg_stars).map(|v| format!("{v:.2}")),
            Self::WarTripleRate => war.and_then(|w| w.triple_rate).map(format_rate),
            Self::WarLowHitRate => war.and_then(|w| w.low_hit_rate).map(format_rate),
            Self::WarAvgDestruction => war
                .and_then(|w| w.avg_destruction_pct)
                .map(|v| format!("{v:.1}%")),
            Self::WarAttacks => war.and_then(|w| w.attacks_used).map(|v| v.to_string()),
        };
        text.unwrap_or_else(|| MISSING.to_string())
    }
}

fn heroes_text(row: &ResolvedMember) -> Option<String> {
    if row.heroes.iter().all(|hero| hero.level.is_none()) {
        return None;
    }
    Some(
        row.heroes
            .iter()
            .map(|hero| {
                format!(
                    "{} {}",
                    hero.hero.short_label(),
                    hero.level.map_or_else(|| MISSING.to_string(), |l| l.to_string())
                )
            })
            .collect::<Vec<_>>()
            .join(" · "),
    )
}

/// Resolved rates are 0..1 fractions.
fn format_rate(value: f64) -> String {
    format!("{:.0}%", value * 100.0)
}

pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    Default,
    War,
    Leadership,
    Economy,
    Custom,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Default,
        Preset::War,
        Preset::Leadership,
        Preset::Economy,
        Preset::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::War => "war",
            Self::Leadership => "leadership",
            Self::Economy => "economy",
            Self::Custom => "custom",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str().eq_ignore_ascii_case(raw))
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::War => "War",
            Self::Leadership => "Leadership",
            Self::Economy => "Economy",
            Self::Custom => "Custom",
        }
    }

    /// Fixed column list of a named preset; `Custom` has none of its own.
    pub fn columns(self) -> Option<&'static [ColumnKey]> {
        use ColumnKey::*;
        match self {
            Self::Default => Some(&[Th, League, Trophies, Rush, Srs, Donations, Received, Tenure]),
            Self::War => Some(&[
                Th,
                League,
                Trophies,
                Vip,
                Rush,
                Heroes,
                WarAvgStars,
                WarTripleRate,
            ]),
            Self::Leadership => Some(&[Role, Th, League, Srs, Vip, Tenure, Donations, Received]),
            Self::Economy => Some(&[Donations, Received, Ratio, Trophies, Srs]),
            Self::Custom => None,
        }
    }
}

/// The ordered, user-picked column list behind the `custom` preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomColumns(Vec<ColumnKey>);

impl Default for CustomColumns {
    fn default() -> Self {
        Self(Preset::Default.columns().unwrap_or_default().to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

impl CustomColumns {
    /// Build from untrusted input: unknown keys were already dropped by the
    /// caller, duplicates keep their first position.
    pub fn new(keys: impl IntoIterator<Item = ColumnKey>) -> Self {
        let mut out: Vec<ColumnKey> = Vec::new();
        for key in keys {
            if !out.contains(&key) {
                out.push(key);
            }
        }
        Self(out)
    }

    /// Parse stored keys, skipping any this build no longer knows.
    pub fn from_keys<'a>(raw: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(raw.into_iter().filter_map(ColumnKey::parse))
    }

    pub fn keys(&self) -> &[ColumnKey] {
        &self.0
    }

    pub fn contains(&self, key: ColumnKey) -> bool {
        self.0.contains(&key)
    }

    /// Checkbox semantics: present columns are removed, absent ones appended.
    pub fn toggle(&mut self, key: ColumnKey) {
        if let Some(idx) = self.0.iter().position(|k| *k == key) {
            self.0.remove(idx);
        } else {
            self.0.push(key);
        }
    }

    /// Swap with the adjacent neighbour; no-op at the edges or when absent.
    pub fn move_column(&mut self, key: ColumnKey, direction: MoveDirection) {
        let Some(idx) = self.0.iter().position(|k| *k == key) else {
            return;
        };
        match direction {
            MoveDirection::Up if idx > 0 => self.0.swap(idx, idx - 1),
            MoveDirection::Down if idx + 1 < self.0.len() => self.0.swap(idx, idx + 1),
            _ => {}
        }
    }

    pub fn to_storage(&self) -> Vec<&'static str> {
        self.0.iter().map(|key| key.as_str()).collect()
    }
}

/// Ordered columns to render between the fixed Player and Actions columns.
pub fn project_columns(preset: Preset, custom: &CustomColumns) -> Vec<ColumnKey> {
    preset
        .columns()
        .map(<[ColumnKey]>::to_vec)
        .unwrap_or_else(|| custom.keys().to_vec())
}

pub const PLAYER_COLUMN_PCT: f64 = 22.0;
pub const ACTIONS_COLUMN_PCT: f64 = 8.0;

/// Width plan in percent: `(player, per-column, actions)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnWidths {
    pub player: f64,
    pub columns: Vec<(ColumnKey, f64)>,
    pub actions: f64,
}

pub fn column_widths(columns: &[ColumnKey]) -> ColumnWidths {
    let remaining = 100.0 - PLAYER_COLUMN_PCT - ACTIONS_COLUMN_PCT;
    let total_weight: f64 = columns.iter().map(|key| key.weight()).sum();
    let widths = columns
        .iter()
        .map(|key| {
            let share = if total_weight > 0.0 {
                key.weight() / total_weight
            } else {
                0.0
            };
            (*key, remaining * share)
        })
        .collect();

    if columns.is_empty() {
        return ColumnWidths {
            player: 100.0 - ACTIONS_COLUMN_PCT,
            columns: widths,
            actions: ACTIONS_COLUMN_PCT,
        };
    }

    ColumnWidths {
        player: PLAYER_COLUMN_PCT,
        columns: widths,
        actions: ACTIONS_COLUMN_PCT,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ColumnKey, CustomColumns, MISSING, MoveDirection, Preset, column_widths,
        format_rate, format_thousands, project_columns,
    };
    use crate::model::{RosterMember, WarMetricsMap};
    use crate::resolver::ResolvedMember;

    #[test]
    fn war_preset_is_fixed() {
        use ColumnKey::*;
        assert_eq!(
            project_columns(Preset::War, &CustomColumns::default()),
            vec![
                Th,
                League,
                Trophies,
                Vip,
                Rush,
                Heroes,
                WarAvgStars,
                WarTripleRate
            ]
        );
    }

    #[test]
    fn presets_ignore_custom_list_and_custom_uses_it() {
        let custom = CustomColumns::new([ColumnKey::Tenure, ColumnKey::Role]);
        assert_eq!(
            project_columns(Preset::Economy, &custom),
            Preset::Economy.columns().unwrap_or_default().to_vec()
        );
        assert_eq!(
            project_columns(Preset::Custom, &custom),
            vec![ColumnKey::Tenure, ColumnKey::Role]
        );
    }

    #[test]
    fn toggle_has_checkbox_semantics() {
        let mut custom = CustomColumns::new([ColumnKey::Th]);
        custom.toggle(ColumnKey::Vip);
        assert_eq!(custom.keys(), &[ColumnKey::Th, ColumnKey::Vip]);
        custom.toggle(ColumnKey::Th);
        assert_eq!(custom.keys(), &[ColumnKey::Vip]);
    }

    #[test]
    fn move_swaps_with_neighbour_and_stops_at_edges() {
        let mut custom = CustomColumns::new([ColumnKey::Th, ColumnKey::League, ColumnKey::Vip]);
        custom.move_column(ColumnKey::Vip, MoveDirection::Up);
        assert_eq!(custom.keys(), &[ColumnKey::Th, ColumnKey::Vip, ColumnKey::League]);
        custom.move_column(ColumnKey::Th, MoveDirection::Up);
        assert_eq!(custom.keys(), &[ColumnKey::Th, ColumnKey::Vip, ColumnKey::League]);
        custom.move_column(ColumnKey::League, MoveDirection::Down);
        assert_eq!(custom.keys(), &[ColumnKey::Th, ColumnKey::Vip, ColumnKey::League]);
        custom.move_column(ColumnKey::Role, MoveDirection::Down);
        assert_eq!(custom.keys().len(), 3);
    }

    #[test]
    fn stored_keys_drop_unknown_and_duplicates() {
        let custom = CustomColumns::from_keys(["th", "obsolete", "vip", "th"]);
        assert_eq!(custom.keys(), &[ColumnKey::Th, ColumnKey::Vip]);
        assert_eq!(custom.to_storage(), vec!["th", "vip"]);
    }

    #[test]
    fn widths_fill_remaining_space() {
        let widths = column_widths(&[ColumnKey::Th, ColumnKey::League, ColumnKey::Heroes]);
        let total: f64 =
            widths.player + widths.actions + widths.columns.iter().map(|(_, w)| w).sum::<f64>();
        assert!((total - 100.0).abs() < 1e-9);
        assert!(widths.columns[2].1 > widths.columns[0].1);
    }

    #[test]
    fn missing_war_metrics_render_placeholder() {
        let member = RosterMember {
            tag: "#Q0LY".into(),
            name: "andrew".into(),
            ..RosterMember::default()
        };
        let row = ResolvedMember::resolve(&member, &WarMetricsMap::new());
        for key in ColumnKey::ALL.into_iter().filter(|key| key.is_war()) {
            assert_eq!(key.cell_text(&row), MISSING);
        }
        assert_eq!(ColumnKey::Heroes.cell_text(&row), MISSING);
        assert_eq!(ColumnKey::Role.cell_text(&row), "Member");
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(5100), "5,100");
        assert_eq!(format_thousands(-1_234_567), "-1,234,567");
    }

    #[test]
    fn rates_always_render_as_fractions() {
        assert_eq!(format_rate(0.01), "1%");
        assert_eq!(format_rate(1.0), "100%");
        assert_eq!(format_rate(0.0), "0%");
        assert_eq!(format_rate(0.876), "88%");
    }
}
