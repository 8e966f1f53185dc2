//! Roster page state and the pure reducer that owns every mutation of it.

use serde::{Deserialize, Serialize};

use crate::columns::{ColumnKey, MoveDirection, Preset, project_columns};
use crate::filter::{filter_members, is_new_joiner};
use crate::model::{RosterMember, WarMetricsMap};
use crate::preferences::{Density, ViewMode, ViewPreference};
use crate::resolver::{ResolvedMember, resolve_all};
use crate::sort::{SortKey, sort_members};

/// Which member list the page is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RosterScope {
    #[default]
    Current,
    Former,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RosterViewState {
    pub preference: ViewPreference,
    pub new_joiners_only: bool,
    pub scope: RosterScope,
}

impl RosterViewState {
    pub fn from_preference(preference: ViewPreference) -> Self {
        Self {
            preference,
            ..Self::default()
        }
    }

    /// Columns between the fixed Player and Actions columns.
    pub fn columns(&self) -> Vec<ColumnKey> {
        project_columns(self.preference.preset, &self.preference.columns)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetView(ViewMode),
    SetDensity(Density),
    SetPreset(Preset),
    ToggleColumn(ColumnKey),
    MoveColumn(ColumnKey, MoveDirection),
    ClickSort(SortKey),
    SetSearch(String),
    ToggleNewJoiners,
    SetScope(RosterScope),
    Reset,
}

impl Action {
    /// Whether applying this action changes something that gets persisted.
    pub fn touches_preference(&self) -> bool {
        !matches!(self, Self::ToggleNewJoiners | Self::SetScope(_))
    }
}

pub fn reduce(state: RosterViewState, action: Action) -> RosterViewState {
    let mut next = state;
    let pref = &mut next.preference;
    match action {
        Action::SetView(view) => pref.view = view,
        Action::SetDensity(density) => pref.density = density,
        Action::SetPreset(preset) => pref.preset = preset,
        Action::ToggleColumn(key) => {
            // Editing columns starts from what is on screen.
            if pref.preset != Preset::Custom {
                pref.columns = crate::columns::CustomColumns::new(project_columns(
                    pref.preset,
                    &pref.columns,
                ));
                pref.preset = Preset::Custom;
            }
            pref.columns.toggle(key);
        }
        Action::MoveColumn(key, direction) => {
            if pref.preset == Preset::Custom {
                pref.columns.move_column(key, direction);
            }
        }
        Action::ClickSort(key) => pref.sort = pref.sort.click(key),
        Action::SetSearch(query) => pref.search = query,
        Action::ToggleNewJoiners => next.new_joiners_only = !next.new_joiners_only,
        Action::SetScope(scope) => next.scope = scope,
        Action::Reset => return RosterViewState::default(),
    }
    next
}

pub type RosterRow = ResolvedMember;

/// resolve → new-joiner filter → text filter → sort.
pub fn derive_rows(
    members: &[RosterMember],
    war_metrics: &WarMetricsMap,
    state: &RosterViewState,
) -> Vec<RosterRow> {
    let mut rows = resolve_all(members, war_metrics);
    if state.new_joiners_only {
        rows.retain(is_new_joiner);
    }
    let mut rows = filter_members(rows, &state.preference.search);
    sort_members(&mut rows, state.preference.sort);
    rows
}

/// One rendered row: the member plus its cell text in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedRow {
    pub key: String,
    pub name: String,
    pub tag: String,
    pub cells: Vec<(ColumnKey, String)>,
}

pub fn project(rows: &[RosterRow], columns: &[ColumnKey]) -> Vec<ProjectedRow> {
    rows.iter()
        .map(|row| ProjectedRow {
            key: row.key.clone(),
            name: row.member.name.clone(),
            tag: row.member.tag.clone(),
            cells: columns
                .iter()
                .map(|column| (*column, column.cell_text(row)))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Action, RosterScope, RosterViewState, derive_rows, project, reduce};
    use crate::columns::{ColumnKey, MISSING, MoveDirection, Preset};
    use crate::model::{RosterMember, WarMetrics, WarMetricsMap};
    use crate::preferences::{Density, ViewMode};
    use crate::sort::{SortDirection, SortKey};

    fn roster() -> Vec<RosterMember> {
        (0..10u32)
            .map(|i| RosterMember {
                tag: format!("#PQ{i}"),
                name: format!("member{i}"),
                tenure_days: Some(if i == 3 || i == 8 { 2 + i / 4 } else { 30 + i }),
                trophies: Some(4000 + i64::from(i)),
                ..RosterMember::default()
            })
            .collect()
    }

    fn tags(rows: &[super::RosterRow]) -> Vec<&str> {
        let mut tags: Vec<&str> = rows.iter().map(|r| r.member.tag.as_str()).collect();
        tags.sort_unstable();
        tags
    }

    #[test]
    fn new_joiner_toggle_narrows_then_restores() {
        let members = roster();
        let war = WarMetricsMap::new();
        let state = RosterViewState::default();
        assert_eq!(derive_rows(&members, &war, &state).len(), 10);

        let state = reduce(state, Action::ToggleNewJoiners);
        let rows = derive_rows(&members, &war, &state);
        assert_eq!(tags(&rows), vec!["#PQ3", "#PQ8"]);

        let state = reduce(state, Action::ToggleNewJoiners);
        assert_eq!(derive_rows(&members, &war, &state).len(), 10);
    }

    #[test]
    fn search_and_new_joiners_compose() {
        let members = roster();
        let state = reduce(RosterViewState::default(), Action::ToggleNewJoiners);
        let state = reduce(state, Action::SetSearch("member8".into()));
        let rows = derive_rows(&members, &WarMetricsMap::new(), &state);
        assert_eq!(tags(&rows), vec!["#PQ8"]);
    }

    #[test]
    fn sort_click_applies_to_derived_rows() {
        let members = roster();
        let state = reduce(RosterViewState::default(), Action::ClickSort(SortKey::Trophies));
        assert_eq!(state.preference.sort.direction, SortDirection::Desc);
        let rows = derive_rows(&members, &WarMetricsMap::new(), &state);
        assert_eq!(rows[0].member.tag, "#PQ9");

        let state = reduce(state, Action::ClickSort(SortKey::Trophies));
        let rows = derive_rows(&members, &WarMetricsMap::new(), &state);
        assert_eq!(rows[0].member.tag, "#PQ0");
    }

    #[test]
    fn preset_switch_keeps_custom_list() {
        let state = reduce(RosterViewState::default(), Action::SetPreset(Preset::Custom));
        let state = reduce(state, Action::ToggleColumn(ColumnKey::WarAttacks));
        let custom = state.preference.columns.clone();
        let state = reduce(state, Action::SetPreset(Preset::War));
        assert_eq!(state.preference.columns, custom);
        let state = reduce(state, Action::SetPreset(Preset::Custom));
        assert_eq!(state.columns().last(), Some(&ColumnKey::WarAttacks));
    }

    #[test]
    fn toggling_on_a_named_preset_forks_it_into_custom() {
        let state = reduce(RosterViewState::default(), Action::SetPreset(Preset::Economy));
        let state = reduce(state, Action::ToggleColumn(ColumnKey::Ratio));
        assert_eq!(state.preference.preset, Preset::Custom);
        assert_eq!(
            state.columns(),
            vec![
                ColumnKey::Donations,
                ColumnKey::Received,
                ColumnKey::Trophies,
                ColumnKey::Srs
            ]
        );
    }

    #[test]
    fn move_only_applies_in_custom_mode() {
        let state = reduce(RosterViewState::default(), Action::MoveColumn(ColumnKey::League, MoveDirection::Up));
        assert_eq!(state, RosterViewState::default());

        let state = reduce(state, Action::SetPreset(Preset::Custom));
        let state = reduce(state, Action::MoveColumn(ColumnKey::League, MoveDirection::Up));
        assert_eq!(&state.columns()[..2], &[ColumnKey::League, ColumnKey::Th]);
    }

    #[test]
    fn reset_restores_defaults() {
        let state = reduce(RosterViewState::default(), Action::SetView(ViewMode::Cards));
        let state = reduce(state, Action::SetDensity(Density::Compact));
        let state = reduce(state, Action::SetScope(RosterScope::Former));
        assert_eq!(reduce(state, Action::Reset), RosterViewState::default());
    }

    #[test]
    fn scope_and_joiner_toggles_are_not_persisted() {
        assert!(!Action::ToggleNewJoiners.touches_preference());
        assert!(!Action::SetScope(RosterScope::Former).touches_preference());
        assert!(Action::SetView(ViewMode::Cards).touches_preference());
    }

    #[test]
    fn war_columns_render_placeholder_without_metrics() {
        let members = roster();
        let mut war = WarMetricsMap::new();
        war.insert(
            "PQ1".into(),
            WarMetrics {
                avg_stars: Some(2.5),
                triple_rate: Some(0.5),
                ..WarMetrics::default()
            },
        );
        let state = reduce(RosterViewState::default(), Action::SetPreset(Preset::War));
        let rows = derive_rows(&members, &war, &state);
        let projected = project(&rows, &state.columns());
        let with_metrics = projected.iter().find(|r| r.tag == "#PQ1");
        let without = projected.iter().find(|r| r.tag == "#PQ2");

        let cell = |row: Option<&super::ProjectedRow>, key: ColumnKey| {
            row.and_then(|r| r.cells.iter().find(|(k, _)| *k == key))
                .map(|(_, text)| text.clone())
        };
        assert_eq!(cell(with_metrics, ColumnKey::WarAvgStars).as_deref(), Some("2.50"));
        assert_eq!(cell(with_metrics, ColumnKey::WarTripleRate).as_deref(), Some("50%"));
        assert_eq!(cell(without, ColumnKey::WarAvgStars).as_deref(), Some(MISSING));
        assert_eq!(cell(without, ColumnKey::WarTripleRate).as_deref(), Some(MISSING));
    }
}
