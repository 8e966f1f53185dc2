//! Versioned roster view preferences.
//!
//! Three surfaces hold the same preference: in-memory state, local storage and
//! the URL query string. Loading resolves each field independently with the
//! precedence URL > storage > default; anything unrecognised is dropped.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::columns::{CustomColumns, Preset};
use crate::error::StorageError;
use crate::sort::{SortDirection, SortKey, SortState};

pub const PREFS_VERSION: u32 = 2;

pub const VIEW_KEY: &str = "roster.view";
pub const DENSITY_KEY: &str = "roster.table.density";
pub const PRESET_KEY: &str = "roster.table.preset";
pub const CUSTOM_COLUMNS_KEY: &str = "roster.table.customColumns";
pub const SORT_KEY: &str = "roster.table.sort";
pub const SEARCH_KEY: &str = "roster.search";
pub const VERSION_KEY: &str = "roster.prefs.version";

pub const PREFERENCE_KEYS: [&str; 7] = [
    VIEW_KEY,
    DENSITY_KEY,
    PRESET_KEY,
    CUSTOM_COLUMNS_KEY,
    SORT_KEY,
    SEARCH_KEY,
    VERSION_KEY,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Cards,
    #[default]
    Table,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cards => "cards",
            Self::Table => "table",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match migrate_value(Field::View, raw).as_str() {
            "cards" => Some(Self::Cards),
            "table" => Some(Self::Table),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    #[default]
    Cozy,
    Compact,
}

impl Density {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cozy => "cozy",
            Self::Compact => "compact",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match migrate_value(Field::Density, raw).as_str() {
            "cozy" => Some(Self::Cozy),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Preset parse that understands names from older schema versions.
pub fn parse_preset(raw: &str) -> Option<Preset> {
    Preset::parse(&migrate_value(Field::Preset, raw))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    View,
    Density,
    Preset,
}

/// Values renamed between schema version 1 and 2.
const RENAMED_VALUES: &[(Field, &str, &str)] = &[
    (Field::Preset, "compact", "default"),
    (Field::Preset, "standard", "default"),
    (Field::Preset, "wars", "war"),
    (Field::Preset, "leaders", "leadership"),
    (Field::View, "grid", "cards"),
    (Field::View, "list", "table"),
    (Field::Density, "comfortable", "cozy"),
    (Field::Density, "dense", "compact"),
];

fn migrate_value(field: Field, raw: &str) -> String {
    let value = raw.trim().to_ascii_lowercase();
    RENAMED_VALUES
        .iter()
        .find(|(f, from, _)| *f == field && *from == value)
        .map(|(_, _, to)| (*to).to_string())
        .unwrap_or(value)
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewPreference {
    pub view: ViewMode,
    pub density: Density,
    pub preset: Preset,
    pub columns: CustomColumns,
    pub sort: SortState,
    pub search: String,
}

/// Key/value persistence surface. Local storage in the browser, a map in tests.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

#[derive(Debug, Default)]
struct UrlParams {
    view: Option<String>,
    preset: Option<String>,
    density: Option<String>,
    sort: Option<String>,
    dir: Option<String>,
    q: Option<String>,
}

fn parse_query(query: &str) -> UrlParams {
    let mut params = UrlParams::default();
    let query = query.trim_start_matches('?');
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        let slot = match name.as_ref() {
            "view" => &mut params.view,
            "preset" => &mut params.preset,
            "density" => &mut params.density,
            "sort" => &mut params.sort,
            "dir" => &mut params.dir,
            "q" => &mut params.q,
            _ => continue,
        };
        *slot = Some(value.into_owned());
    }
    params
}

fn stored_columns(store: &impl PreferenceStore) -> Option<CustomColumns> {
    let raw = store.get(CUSTOM_COLUMNS_KEY)?;
    let keys: Vec<String> = serde_json::from_str(&raw).ok()?;
    Some(CustomColumns::from_keys(keys.iter().map(String::as_str)))
}

/// Resolve the preference for a page load from the URL query and storage.
pub fn load(query: &str, store: &impl PreferenceStore) -> ViewPreference {
    let url = parse_query(query);
    let stored_sort = store.get(SORT_KEY).and_then(|raw| SortState::decode(&raw));
    let defaults = ViewPreference::default();

    let view = url
        .view
        .as_deref()
        .and_then(ViewMode::parse)
        .or_else(|| store.get(VIEW_KEY).as_deref().and_then(ViewMode::parse))
        .unwrap_or(defaults.view);
    let density = url
        .density
        .as_deref()
        .and_then(Density::parse)
        .or_else(|| store.get(DENSITY_KEY).as_deref().and_then(Density::parse))
        .unwrap_or(defaults.density);
    let preset = url
        .preset
        .as_deref()
        .and_then(parse_preset)
        .or_else(|| store.get(PRESET_KEY).as_deref().and_then(parse_preset))
        .unwrap_or(defaults.preset);
    let sort = SortState {
        key: url
            .sort
            .as_deref()
            .and_then(SortKey::parse)
            .or(stored_sort.map(|s| s.key))
            .unwrap_or(defaults.sort.key),
        direction: url
            .dir
            .as_deref()
            .and_then(SortDirection::parse)
            .or(stored_sort.map(|s| s.direction))
            .unwrap_or(defaults.sort.direction),
    };
    let search = url
        .q
        .or_else(|| store.get(SEARCH_KEY))
        .unwrap_or_default();

    ViewPreference {
        view,
        density,
        preset,
        columns: stored_columns(store).unwrap_or(defaults.columns),
        sort,
        search,
    }
}

/// Query string mirroring the preference; always carries every parameter.
pub fn to_query(pref: &ViewPreference) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("view", pref.view.as_str())
        .append_pair("preset", pref.preset.as_str())
        .append_pair("density", pref.density.as_str())
        .append_pair("sort", pref.sort.key.as_str())
        .append_pair("dir", pref.sort.direction.as_str())
        .append_pair("q", &pref.search)
        .finish()
}

/// Query string for the page URL: the preference plus the clan being viewed.
pub fn page_query(pref: &ViewPreference, clan: Option<&str>) -> String {
    let mut query = to_query(pref);
    if let Some(clan) = clan.map(str::trim).filter(|clan| !clan.is_empty()) {
        query.push('&');
        query.push_str(
            &form_urlencoded::Serializer::new(String::new())
                .append_pair("clan", clan)
                .finish(),
        );
    }
    query
}

pub fn save(pref: &ViewPreference, store: &impl PreferenceStore) -> Result<(), StorageError> {
    let columns = serde_json::to_string(&pref.columns.to_storage())
        .map_err(|e| StorageError::Encode(e.to_string()))?;
    store.set(VIEW_KEY, pref.view.as_str())?;
    store.set(DENSITY_KEY, pref.density.as_str())?;
    store.set(PRESET_KEY, pref.preset.as_str())?;
    store.set(CUSTOM_COLUMNS_KEY, &columns)?;
    store.set(SORT_KEY, &pref.sort.encode())?;
    store.set(SEARCH_KEY, &pref.search)?;
    store.set(VERSION_KEY, &PREFS_VERSION.to_string())?;
    Ok(())
}

pub fn stored_version(store: &impl PreferenceStore) -> Option<u32> {
    store
        .get(VERSION_KEY)
        .and_then(|raw| raw.trim().parse().ok())
}

/// Rewrite storage written by an older schema into the current one.
///
/// Returns `true` when anything had to be rewritten.
pub fn migrate_store(store: &impl PreferenceStore) -> Result<bool, StorageError> {
    if stored_version(store).is_some_and(|v| v >= PREFS_VERSION) {
        return Ok(false);
    }
    let migrated = load("", store);
    for key in PREFERENCE_KEYS {
        store.remove(key);
    }
    save(&migrated, store)?;
    Ok(true)
}

/// Drop every stored preference and return the defaults.
pub fn reset(store: &impl PreferenceStore) -> ViewPreference {
    for key in PREFERENCE_KEYS {
        store.remove(key);
    }
    ViewPreference::default()
}

#[cfg(test)]
mod tests {
    use super::{
        CUSTOM_COLUMNS_KEY, DENSITY_KEY, Density, MemoryStore, PRESET_KEY, PREFS_VERSION,
        PreferenceStore, SORT_KEY, VIEW_KEY, ViewMode, ViewPreference, load, migrate_store,
        page_query, reset, save, stored_version, to_query,
    };
    use crate::columns::{ColumnKey, Preset};
    use crate::error::StorageError;
    use crate::sort::{SortDirection, SortKey, SortState};

    fn store_with(entries: &[(&str, &str)]) -> MemoryStore {
        let store = MemoryStore::new();
        for (key, value) in entries {
            let _ = store.set(key, value);
        }
        store
    }

    #[test]
    fn empty_surfaces_give_defaults() {
        assert_eq!(load("", &MemoryStore::new()), ViewPreference::default());
    }

    #[test]
    fn url_round_trip_reconstructs_preference() {
        let mut pref = ViewPreference::default();
        pref.view = ViewMode::Table;
        pref.density = Density::Compact;
        pref.preset = Preset::Leadership;
        let query = to_query(&pref);
        assert_eq!(load(&query, &MemoryStore::new()), pref);
        assert_eq!(load(&format!("?{query}"), &MemoryStore::new()), pref);
    }

    #[test]
    fn url_beats_storage_which_beats_default() {
        let store = store_with(&[
            (VIEW_KEY, "cards"),
            (DENSITY_KEY, "compact"),
            (PRESET_KEY, "economy"),
            (SORT_KEY, "donations:asc"),
        ]);
        let pref = load("view=table&sort=vip", &store);
        assert_eq!(pref.view, ViewMode::Table);
        assert_eq!(pref.density, Density::Compact);
        assert_eq!(pref.preset, Preset::Economy);
        assert_eq!(
            pref.sort,
            SortState {
                key: SortKey::Vip,
                direction: SortDirection::Asc
            }
        );
    }

    #[test]
    fn invalid_url_values_fall_through() {
        let store = store_with(&[(PRESET_KEY, "war")]);
        let pref = load("preset=mystery&view=hologram&dir=sideways", &store);
        assert_eq!(pref.preset, Preset::War);
        assert_eq!(pref.view, ViewMode::default());
        assert_eq!(pref.sort.direction, SortDirection::Desc);
    }

    #[test]
    fn search_query_is_decoded() {
        let pref = load("q=Zo%C3%AB+b", &MemoryStore::new());
        assert_eq!(pref.search, "Zoë b");
        let encoded = to_query(&pref);
        assert!(encoded.contains("q=Zo%C3%AB+b"));
    }

    #[test]
    fn legacy_names_are_migrated() {
        let store = store_with(&[
            (PRESET_KEY, "compact"),
            (VIEW_KEY, "grid"),
            (DENSITY_KEY, "dense"),
            (CUSTOM_COLUMNS_KEY, r#"["th","bogus","th","vip"]"#),
        ]);
        let pref = load("", &store);
        assert_eq!(pref.preset, Preset::Default);
        assert_eq!(pref.view, ViewMode::Cards);
        assert_eq!(pref.density, Density::Compact);
        assert_eq!(pref.columns.keys(), &[ColumnKey::Th, ColumnKey::Vip]);
        assert_eq!(load("preset=wars", &store).preset, Preset::War);
    }

    #[test]
    fn malformed_columns_blob_uses_default_columns() {
        let store = store_with(&[(CUSTOM_COLUMNS_KEY, "{not json")]);
        assert_eq!(load("", &store).columns, ViewPreference::default().columns);
    }

    #[test]
    fn migrate_store_rewrites_once() {
        let store = store_with(&[(PRESET_KEY, "leaders"), (VIEW_KEY, "list")]);
        assert_eq!(stored_version(&store), None);
        assert_eq!(migrate_store(&store), Ok(true));
        assert_eq!(store.get(PRESET_KEY).as_deref(), Some("leadership"));
        assert_eq!(store.get(VIEW_KEY).as_deref(), Some("table"));
        assert_eq!(stored_version(&store), Some(PREFS_VERSION));
        assert_eq!(migrate_store(&store), Ok(false));
    }

    #[test]
    fn save_then_load_and_reset() {
        let store = MemoryStore::new();
        let mut pref = ViewPreference::default();
        pref.preset = Preset::Custom;
        pref.columns.toggle(ColumnKey::WarAttacks);
        pref.search = "froggy".into();
        assert!(save(&pref, &store).is_ok());
        assert_eq!(load("", &store), pref);

        assert_eq!(reset(&store), ViewPreference::default());
        assert!(store.is_empty());
    }

    /// Storage that refuses everything, as in private browsing.
    struct DisabledStore;

    impl PreferenceStore for DisabledStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }

        fn remove(&self, _key: &str) {}
    }

    #[test]
    fn disabled_storage_still_loads_defaults() {
        assert_eq!(migrate_store(&DisabledStore), Err(StorageError::Unavailable));
        assert_eq!(load("", &DisabledStore), ViewPreference::default());
        assert_eq!(
            save(&ViewPreference::default(), &DisabledStore),
            Err(StorageError::Unavailable)
        );
        assert_eq!(reset(&DisabledStore), ViewPreference::default());
    }

    #[test]
    fn disabled_storage_keeps_url_preferences() {
        let pref = load("view=cards&density=compact", &DisabledStore);
        assert_eq!(pref.view, ViewMode::Cards);
        assert_eq!(pref.density, Density::Compact);
    }

    #[test]
    fn page_query_encodes_clan_tag() {
        let pref = ViewPreference::default();
        let query = page_query(&pref, Some("#2PR8R8V8P"));
        assert!(query.ends_with("&clan=%232PR8R8V8P"));
        assert!(!query.contains('#'));

        let clan = url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "clan")
            .map(|(_, value)| value.into_owned());
        assert_eq!(clan.as_deref(), Some("#2PR8R8V8P"));
        assert_eq!(load(&query, &MemoryStore::new()), pref);
    }

    #[test]
    fn page_query_without_clan_is_the_preference_query() {
        let pref = ViewPreference::default();
        assert_eq!(page_query(&pref, None), to_query(&pref));
        assert_eq!(page_query(&pref, Some("  ")), to_query(&pref));
    }
}
