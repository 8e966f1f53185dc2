use std::collections::BTreeSet;

use clanboard_shared::StorageError;
use clanboard_shared::model::Role;
use clanboard_shared::notes::{NOTES_KEY, NoteBook};
use clanboard_shared::permissions::VIEWER_ROLE_KEY;
use clanboard_shared::preferences::PreferenceStore;
use clanboard_shared::roster_diff::last_seen_tags_key;

/// `window.localStorage`, or `None` when the browser refuses access
/// (private mode, sandboxed iframe, blocked third-party storage).
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

/// Browser local storage holding raw (non-JSON) preference strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl PreferenceStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        local_storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        local_storage()
            .ok_or(StorageError::Unavailable)?
            .set_item(key, value)
            .map_err(|e| StorageError::Write(format!("{e:?}")))
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = local_storage() {
            let _ = storage.remove_item(key);
        }
    }
}

pub fn load_viewer_role() -> Role {
    LocalStore
        .get(VIEWER_ROLE_KEY)
        .map(|raw| Role::parse(&raw))
        .unwrap_or(Role::Member)
}

pub fn save_viewer_role(role: Role) -> Result<(), StorageError> {
    LocalStore.set(VIEWER_ROLE_KEY, role.as_key())
}

pub fn load_notes() -> NoteBook {
    NoteBook::from_json(LocalStore.get(NOTES_KEY).as_deref())
}

pub fn save_notes(book: &NoteBook) -> Result<(), StorageError> {
    let raw = book
        .to_json()
        .map_err(|e| StorageError::Encode(e.to_string()))?;
    LocalStore.set(NOTES_KEY, &raw)
}

pub fn load_last_seen_tags(clan: Option<&str>) -> Option<BTreeSet<String>> {
    let raw = LocalStore.get(&last_seen_tags_key(clan))?;
    serde_json::from_str(&raw).ok()
}

pub fn save_last_seen_tags(
    clan: Option<&str>,
    tags: &BTreeSet<String>,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(tags).map_err(|e| StorageError::Encode(e.to_string()))?;
    LocalStore.set(&last_seen_tags_key(clan), &raw)
}
