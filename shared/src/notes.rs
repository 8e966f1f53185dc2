use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TagError;
use crate::permissions::{AccessLevel, GuardedAction, PermissionDenied};
use crate::tag::normalize_tag;

/// Local storage key holding every note as `tag -> [note]`.
pub const NOTES_KEY: &str = "roster.notes";

pub const MAX_NOTE_LEN: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerNote {
    pub id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteError {
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),
    #[error(transparent)]
    InvalidTag(#[from] TagError),
    #[error("note is empty")]
    Empty,
    #[error("note is longer than {MAX_NOTE_LEN} characters")]
    TooLong,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteBook(BTreeMap<String, Vec<PlayerNote>>);

impl NoteBook {
    /// Parse the stored blob; anything unreadable starts an empty book.
    pub fn from_json(raw: Option<&str>) -> Self {
        raw.and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Notes for one player, newest first.
    pub fn notes_for(&self, tag: &str) -> Vec<&PlayerNote> {
        let Ok(key) = normalize_tag(tag) else {
            return Vec::new();
        };
        let mut notes: Vec<&PlayerNote> = self.0.get(&key).into_iter().flatten().collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes
    }

    pub fn count_for(&self, tag: &str) -> usize {
        normalize_tag(tag)
            .ok()
            .and_then(|key| self.0.get(&key))
            .map_or(0, Vec::len)
    }

    pub fn add(
        &mut self,
        access: AccessLevel,
        tag: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<PlayerNote, NoteError> {
        access.check(GuardedAction::EditNotes)?;
        let key = normalize_tag(tag)?;
        let body = body.trim();
        if body.is_empty() {
            return Err(NoteError::Empty);
        }
        if body.chars().count() > MAX_NOTE_LEN {
            return Err(NoteError::TooLong);
        }

        let notes = self.0.entry(key).or_default();
        let note = PlayerNote {
            id: format!("{}-{}", now.timestamp_millis(), notes.len()),
            body: body.to_string(),
            created_at: now,
        };
        notes.push(note.clone());
        Ok(note)
    }

    /// Returns whether a note was removed.
    pub fn delete(&mut self, access: AccessLevel, tag: &str, id: &str) -> Result<bool, NoteError> {
        access.check(GuardedAction::EditNotes)?;
        let key = normalize_tag(tag)?;
        let Some(notes) = self.0.get_mut(&key) else {
            return Ok(false);
        };
        let before = notes.len();
        notes.retain(|note| note.id != id);
        let removed = notes.len() != before;
        if notes.is_empty() {
            self.0.remove(&key);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{NoteBook, NoteError};
    use crate::permissions::AccessLevel;

    #[test]
    fn notes_are_listed_newest_first() {
        let mut book = NoteBook::default();
        let early = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        book.add(AccessLevel::Elder, "#Q0LY", "first", early).unwrap();
        book.add(AccessLevel::Elder, "q0ly", "second", late).unwrap();
        let bodies: Vec<&str> = book.notes_for("#Q0LY").iter().map(|n| n.body.as_str()).collect();
        assert_eq!(bodies, vec!["second", "first"]);
    }

    #[test]
    fn members_cannot_write_notes() {
        let mut book = NoteBook::default();
        let err = book
            .add(AccessLevel::Member, "#Q0LY", "hi", Utc::now())
            .unwrap_err();
        assert!(matches!(err, NoteError::PermissionDenied(_)));
        assert_eq!(book.count_for("#Q0LY"), 0);
    }

    #[test]
    fn blank_notes_and_bad_tags_are_rejected() {
        let mut book = NoteBook::default();
        assert_eq!(
            book.add(AccessLevel::Leadership, "#Q0LY", "   ", Utc::now()),
            Err(NoteError::Empty)
        );
        assert!(matches!(
            book.add(AccessLevel::Leadership, "#??", "hi", Utc::now()),
            Err(NoteError::InvalidTag(_))
        ));
    }

    #[test]
    fn delete_and_storage_round_trip() {
        let mut book = NoteBook::default();
        let note = book
            .add(AccessLevel::Elder, "#Q0LY", "watch war hits", Utc::now())
            .unwrap();
        let restored = NoteBook::from_json(Some(&book.to_json().unwrap()));
        assert_eq!(restored, book);

        assert_eq!(book.delete(AccessLevel::Elder, "#Q0LY", &note.id), Ok(true));
        assert_eq!(book.delete(AccessLevel::Elder, "#Q0LY", &note.id), Ok(false));
        assert_eq!(book.count_for("#Q0LY"), 0);
        assert_eq!(NoteBook::from_json(Some("not json")), NoteBook::default());
    }
}
