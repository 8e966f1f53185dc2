use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::RosterMember;
use crate::tag::{normalize_tag, tag_key};

/// Local storage key prefix for the tags seen in the last snapshot.
pub const LAST_SEEN_TAGS_KEY: &str = "roster.lastSeenTags";

/// Per-clan storage key, so switching clans never diffs one roster against another.
pub fn last_seen_tags_key(clan: Option<&str>) -> String {
    match clan.and_then(|tag| normalize_tag(tag).ok()) {
        Some(tag) => format!("{LAST_SEEN_TAGS_KEY}.{tag}"),
        None => LAST_SEEN_TAGS_KEY.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RosterDiff {
    pub joined: Vec<String>,
    pub departed: Vec<String>,
}

impl RosterDiff {
    pub fn is_empty(&self) -> bool {
        self.joined.is_empty() && self.departed.is_empty()
    }

    /// One-line toast text, `None` when nothing changed.
    pub fn summary(&self) -> Option<String> {
        let part = |count: usize, verb: &str| match count {
            0 => None,
            1 => Some(format!("1 member {verb}")),
            n => Some(format!("{n} members {verb}")),
        };
        let parts: Vec<String> = [
            part(self.joined.len(), "joined"),
            part(self.departed.len(), "left"),
        ]
        .into_iter()
        .flatten()
        .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

pub fn snapshot_tags(members: &[RosterMember]) -> BTreeSet<String> {
    members.iter().map(|m| tag_key(&m.tag)).collect()
}

/// Compare the previous tag set with a fresh snapshot. Without a previous set
/// there is nothing to compare against, so the diff is empty.
pub fn diff_roster(previous: Option<&BTreeSet<String>>, current: &[RosterMember]) -> RosterDiff {
    let Some(previous) = previous else {
        return RosterDiff::default();
    };
    let current = snapshot_tags(current);
    RosterDiff {
        joined: current.difference(previous).cloned().collect(),
        departed: previous.difference(&current).cloned().collect(),
    }
}
