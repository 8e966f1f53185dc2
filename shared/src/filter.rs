use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::resolver::ResolvedMember;

/// Members at or under this tenure count as new joiners.
pub const NEW_JOINER_MAX_TENURE_DAYS: u32 = 7;

/// Case- and diacritic-insensitive form used for search comparisons.
pub fn normalize_search_text(raw: &str) -> String {
    raw.trim()
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn matches_query(row: &ResolvedMember, normalized_query: &str) -> bool {
    if normalized_query.is_empty() {
        return true;
    }
    normalize_search_text(&row.member.name).contains(normalized_query)
        || normalize_search_text(&row.member.tag).contains(normalized_query)
}

/// Keep members whose name or tag contains the query. An empty query is the
/// identity: same rows, same order.
pub fn filter_members(rows: Vec<ResolvedMember>, query: &str) -> Vec<ResolvedMember> {
    let normalized = normalize_search_text(query);
    if normalized.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| matches_query(row, &normalized))
        .collect()
}

pub fn is_new_joiner(row: &ResolvedMember) -> bool {
    row.tenure_days()
        .is_some_and(|days| days <= NEW_JOINER_MAX_TENURE_DAYS)
}

pub fn new_joiners(rows: Vec<ResolvedMember>) -> Vec<ResolvedMember> {
    rows.into_iter().filter(is_new_joiner).collect()
}
