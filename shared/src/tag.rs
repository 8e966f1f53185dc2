use crate::TagError;

/// Characters Supercell uses in player and clan tags.
pub const TAG_ALPHABET: &str = "0289PYLQGRJCUV";
const MIN_TAG_LEN: usize = 3;
const MAX_TAG_LEN: usize = 12;

/// Canonical form used as a join key: no `#`, uppercase, `O` read as zero.
pub fn normalize_tag(raw: &str) -> Result<String, TagError> {
    let trimmed = raw.trim();
    let body = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if body.is_empty() {
        return Err(TagError::Empty);
    }

    let mut out = String::with_capacity(body.len());
    for ch in body.chars() {
        let upper = match ch.to_ascii_uppercase() {
            'O' => '0',
            other => other,
        };
        if !TAG_ALPHABET.contains(upper) {
            return Err(TagError::InvalidCharacter(ch));
        }
        out.push(upper);
    }

    if out.len() < MIN_TAG_LEN {
        return Err(TagError::TooShort);
    }
    if out.len() > MAX_TAG_LEN {
        return Err(TagError::TooLong);
    }
    Ok(out)
}

/// Join key that never fails: invalid tags fall back to their uppercased text.
pub fn tag_key(raw: &str) -> String {
    normalize_tag(raw).unwrap_or_else(|_| {
        raw.trim()
            .trim_start_matches('#')
            .to_ascii_uppercase()
    })
}

pub fn display_tag(raw: &str) -> String {
    format!("#{}", tag_key(raw))
}
