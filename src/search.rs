//! Find/replace over note content.
//!
//! Counting and navigation run against the plain-text projection; replacement
//! rewrites the markup buffer directly. Case-insensitivity is ASCII: lowering
//! the haystack with `to_ascii_lowercase` keeps every byte offset valid in the
//! original, so match positions can be used to slice it.

use crate::text;

/// Characters that mean a query is really a markup fragment. A query
/// containing one is matched as a literal substring of the markup with no
/// boundary rule.
const MARKUP_DELIMITERS: [char; 3] = ['<', '>', '&'];

/// Non-overlapping, case-insensitive occurrence count. Empty query yields 0.
pub fn count_matches(text: &str, query: &str) -> usize {
    match_positions(text, query).len()
}

/// Offset of the first case-insensitive occurrence.
pub fn find_first(text: &str, query: &str) -> Option<usize> {
    if query.is_empty() {
        return None;
    }
    text.to_ascii_lowercase().find(&query.to_ascii_lowercase())
}

/// First occurrence at offset >= `from`, wrapping to the start of the buffer.
/// Returns `None` only when the query is absent entirely.
pub fn find_next(text: &str, query: &str, from: usize) -> Option<usize> {
    if query.is_empty() {
        return None;
    }
    let hay = text.to_ascii_lowercase();
    let needle = query.to_ascii_lowercase();
    let from = from.min(hay.len());
    match hay[from..].find(&needle) {
        Some(rel) => Some(from + rel),
        None => hay.find(&needle),
    }
}

/// Last occurrence starting before `before`, wrapping to the last occurrence
/// in the buffer.
pub fn find_previous(text: &str, query: &str, before: usize) -> Option<usize> {
    let positions = match_positions(text, query);
    positions
        .iter()
        .rev()
        .find(|&&p| p < before)
        .or_else(|| positions.last())
        .copied()
}

/// Replace the selected occurrence. `sel_start..sel_end` are offsets into the
/// plain-text projection of `markup`; the replacement only fires when that
/// slice equals `query` case-insensitively. Returns `None` when nothing was
/// replaced.
pub fn replace_one(
    markup: &str,
    query: &str,
    replacement: &str,
    sel_start: usize,
    sel_end: usize,
) -> Option<String> {
    if query.is_empty() {
        return None;
    }
    let plain = text::plain_text(markup);
    let selected = plain.get(sel_start..sel_end)?;
    if !selected.eq_ignore_ascii_case(query) {
        return None;
    }

    // Qualifying markup occurrences line up with projection occurrences in
    // order (the disqualified ones sit inside tag syntax, which the
    // projection drops), so the selected one is found by ordinal.
    let ordinal = match_positions(&plain[..sel_start], query).len();
    let position = *qualifying_positions(markup, query).get(ordinal)?;
    Some(splice(markup, position, query.len(), replacement))
}

/// Replace every qualifying occurrence in one pass.
pub fn replace_all(markup: &str, query: &str, replacement: &str) -> String {
    let positions = qualifying_positions(markup, query);
    if positions.is_empty() {
        return markup.to_string();
    }

    let mut out = String::with_capacity(markup.len());
    let mut cursor = 0;
    for start in positions {
        out.push_str(&markup[cursor..start]);
        out.push_str(replacement);
        cursor = start + query.len();
    }
    out.push_str(&markup[cursor..]);
    out
}

/// Cursor state for interactive find/replace. Recomputed against the buffer
/// after every replacement.
#[derive(Debug, Clone)]
pub struct FindSession {
    query: String,
    total: usize,
    current: Option<usize>,
}

impl FindSession {
    pub fn new(text: &str, query: &str) -> Self {
        Self {
            query: query.to_string(),
            total: count_matches(text, query),
            current: find_first(text, query),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Offset of the current match in the plain-text buffer.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// 1-based position of the current match, for "3/7" style display.
    pub fn current_ordinal(&self, text: &str) -> Option<usize> {
        let current = self.current?;
        Some(match_positions(&text[..current], &self.query).len() + 1)
    }

    pub fn next(&mut self, text: &str) -> Option<usize> {
        let from = match self.current {
            Some(at) => at + self.query.len(),
            None => 0,
        };
        self.current = find_next(text, &self.query, from);
        self.current
    }

    pub fn previous(&mut self, text: &str) -> Option<usize> {
        let before = self.current.unwrap_or(0);
        self.current = find_previous(text, &self.query, before);
        self.current
    }

    /// Re-derive match count and current selection after the buffer changed.
    pub fn rescan(&mut self, text: &str) {
        self.total = count_matches(text, &self.query);
        self.current = find_first(text, &self.query);
    }

    /// Forget all matches, as after a bulk replace.
    pub fn clear(&mut self) {
        self.total = 0;
        self.current = None;
    }
}

/// Non-overlapping case-insensitive match start offsets.
fn match_positions(text: &str, query: &str) -> Vec<usize> {
    if query.is_empty() {
        return Vec::new();
    }
    let hay = text.to_ascii_lowercase();
    let needle = query.to_ascii_lowercase();

    let mut positions = Vec::new();
    let mut at = 0;
    while let Some(rel) = hay[at..].find(&needle) {
        positions.push(at + rel);
        at += rel + needle.len();
    }
    positions
}

/// Match offsets in `markup` that are safe to rewrite. Occurrences inside tag
/// syntax, or glued to an entity introducer, are skipped unless the query
/// itself contains markup delimiters.
fn qualifying_positions(markup: &str, query: &str) -> Vec<usize> {
    let positions = match_positions(markup, query);
    if query.contains(MARKUP_DELIMITERS) {
        return positions;
    }

    let mask = tag_mask(markup);
    positions
        .into_iter()
        .filter(|&start| {
            let end = start + query.len();
            let in_tag = mask[start..end].iter().any(|&b| b);
            let after_entity = markup[..start].ends_with('&');
            !in_tag && !after_entity
        })
        .collect()
}

/// Byte-indexed mask: true for every byte between '<' and the matching '>'.
fn tag_mask(markup: &str) -> Vec<bool> {
    let mut mask = vec![false; markup.len()];
    let mut inside = false;
    for (i, b) in markup.bytes().enumerate() {
        match b {
            b'<' => {
                inside = true;
                mask[i] = true;
            }
            b'>' => {
                mask[i] = inside;
                inside = false;
            }
            _ => mask[i] = inside,
        }
    }
    mask
}

fn splice(markup: &str, at: usize, len: usize, replacement: &str) -> String {
    let mut out = String::with_capacity(markup.len() - len + replacement.len());
    out.push_str(&markup[..at]);
    out.push_str(replacement);
    out.push_str(&markup[at + len..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_matches_case_insensitive() {
        assert_eq!(count_matches("aAaA", "a"), 4);
        assert_eq!(count_matches("", "x"), 0);
        assert_eq!(count_matches("hello", ""), 0);
        assert_eq!(count_matches("Cat cAt CAT", "cat"), 3);
    }

    #[test]
    fn test_count_matches_non_overlapping() {
        assert_eq!(count_matches("aaaa", "aa"), 2);
    }

    #[test]
    fn test_find_first() {
        assert_eq!(find_first("dog CAT dog", "cat"), Some(4));
        assert_eq!(find_first("dog", "cat"), None);
        assert_eq!(find_first("dog", ""), None);
    }

    #[test]
    fn test_find_next_wraps() {
        let text = "cat dog cat";
        // past the second match, wraps to the first
        assert_eq!(find_next(text, "cat", 8 + 3), Some(0));
        assert_eq!(find_next(text, "cat", 1), Some(8));
        assert_eq!(find_next(text, "bird", 0), None);
    }

    #[test]
    fn test_find_previous_wraps() {
        let text = "cat dog cat";
        assert_eq!(find_previous(text, "cat", 8), Some(0));
        // nothing before the first match, wraps to the last
        assert_eq!(find_previous(text, "cat", 0), Some(8));
        assert_eq!(find_previous(text, "bird", 5), None);
    }

    #[test]
    fn test_replace_all_skips_tag_syntax() {
        assert_eq!(replace_all("<b>cat</b> cat", "cat", "dog"), "<b>dog</b> dog");
        // the tag name itself is untouchable
        assert_eq!(replace_all("<b>b</b>", "b", "x"), "<b>x</b>");
    }

    #[test]
    fn test_replace_all_skips_entities() {
        assert_eq!(replace_all("&amp; amp", "amp", "xyz"), "&amp; xyz");
    }

    #[test]
    fn test_replace_all_literal_markup_query() {
        assert_eq!(replace_all("<b>x</b> y", "<b>", "<i>"), "<i>x</b> y");
    }

    #[test]
    fn test_replace_all_without_match_is_identity() {
        assert_eq!(replace_all("plain", "zzz", "x"), "plain");
        assert_eq!(replace_all("plain", "", "x"), "plain");
    }

    #[test]
    fn test_replace_one_requires_matching_selection() {
        let markup = "<b>cat</b> cat";
        // plain projection is "cat cat"; second occurrence at 4..7
        let replaced = replace_one(markup, "cat", "dog", 4, 7);
        assert_eq!(replaced.as_deref(), Some("<b>cat</b> dog"));

        // selection that is not the query fires nothing
        assert_eq!(replace_one(markup, "cat", "dog", 0, 2), None);
    }

    #[test]
    fn test_replace_one_maps_first_occurrence() {
        let markup = "<b>cat</b> cat";
        let replaced = replace_one(markup, "CAT", "dog", 0, 3);
        assert_eq!(replaced.as_deref(), Some("<b>dog</b> cat"));
    }

    #[test]
    fn test_find_session_navigation_and_rescan() {
        let buffer = "cat dog cat";
        let mut session = FindSession::new(buffer, "cat");
        assert_eq!(session.total(), 2);
        assert_eq!(session.current(), Some(0));
        assert_eq!(session.current_ordinal(buffer), Some(1));

        assert_eq!(session.next(buffer), Some(8));
        assert_eq!(session.current_ordinal(buffer), Some(2));
        // wraps
        assert_eq!(session.next(buffer), Some(0));
        assert_eq!(session.previous(buffer), Some(8));

        let replaced = replace_all(buffer, "cat", "x");
        session.rescan(&replaced);
        assert_eq!(session.total(), 0);
        assert_eq!(session.current(), None);
    }
}
