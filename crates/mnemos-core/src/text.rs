// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text matching shared by the in-memory stores and the storage backend.
//!
//! Archival and recall search both go through [`matches_query`], so swapping
//! the matching algorithm changes both tiers together. Callers own ordering
//! and limits; this module only answers "does this item match".

/// Case-insensitive substring containment.
///
/// An empty query matches every item.
pub fn matches_query(content: &str, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    content.to_lowercase().contains(&query.to_lowercase())
}

/// Number of characters (not bytes) in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Returns `text` cut to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn matching_ignores_case() {
        assert!(matches_query("Cats are GREAT", "cats"));
        assert!(matches_query("cats are great", "GREAT"));
        assert!(!matches_query("dogs", "cats"));
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(matches_query("anything", ""));
        assert!(matches_query("", ""));
    }

    #[test]
    fn truncate_respects_multibyte_characters() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    proptest! {
        #[test]
        fn truncate_yields_prefix_of_bounded_length(s in ".{0,200}", max in 0usize..100) {
            let cut = truncate_chars(&s, max);
            prop_assert!(char_len(&cut) <= max);
            prop_assert!(s.starts_with(&cut));
            if char_len(&s) <= max {
                prop_assert_eq!(cut, s);
            }
        }
    }
}
