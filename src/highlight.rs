use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

/// Case-insensitive alternation over `terms`, longest first so overlapping
/// terms highlight the widest match.
pub fn build_highlight_regex<S: AsRef<str>>(terms: &[S]) -> Option<Regex> {
    let mut unique: Vec<&str> = Vec::new();
    let mut seen = HashSet::new();
    for term in terms {
        let term = term.as_ref().trim();
        if term.is_empty() {
            continue;
        }
        if seen.insert(term.to_lowercase()) {
            unique.push(term);
        }
    }
    if unique.is_empty() {
        return None;
    }
    unique.sort_by(|a, b| b.len().cmp(&a.len()));
    let pattern = unique
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()
}

/// Split `text` into `(segment, is_match)` pieces.
pub fn split_matches<'t>(text: &'t str, regex: Option<&Regex>) -> Vec<(&'t str, bool)> {
    let Some(regex) = regex else {
        return vec![(text, false)];
    };
    let mut pieces = Vec::new();
    let mut last = 0;
    for found in regex.find_iter(text) {
        if found.start() > last {
            pieces.push((&text[last..found.start()], false));
        }
        pieces.push((found.as_str(), true));
        last = found.end();
    }
    if last < text.len() || pieces.is_empty() {
        pieces.push((&text[last..], false));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_longer_terms_first() {
        let regex = build_highlight_regex(&["lat", "lateral"]).expect("regex");
        let matches: Vec<_> = regex.find_iter("Lateral Movement").map(|m| m.as_str()).collect();
        assert_eq!(matches, vec!["Lateral"]);
    }

    #[test]
    fn skips_blank_and_duplicate_terms() {
        assert!(build_highlight_regex(&["  ", ""]).is_none());
        let regex = build_highlight_regex(&["C2", "c2", "c2 "]).expect("regex");
        assert_eq!(regex.as_str(), "C2");
    }

    #[test]
    fn escapes_regex_syntax() {
        let regex = build_highlight_regex(&["a.b(c)"]).expect("regex");
        assert!(regex.is_match("x a.b(c) y"));
        assert!(!regex.is_match("axb(c)"));
    }

    #[test]
    fn splits_text_around_matches() {
        let regex = build_highlight_regex(&["beacon"]);
        assert_eq!(
            split_matches("Beacon cadence beacon", regex.as_ref()),
            vec![("Beacon", true), (" cadence ", false), ("beacon", true)]
        );
        assert_eq!(split_matches("", regex.as_ref()), vec![("", false)]);
        assert_eq!(split_matches("plain", None), vec![("plain", false)]);
    }
}
