use soulbrowser_core_types::Action;

/// Common UI-noun suffixes stripped during normalization (§4.4 "Fuzzy
/// matching"): a label like "Username Field" and "Username" should
/// normalize to the same target.
const NOUN_SUFFIXES: &[&str] = &[
    "button", "field", "input", "link", "icon", "menu", "dropdown", "checkbox", "tab", "box",
];

/// UI-chrome tokens explicitly rejected for `fill` actions (§4.4): a
/// fuzzy match against "Sort" or "Filter" should never resolve a fill
/// target even if the label text loosely matches.
const CHROME_TOKENS: &[&str] = &[
    "width", "height", "column", "resize", "sort", "filter", "toggle", "expand", "collapse",
];

/// Normalize a label for fuzzy comparison: lowercase, trim, `/` and `-`
/// become spaces, a trailing common UI-noun suffix is dropped, and
/// whitespace runs collapse to one space.
pub fn normalize_label(label: &str) -> String {
    let lowered = label.to_ascii_lowercase();
    let replaced = lowered.replace(['/', '-'], " ");
    let collapsed: Vec<&str> = replaced.split_whitespace().collect();
    let mut words: Vec<&str> = collapsed;

    if words.len() > 1 {
        if let Some(last) = words.last() {
            if NOUN_SUFFIXES.contains(last) {
                words.pop();
            }
        }
    }

    words.join(" ")
}

/// Whether `candidate_text` contains every normalized word of `target`,
/// in order, allowing intermediate words between them (§4.4: "optional
/// intermediate words between multi-word targets"). For `fill` actions,
/// a candidate containing any chrome token is rejected outright
/// regardless of textual similarity.
pub fn fuzzy_match(target: &str, candidate_text: &str, action: Action) -> bool {
    let normalized_candidate = normalize_label(candidate_text);

    if action.is_fill_like() {
        for token in CHROME_TOKENS {
            if normalized_candidate
                .split_whitespace()
                .any(|w| w == *token)
            {
                return false;
            }
        }
    }

    let target_words: Vec<&str> = target.split_whitespace().collect();
    if target_words.is_empty() {
        return false;
    }

    let candidate_words: Vec<&str> = normalized_candidate.split_whitespace().collect();
    let mut cursor = 0;
    for word in &target_words {
        match candidate_words[cursor..].iter().position(|w| w == word) {
            Some(offset) => cursor += offset + 1,
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_ui_noun_suffix() {
        assert_eq!(normalize_label("Username Field"), "username");
        assert_eq!(normalize_label("Log in Button"), "log in");
    }

    #[test]
    fn replaces_separators_and_collapses_whitespace() {
        assert_eq!(normalize_label("First/Last-Name"), "first last name");
    }

    #[test]
    fn matches_with_intermediate_words() {
        assert!(fuzzy_match("log in", "please log right in now", Action::Click));
    }

    #[test]
    fn rejects_chrome_tokens_for_fill_actions() {
        assert!(!fuzzy_match("name", "Sort by name", Action::Fill));
        assert!(fuzzy_match("name", "Sort by name", Action::Click));
    }
}
