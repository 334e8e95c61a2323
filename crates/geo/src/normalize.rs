//! Query normalization for spoken addresses
//!
//! Greek transcripts arrive with uneven accenting, so every comparison
//! against override phrases happens on a folded form: diacritics stripped,
//! lowercased, trimmed. Known chronic mis-hearings are rewritten before the
//! query ever reaches a backend.

use once_cell::sync::Lazy;
use regex::Regex;

/// Chronic recognizer substitutions, applied on whole words
const REPLACEMENTS: &[(&str, &str)] = &[("Μπουρνάζι", "Χαλάνδρι")];

static REPLACEMENT_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    REPLACEMENTS
        .iter()
        .filter_map(|(from, to)| {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(from)))
                .ok()
                .map(|re| (re, *to))
        })
        .collect()
});

/// Strip combining marks (NFD, drop Mn)
pub fn fold_diacritics(text: &str) -> String {
    use unicode_normalization::char::is_combining_mark;
    use unicode_normalization::UnicodeNormalization;
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Folded, lowercased, trimmed form used for phrase comparison
pub fn comparison_key(text: &str) -> String {
    fold_diacritics(text.trim()).to_lowercase()
}

/// Rewrite known mis-heard place names, whole words only
pub fn apply_replacements(query: &str) -> String {
    let mut out = query.to_string();
    for (re, to) in REPLACEMENT_RULES.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *to).into_owned();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_greek_accents() {
        assert_eq!(comparison_key("  Αεροδρόμιο "), "αεροδρομιο");
        assert_eq!(comparison_key("Κέντρο Αθήνα"), "κεντρο αθηνα");
    }

    #[test]
    fn replaces_whole_words_case_insensitively() {
        assert_eq!(apply_replacements("ΜΠΟΥΡΝΑΖΙ 15"), "Χαλάνδρι 15");
        assert_eq!(apply_replacements("Μπουρνάζι"), "Χαλάνδρι");
    }

    #[test]
    fn leaves_partial_matches_alone() {
        let q = "Μπουρναζιώτικα";
        assert_eq!(apply_replacements(q), q);
    }
}
