//! Transcript profanity masking
//!
//! Masking applies to stored/displayed transcripts only. Geocoding and date
//! parsing always receive the raw transcript; a masked address would never
//! resolve.

use once_cell::sync::Lazy;
use regex::Regex;

/// Words masked before a transcript is persisted or shown
const BLOCKLIST: &[&str] = &[
    // Greek
    "μαλακας",
    "μαλάκας",
    "γαμω",
    "γαμώ",
    "σκατα",
    "σκατά",
    "πουτανα",
    "πουτάνα",
    // English
    "fuck",
    "shit",
    "asshole",
    "bitch",
];

static BLOCKLIST_RE: Lazy<Regex> = Lazy::new(|| {
    let alternation = BLOCKLIST
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b({alternation})\b")).expect("static blocklist pattern")
});

/// Replace each blocked word with asterisks of the same character length
pub fn mask_profanity(text: &str) -> String {
    BLOCKLIST_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            "*".repeat(caps[0].chars().count())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_with_exact_length() {
        assert_eq!(mask_profanity("oh shit ok"), "oh **** ok");
        assert_eq!(mask_profanity("ρε μαλάκα εσύ"), "ρε μαλάκα εσύ"); // not in list as-is
        assert_eq!(mask_profanity("ρε μαλάκας"), "ρε *******");
    }

    #[test]
    fn clean_text_is_untouched() {
        let s = "Λεωφόρος Συγγρού 150";
        assert_eq!(mask_profanity(s), s);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(mask_profanity("SHIT"), "****");
    }
}
