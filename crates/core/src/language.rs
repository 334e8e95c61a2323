//! Caller-facing languages
//!
//! The agent serves Greek by default; a dedicated DTMF digit at the welcome
//! menu toggles to English and re-prompts. Every provider call and every
//! prompt lookup is parameterized by the session language.

use serde::{Deserialize, Serialize};

/// Supported prompt/recognition languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Greek,
    English,
}

impl Language {
    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Greek => "el",
            Self::English => "en",
        }
    }

    /// BCP-47 tag used by the speech and geocoding APIs
    pub fn bcp47(&self) -> &'static str {
        match self {
            Self::Greek => "el-GR",
            Self::English => "en-US",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Greek => "Greek",
            Self::English => "English",
        }
    }

    /// Subdirectory under the exchange sound root holding this language's
    /// pre-recorded prompts
    pub fn sound_dir(&self) -> &'static str {
        self.code()
    }

    /// The language the toggle digit switches to
    pub fn toggled(&self) -> Language {
        match self {
            Self::Greek => Self::English,
            Self::English => Self::Greek,
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "el" | "ell" | "gr" | "greek" => Some(Self::Greek),
            "en" | "eng" | "english" => Some(Self::English),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_is_an_involution() {
        assert_eq!(Language::Greek.toggled(), Language::English);
        assert_eq!(Language::Greek.toggled().toggled(), Language::Greek);
    }

    #[test]
    fn parses_loose_codes() {
        assert_eq!(Language::from_str_loose(" EL "), Some(Language::Greek));
        assert_eq!(Language::from_str_loose("english"), Some(Language::English));
        assert_eq!(Language::from_str_loose("fr"), None);
    }

    #[test]
    fn default_is_greek() {
        assert_eq!(Language::default(), Language::Greek);
        assert_eq!(Language::default().bcp47(), "el-GR");
    }
}
