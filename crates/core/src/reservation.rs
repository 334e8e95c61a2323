//! Reservation time candidates and disambiguation
//!
//! The date recognizer returns a best-match plus alternate interpretations,
//! each with a unix timestamp and a formatted spoken text. The alternates
//! list holds only interpretations that carry a time-of-day, so a populated
//! best-match with no alternates is a date-only utterance and is rejected
//! rather than silently given a default time.

use serde::{Deserialize, Serialize};

/// One recognized point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeMatch {
    /// Unix timestamp, seconds
    pub timestamp: i64,
    /// Formatted text for spoken confirmation
    pub text: String,
}

impl TimeMatch {
    pub fn new(timestamp: i64, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            text: text.into(),
        }
    }
}

/// Recognizer output for one utterance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReservationCandidate {
    pub best_match: Option<TimeMatch>,
    #[serde(default)]
    pub alternates: Vec<TimeMatch>,
}

/// What the collection loop should do with a candidate
#[derive(Debug, Clone, PartialEq)]
pub enum ReservationDecision {
    /// Speak the match back; an accept digit takes it, anything else re-loops
    Confirm(TimeMatch),
    /// Two plausible readings; caller picks with digit 1 or 2
    Choose(TimeMatch, TimeMatch),
    /// Unusable (empty, or date-only without a time component); re-prompt
    Reject,
}

impl ReservationCandidate {
    pub fn new(best_match: Option<TimeMatch>, alternates: Vec<TimeMatch>) -> Self {
        Self {
            best_match,
            alternates,
        }
    }

    /// Apply the disambiguation rules
    ///
    /// - best-match with populated alternates: confirm the best-match
    /// - no best-match, exactly one alternate: promote it and confirm
    /// - no best-match, two or more alternates: explicit two-way choice
    /// - best-match with empty alternates (date-only) or nothing at all:
    ///   reject — a time-of-day is never defaulted
    pub fn decide(&self) -> ReservationDecision {
        match (&self.best_match, self.alternates.as_slice()) {
            (Some(best), alts) if !alts.is_empty() => {
                ReservationDecision::Confirm(best.clone())
            }
            (None, [only]) => ReservationDecision::Confirm(only.clone()),
            (None, [first, second, ..]) => {
                ReservationDecision::Choose(first.clone(), second.clone())
            }
            _ => ReservationDecision::Reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_match_with_alternates_confirms() {
        let cand = ReservationCandidate::new(
            Some(TimeMatch::new(1_700_000_000, "tomorrow at 17:00")),
            vec![TimeMatch::new(1_700_000_100, "tomorrow at 05:00")],
        );
        assert_eq!(
            cand.decide(),
            ReservationDecision::Confirm(TimeMatch::new(1_700_000_000, "tomorrow at 17:00"))
        );
    }

    #[test]
    fn single_alternate_is_promoted() {
        let cand = ReservationCandidate::new(
            None,
            vec![TimeMatch::new(1_700_000_000, "Friday at 09:30")],
        );
        assert_eq!(
            cand.decide(),
            ReservationDecision::Confirm(TimeMatch::new(1_700_000_000, "Friday at 09:30"))
        );
    }

    #[test]
    fn two_alternates_require_a_choice() {
        let five_pm = TimeMatch::new(1_700_060_400, "tomorrow 5pm");
        let five_am = TimeMatch::new(1_700_017_200, "tomorrow 5am");
        let cand = ReservationCandidate::new(None, vec![five_pm.clone(), five_am.clone()]);
        assert_eq!(cand.decide(), ReservationDecision::Choose(five_pm, five_am));
    }

    #[test]
    fn date_only_best_match_is_rejected() {
        // A populated best-match string with an empty alternates list means
        // the utterance had no time-of-day component.
        let cand =
            ReservationCandidate::new(Some(TimeMatch::new(1_700_000_000, "next Tuesday")), vec![]);
        assert_eq!(cand.decide(), ReservationDecision::Reject);
    }

    #[test]
    fn empty_result_is_rejected() {
        assert_eq!(
            ReservationCandidate::default().decide(),
            ReservationDecision::Reject
        );
    }
}
