//! Call outcome with write-once finalization
//!
//! A session carries exactly one outcome. It starts `InProgress` and moves
//! to a terminal state at most once: the first finalize wins and every later
//! finalize is a no-op. This is what keeps a mid-prompt hangup from being
//! overwritten by the operator-transfer path that unwinds behind it.

use serde::{Deserialize, Serialize};

/// Terminal disposition of a call session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    #[default]
    InProgress,
    /// Booking registered, channel released cleanly
    Success,
    /// Caller disconnect detected by the transport
    Hangup,
    /// Routed to the human operator line
    OperatorTransfer,
    /// Unexpected internal failure (still routed to an operator)
    Error,
    /// Withheld/anonymous caller id rejected at init
    AnonymousBlocked,
    /// Dispatch backend flagged the caller as do-not-serve
    UserBlocked,
}

impl CallOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CallOutcome::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::InProgress => "in_progress",
            CallOutcome::Success => "success",
            CallOutcome::Hangup => "hangup",
            CallOutcome::OperatorTransfer => "operator_transfer",
            CallOutcome::Error => "error",
            CallOutcome::AnonymousBlocked => "anonymous_blocked",
            CallOutcome::UserBlocked => "user_blocked",
        }
    }
}

impl std::fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Write-once outcome holder with a diagnostic reason
#[derive(Debug, Default)]
pub struct OutcomeCell {
    outcome: CallOutcome,
    reason: Option<String>,
}

impl OutcomeCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a terminal outcome. Returns `true` if this call performed the
    /// transition, `false` if the cell was already finalized (no-op).
    pub fn finalize(&mut self, outcome: CallOutcome, reason: impl Into<String>) -> bool {
        if self.outcome.is_terminal() || !outcome.is_terminal() {
            return false;
        }
        self.outcome = outcome;
        self.reason = Some(reason.into());
        true
    }

    pub fn get(&self) -> CallOutcome {
        self.outcome
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn is_finalized(&self) -> bool {
        self.outcome.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_finalize_wins() {
        let mut cell = OutcomeCell::new();
        assert!(cell.finalize(CallOutcome::Hangup, "channel down"));
        assert!(!cell.finalize(CallOutcome::OperatorTransfer, "late transfer"));
        assert!(!cell.finalize(CallOutcome::Success, "even later"));
        assert_eq!(cell.get(), CallOutcome::Hangup);
        assert_eq!(cell.reason(), Some("channel down"));
    }

    #[test]
    fn in_progress_is_not_a_valid_finalize_target() {
        let mut cell = OutcomeCell::new();
        assert!(!cell.finalize(CallOutcome::InProgress, "nope"));
        assert!(!cell.is_finalized());
    }

    #[test]
    fn n_finalizes_yield_the_first_outcome() {
        let outcomes = [
            CallOutcome::OperatorTransfer,
            CallOutcome::Success,
            CallOutcome::Error,
            CallOutcome::Hangup,
        ];
        let mut cell = OutcomeCell::new();
        for (i, o) in outcomes.iter().enumerate() {
            cell.finalize(*o, format!("attempt {i}"));
        }
        assert_eq!(cell.get(), outcomes[0]);
        assert_eq!(cell.reason(), Some("attempt 0"));
    }
}
