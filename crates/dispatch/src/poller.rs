//! Callback-mode wait loop, as a pure state machine
//!
//! The flow layer owns the sleeps, hold music and synthesis; this type only
//! decides what each observed artifact means. Keeping it free of IO makes
//! the transition table testable without a clock.

use crate::status::{DriverStatus, StatusArtifact};

/// What the flow should do after one poll
#[derive(Debug, Clone, PartialEq)]
pub enum PollStep {
    /// Nothing new; sleep and poll again
    Wait,
    /// Status changed; announce it to the caller
    Announce(StatusArtifact),
    /// Same assignment as last time; repeat the announcement
    Replay(StatusArtifact),
    /// Dispatch could not serve the booking; apologize and transfer
    Abort,
    /// Trip reached a terminal state; wrap the call up
    Done(DriverStatus),
    /// Poll budget spent without resolution
    Exhausted,
}

pub struct CallbackPoller {
    attempts_left: u32,
    last_seen: Option<DriverStatus>,
}

impl CallbackPoller {
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts_left: attempts,
            last_seen: None,
        }
    }

    /// Feed one observation of the status artifact
    pub fn observe(&mut self, artifact: Option<StatusArtifact>) -> PollStep {
        if self.attempts_left == 0 {
            return PollStep::Exhausted;
        }
        self.attempts_left -= 1;

        let Some(artifact) = artifact else {
            return PollStep::Wait;
        };
        let status = artifact.driver_status();

        if status == DriverStatus::Failed {
            return PollStep::Abort;
        }
        if status.is_terminal() {
            return PollStep::Done(status);
        }

        let changed = self.last_seen != Some(status);
        self.last_seen = Some(status);
        match (changed, status) {
            // Still looking for a driver: silence, keep the hold music on.
            (_, DriverStatus::Searching) => PollStep::Wait,
            (true, _) => PollStep::Announce(artifact),
            (false, _) => PollStep::Replay(artifact),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(status: i32, car: Option<&str>) -> StatusArtifact {
        StatusArtifact {
            status,
            car_no: car.map(String::from),
            eta: None,
            trip_id: None,
        }
    }

    #[test]
    fn waits_through_searching_then_announces_assignment() {
        let mut poller = CallbackPoller::new(10);
        assert_eq!(poller.observe(None), PollStep::Wait);
        assert_eq!(poller.observe(Some(artifact(-1, None))), PollStep::Wait);
        assert_eq!(
            poller.observe(Some(artifact(10, Some("TAXI-42")))),
            PollStep::Announce(artifact(10, Some("TAXI-42")))
        );
        // Unchanged assignment repeats instead of going quiet.
        assert_eq!(
            poller.observe(Some(artifact(10, Some("TAXI-42")))),
            PollStep::Replay(artifact(10, Some("TAXI-42")))
        );
    }

    #[test]
    fn failed_booking_aborts_immediately() {
        let mut poller = CallbackPoller::new(10);
        assert_eq!(poller.observe(Some(artifact(20, None))), PollStep::Abort);
    }

    #[test]
    fn cancellation_ends_the_wait() {
        let mut poller = CallbackPoller::new(10);
        assert_eq!(
            poller.observe(Some(artifact(31, None))),
            PollStep::Done(DriverStatus::DriverCanceled)
        );
    }

    #[test]
    fn budget_exhausts_after_configured_attempts() {
        let mut poller = CallbackPoller::new(2);
        assert_eq!(poller.observe(None), PollStep::Wait);
        assert_eq!(poller.observe(None), PollStep::Wait);
        assert_eq!(poller.observe(None), PollStep::Exhausted);
        // Exhaustion is sticky.
        assert_eq!(poller.observe(Some(artifact(10, None))), PollStep::Exhausted);
    }

    #[test]
    fn status_progression_announces_each_change() {
        let mut poller = CallbackPoller::new(10);
        poller.observe(Some(artifact(10, Some("TAXI-42"))));
        assert_eq!(
            poller.observe(Some(artifact(1, Some("TAXI-42")))),
            PollStep::Announce(artifact(1, Some("TAXI-42")))
        );
        assert_eq!(
            poller.observe(Some(artifact(2, Some("TAXI-42")))),
            PollStep::Announce(artifact(2, Some("TAXI-42")))
        );
    }
}
