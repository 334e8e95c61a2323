//! Trip status artifacts written by the callback receiver
//!
//! In callback mode the dispatch backend POSTs trip updates to a webhook
//! that drops each one into `register_info.json` inside the call's
//! directory. The poller re-reads that file between hold-music sleeps.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Trip progress codes the dispatch backend emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverStatus {
    Searching,
    EnRoute,
    Arrived,
    Pickup,
    DropOff,
    Accepted,
    Failed,
    PassengerCanceled,
    DriverCanceled,
    AdminCanceled,
    Completed,
    OnLocation,
    Other(i32),
}

impl DriverStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            -1 => Self::Searching,
            1 => Self::EnRoute,
            2 => Self::Arrived,
            3 => Self::Pickup,
            8 => Self::DropOff,
            10 => Self::Accepted,
            20 => Self::Failed,
            30 => Self::PassengerCanceled,
            31 => Self::DriverCanceled,
            32 => Self::AdminCanceled,
            100 => Self::Completed,
            255 => Self::OnLocation,
            other => Self::Other(other),
        }
    }

    /// No further updates will follow this state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::PassengerCanceled
                | Self::DriverCanceled
                | Self::AdminCanceled
                | Self::Completed
                | Self::OnLocation
        )
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            Self::PassengerCanceled | Self::DriverCanceled | Self::AdminCanceled
        )
    }
}

/// One snapshot of `register_info.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusArtifact {
    pub status: i32,
    #[serde(rename = "carNo", default)]
    pub car_no: Option<String>,
    /// Minutes until arrival, when the backend supplies one
    #[serde(default)]
    pub eta: Option<u32>,
    #[serde(rename = "tripID", default)]
    pub trip_id: Option<i64>,
}

impl StatusArtifact {
    pub fn driver_status(&self) -> DriverStatus {
        DriverStatus::from_code(self.status)
    }

    /// Read the artifact if the webhook has written one. A missing or
    /// half-written file means no update yet.
    pub async fn read(call_dir: &Path) -> Option<Self> {
        let path = call_dir.join("register_info.json");
        let raw = tokio::fs::read(&path).await.ok()?;
        match serde_json::from_slice(&raw) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "status artifact unreadable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        assert_eq!(DriverStatus::from_code(-1), DriverStatus::Searching);
        assert_eq!(DriverStatus::from_code(10), DriverStatus::Accepted);
        assert_eq!(DriverStatus::from_code(20), DriverStatus::Failed);
        assert_eq!(DriverStatus::from_code(100), DriverStatus::Completed);
        assert_eq!(DriverStatus::from_code(42), DriverStatus::Other(42));
    }

    #[test]
    fn cancellations_are_terminal_but_not_failures() {
        for code in [30, 31, 32] {
            let status = DriverStatus::from_code(code);
            assert!(status.is_terminal());
            assert!(status.is_cancellation());
        }
        assert!(!DriverStatus::Failed.is_terminal());
        assert!(!DriverStatus::Accepted.is_terminal());
    }

    #[tokio::test]
    async fn reads_artifact_from_call_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("register_info.json"),
            r#"{"status": 10, "carNo": "TAXI-42", "tripID": 991}"#,
        )
        .unwrap();

        let artifact = StatusArtifact::read(dir.path()).await.unwrap();
        assert_eq!(artifact.driver_status(), DriverStatus::Accepted);
        assert_eq!(artifact.car_no.as_deref(), Some("TAXI-42"));
        assert_eq!(artifact.trip_id, Some(991));
    }

    #[tokio::test]
    async fn missing_or_garbled_artifact_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StatusArtifact::read(dir.path()).await.is_none());

        std::fs::write(dir.path().join("register_info.json"), "{truncated").unwrap();
        assert!(StatusArtifact::read(dir.path()).await.is_none());
    }
}
