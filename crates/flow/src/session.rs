//! Per-call session context
//!
//! Everything mutable about one call lives here: collected fields, attempt
//! counters, provider stats, the write-once outcome, and the per-call
//! directory holding recordings, synthesized prompts and the progress
//! snapshot. Sessions are strictly per-instance; concurrent calls never
//! share one.

use std::path::{Path, PathBuf};

use taxi_agent_core::{
    mask_profanity, CallOutcome, CallRecord, CallType, Language, OutcomeCell, ProviderStats,
    ResolvedAddress, TimeMatch,
};

pub struct CallSession {
    pub call_id: String,
    pub exchange: String,
    pub caller_phone: String,
    pub language: Language,
    pub call_type: CallType,
    pub name: Option<String>,
    pub pickup: Option<ResolvedAddress>,
    pub destination: Option<ResolvedAddress>,
    pub reservation: Option<TimeMatch>,
    pub name_attempts: u32,
    pub pickup_attempts: u32,
    pub destination_attempts: u32,
    pub reservation_attempts: u32,
    pub stats: ProviderStats,
    outcome: OutcomeCell,
    started_at: chrono::DateTime<chrono::Utc>,
    call_dir: PathBuf,
    prompt_seq: u32,
}

impl CallSession {
    /// Directory layout: `<root>/<exchange>/<caller>/<call_id>/` with a
    /// `recordings/` subdirectory for caller audio.
    pub fn new(
        data_root: &Path,
        exchange: impl Into<String>,
        caller_phone: impl Into<String>,
        call_id: impl Into<String>,
        language: Language,
    ) -> Self {
        let exchange = exchange.into();
        let caller_phone = caller_phone.into();
        let call_id = call_id.into();
        let call_dir = data_root.join(&exchange).join(&caller_phone).join(&call_id);
        Self {
            call_id,
            exchange,
            caller_phone,
            language,
            call_type: CallType::Unknown,
            name: None,
            pickup: None,
            destination: None,
            reservation: None,
            name_attempts: 0,
            pickup_attempts: 0,
            destination_attempts: 0,
            reservation_attempts: 0,
            stats: ProviderStats::default(),
            outcome: OutcomeCell::new(),
            started_at: chrono::Utc::now(),
            call_dir,
            prompt_seq: 0,
        }
    }

    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.recordings_dir()).await
    }

    pub fn call_dir(&self) -> &Path {
        &self.call_dir
    }

    pub fn recordings_dir(&self) -> PathBuf {
        self.call_dir.join("recordings")
    }

    /// Extensionless base path for one recording take; the channel appends
    /// the wav extension when it writes.
    pub fn recording_path(&self, field: &str, attempt: u32) -> PathBuf {
        self.recordings_dir().join(format!("{field}_{attempt}"))
    }

    /// Extensionless base path for the next synthesized prompt
    pub fn next_prompt_path(&mut self) -> PathBuf {
        self.prompt_seq += 1;
        self.call_dir.join(format!("prompt_{}", self.prompt_seq))
    }

    /// Record a terminal outcome; first write wins
    pub fn finalize(&mut self, outcome: CallOutcome, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        let transitioned = self.outcome.finalize(outcome, reason.clone());
        if transitioned {
            tracing::info!(call_id = %self.call_id, %outcome, %reason, "call finalized");
        }
        transitioned
    }

    pub fn outcome(&self) -> CallOutcome {
        self.outcome.get()
    }

    pub fn outcome_reason(&self) -> Option<&str> {
        self.outcome.reason()
    }

    pub fn is_finalized(&self) -> bool {
        self.outcome.is_finalized()
    }

    /// Snapshot for telemetry and the progress file. Free-text fields are
    /// masked here, at the storage/display boundary; the live session keeps
    /// raw text so geocoding and dispatch see what the caller said.
    pub fn snapshot(&self) -> CallRecord {
        let mut record = CallRecord::new(
            self.call_id.clone(),
            self.exchange.clone(),
            self.caller_phone.clone(),
            self.language,
        );
        record.call_type = self.call_type;
        record.name = self.name.as_deref().map(mask_profanity);
        record.pickup = self.pickup.clone().map(mask_address);
        record.destination = self.destination.clone().map(mask_address);
        record.reservation_ts = self.reservation.as_ref().map(|m| m.timestamp);
        record.outcome = self.outcome.get();
        record.outcome_reason = self.outcome.reason().map(String::from);
        record.name_attempts = self.name_attempts;
        record.pickup_attempts = self.pickup_attempts;
        record.destination_attempts = self.destination_attempts;
        record.reservation_attempts = self.reservation_attempts;
        record.stats = self.stats;
        record.started_at = self.started_at;
        record.touch();
        record
    }

    /// Best-effort progress snapshot for crash diagnosis; a write failure
    /// is logged and ignored.
    pub async fn write_progress(&self) {
        let path = self.call_dir.join("progress.json");
        let record = self.snapshot();
        let payload = match serde_json::to_vec_pretty(&record) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(call_id = %self.call_id, error = %e, "progress snapshot unserializable");
                return;
            }
        };
        if let Err(e) = tokio::fs::write(&path, payload).await {
            tracing::debug!(path = %path.display(), error = %e, "progress snapshot not written");
        }
    }
}

fn mask_address(mut resolved: ResolvedAddress) -> ResolvedAddress {
    resolved.address = mask_profanity(&resolved.address);
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> CallSession {
        CallSession::new(
            Path::new("/tmp/agent"),
            "4039",
            "6971234567",
            "1724580000.42",
            Language::Greek,
        )
    }

    #[test]
    fn call_dir_layout() {
        let s = session();
        assert_eq!(
            s.call_dir(),
            Path::new("/tmp/agent/4039/6971234567/1724580000.42")
        );
        assert_eq!(
            s.recording_path("pickup", 2),
            Path::new("/tmp/agent/4039/6971234567/1724580000.42/recordings/pickup_2")
        );
    }

    #[test]
    fn prompt_paths_are_sequential() {
        let mut s = session();
        let first = s.next_prompt_path();
        let second = s.next_prompt_path();
        assert!(first.ends_with("prompt_1"));
        assert!(second.ends_with("prompt_2"));
    }

    #[test]
    fn finalize_is_write_once() {
        let mut s = session();
        assert!(s.finalize(CallOutcome::Hangup, "caller hung up"));
        assert!(!s.finalize(CallOutcome::Success, "too late"));
        assert_eq!(s.outcome(), CallOutcome::Hangup);
        assert_eq!(s.outcome_reason(), Some("caller hung up"));
    }

    #[test]
    fn snapshot_carries_fields_and_outcome() {
        let mut s = session();
        s.name = Some("Μαρία".into());
        s.name_attempts = 2;
        s.finalize(CallOutcome::Success, "booking registered");

        let record = s.snapshot();
        assert_eq!(record.call_id, "1724580000.42");
        assert_eq!(record.name.as_deref(), Some("Μαρία"));
        assert_eq!(record.name_attempts, 2);
        assert_eq!(record.outcome, CallOutcome::Success);
        assert_eq!(record.outcome_reason.as_deref(), Some("booking registered"));
    }
}
