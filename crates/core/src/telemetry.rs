//! Telemetry contract
//!
//! The telemetry store receives a call record when a session starts and an
//! updated copy after every field mutation. Delivery is fire-and-forget:
//! sink unavailability must never alter call flow, so the trait cannot fail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::language::Language;
use crate::location::ResolvedAddress;
use crate::outcome::CallOutcome;
use crate::stats::ProviderStats;

/// Caller intent as selected at the welcome menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    #[default]
    Unknown,
    Immediate,
    Reservation,
    Operator,
}

/// Snapshot of one call session, keyed by call id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub call_id: String,
    pub exchange: String,
    pub caller_phone: String,
    pub language: Language,
    pub call_type: CallType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup: Option<ResolvedAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<ResolvedAddress>,
    /// Reservation pickup time, unix seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_ts: Option<i64>,
    pub outcome: CallOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome_reason: Option<String>,
    pub name_attempts: u32,
    pub pickup_attempts: u32,
    pub destination_attempts: u32,
    pub reservation_attempts: u32,
    pub stats: ProviderStats,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CallRecord {
    pub fn new(
        call_id: impl Into<String>,
        exchange: impl Into<String>,
        caller_phone: impl Into<String>,
        language: Language,
    ) -> Self {
        let now = Utc::now();
        Self {
            call_id: call_id.into(),
            exchange: exchange.into(),
            caller_phone: caller_phone.into(),
            language,
            call_type: CallType::Unknown,
            name: None,
            pickup: None,
            destination: None,
            reservation_ts: None,
            outcome: CallOutcome::InProgress,
            outcome_reason: None,
            name_attempts: 0,
            pickup_attempts: 0,
            destination_attempts: 0,
            reservation_attempts: 0,
            stats: ProviderStats::default(),
            started_at: now,
            updated_at: now,
        }
    }

    /// Bump the update timestamp before sending
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Fire-and-forget call-record sink
///
/// Implementations take an owned snapshot and return immediately; delivery
/// failures are logged, never raised.
pub trait TelemetrySink: Send + Sync {
    fn create(&self, record: CallRecord);
    fn update(&self, record: CallRecord);
}
