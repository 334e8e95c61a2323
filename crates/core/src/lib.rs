//! Core traits and types for the taxi call agent
//!
//! This crate provides foundational types used across all other crates:
//! - Core traits for pluggable backends (STT, TTS, geocoding, date
//!   recognition, dispatch, telemetry)
//! - Call outcome state with write-once finalization
//! - Language definitions and prompt language switching
//! - Geocoding precision classification and acceptance gating
//! - Reservation time candidates and disambiguation rules
//! - Error types

pub mod error;
pub mod language;
pub mod location;
pub mod outcome;
pub mod profanity;
pub mod reservation;
pub mod stats;
pub mod telemetry;
pub mod traits;

pub use error::{Error, Result};
pub use language::Language;
pub use location::{
    BoundingBox, CenterBias, GeoPrecision, LatLng, LocationKind, ResolvedAddress,
};
pub use outcome::{CallOutcome, OutcomeCell};
pub use profanity::mask_profanity;
pub use reservation::{ReservationCandidate, ReservationDecision, TimeMatch};
pub use stats::ProviderStats;
pub use telemetry::{CallRecord, CallType, TelemetrySink};
pub use traits::{
    BookingRequest, CallerProfile, DateTimeRecognizer, DispatchApi, Geocoder,
    RegistrationOutcome, SpeechToText, TextToSpeech,
};
