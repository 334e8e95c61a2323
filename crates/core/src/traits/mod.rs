//! Traits at the provider seams
//!
//! Every external integration gets a trait plus typed request/response
//! shapes, so the orchestrator can be driven end-to-end against mocks.

pub mod dispatch;
pub mod geo;
pub mod speech;

pub use dispatch::{BookingRequest, CallerProfile, DispatchApi, RegistrationOutcome};
pub use geo::Geocoder;
pub use speech::{DateTimeRecognizer, SpeechToText, TextToSpeech};
