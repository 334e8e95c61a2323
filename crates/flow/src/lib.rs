//! Call flow: orchestration of one inbound booking call
//!
//! The flow crate wires the transport, speech, geocoding, dispatch and
//! telemetry crates into the per-call state machine and ships the
//! `taxi-agent` binary the telephony host spawns per call.

pub mod collect;
pub mod messages;
pub mod orchestrator;
pub mod routing;
pub mod session;

pub use orchestrator::{Orchestrator, Providers};
pub use session::CallSession;
