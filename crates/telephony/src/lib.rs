//! AGI line-control transport
//!
//! This crate speaks the text command/response protocol the telephony host
//! drives one call with:
//! - Environment/header block parsing at session start
//! - One-command-in-flight request/response over a duplex stream
//! - Playback, DTMF read, bounded recording, channel variables
//! - Channel-status probe distinguishing "timeout" from "line dead"
//! - Hangup-marker detection after every blocking primitive
//!
//! The orchestrator programs against the [`CallChannel`] trait; the wire
//! implementation is [`AgiChannel`]. Tests drive the flow with scripted
//! mocks instead of a live channel.

pub mod channel;
pub mod protocol;

pub use channel::{AgiChannel, CallChannel};
pub use protocol::{is_anonymous_number, AgiEnv, AgiResponse};
