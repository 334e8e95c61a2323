//! Dispatch backend integration
//!
//! - [`DispatchClient`] - caller lookup and booking registration over HTTP
//! - [`StatusArtifact`] / [`DriverStatus`] - trip updates dropped by the
//!   status webhook into the call directory
//! - [`CallbackPoller`] - the callback-mode wait loop as a pure transition
//!   table

pub mod client;
pub mod poller;
pub mod status;

pub use client::{DispatchClient, AUTOMATED_TAG, REGISTRATION_FALLBACK_MSG};
pub use poller::{CallbackPoller, PollStep};
pub use status::{DriverStatus, StatusArtifact};
