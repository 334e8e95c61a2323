//! Error types shared across the agent crates

use thiserror::Error;

/// Agent-wide error type
///
/// The taxonomy matters to the orchestrator: `Hangup` is always terminal
/// and finalizes the session exactly once, while provider errors feed the
/// re-prompt/retry machinery and never tear the call down by themselves.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller disconnect detected by the transport (in-band marker or a
    /// dead-channel probe result).
    #[error("caller hung up")]
    Hangup,

    /// Line-control transport failure other than a hangup
    #[error("channel error: {0}")]
    Channel(String),

    /// External backend failure (speech, geocoding, date parsing, dispatch)
    #[error("{service} error: {message}")]
    Provider {
        service: &'static str,
        message: String,
    },

    /// Exchange policy / configuration problem
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a provider error from any displayable cause
    pub fn provider(service: &'static str, cause: impl std::fmt::Display) -> Self {
        Error::Provider {
            service,
            message: cause.to_string(),
        }
    }

    /// True when the error means the caller is gone
    pub fn is_hangup(&self) -> bool {
        matches!(self, Error::Hangup)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_carries_service_name() {
        let err = Error::provider("stt", "HTTP 500");
        assert_eq!(err.to_string(), "stt error: HTTP 500");
        assert!(!err.is_hangup());
    }

    #[test]
    fn hangup_is_detected() {
        assert!(Error::Hangup.is_hangup());
    }
}
