//! Per-exchange policy configuration
//!
//! Each inbound extension ("exchange") carries its own credentials, operator
//! fallback, synthesis provider, geocoding policy and retry budgets. The
//! whole table loads once from a TOML file; a session borrows one immutable
//! entry for its lifetime.

pub mod exchange;

pub use exchange::{
    AutoServeMode, BoundsRestrictionMode, CallbackMode, ExchangeConfig, ExchangeTable,
    GeocodingApi, TtsProvider,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("unknown exchange: {0}")]
    UnknownExchange(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
