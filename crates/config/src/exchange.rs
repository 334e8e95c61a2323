//! Exchange policy table
//!
//! Mirrors the per-extension entries the telephony host provisions:
//! credentials, dispatch URL, operator dial string, sound root, synthesis
//! provider, geocoding bounds policy and self-service mode.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use taxi_agent_core::{BoundingBox, CenterBias, Language, LocationKind};

use crate::ConfigError;

/// Which self-service intents the exchange allows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AutoServeMode {
    /// Immediate and reservation bookings both self-served
    #[default]
    All,
    /// Only immediate bookings; reservations go to the operator
    ImmediateOnly,
    /// Only reservations; immediate requests go to the operator
    ReservationOnly,
    /// All self-service disabled; every call goes to the operator
    None,
}

/// Where geographic bounding applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundsRestrictionMode {
    #[default]
    None,
    PickupOnly,
    DropoffOnly,
    Both,
}

impl BoundsRestrictionMode {
    pub fn applies_to(&self, kind: LocationKind) -> bool {
        match self {
            Self::None => false,
            Self::PickupOnly => kind == LocationKind::Pickup,
            Self::DropoffOnly => kind == LocationKind::Dropoff,
            Self::Both => true,
        }
    }
}

/// How booking acceptance reaches the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CallbackMode {
    /// Play the registration response message and hang up
    #[default]
    Synchronous,
    /// Poll the status artifact and announce driver assignment live
    Callback,
}

/// Synthesis backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TtsProvider {
    #[default]
    Google,
    Neural,
}

/// Geocoding backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeocodingApi {
    /// Legacy Geocoding API
    #[default]
    Geocode,
    /// Places searchText endpoint
    Places,
}

/// One exchange's immutable policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Display name, also used by geocoding overrides (e.g. airport shortcut)
    pub name: String,
    pub google_api_key: String,
    /// Dispatch API token
    pub client_token: String,
    /// Dispatch API base URL
    pub register_base_url: String,
    /// Operator dial string (e.g. `PJSIP/2104115200@trunk`)
    pub operator_dial: String,
    /// Root directory of pre-recorded prompts
    pub sound_path: String,
    #[serde(default)]
    pub tts_provider: TtsProvider,
    /// Neural TTS service base URL, required when `tts_provider = "neural"`
    #[serde(default)]
    pub neural_tts_url: Option<String>,
    /// Date recognizer service URL
    #[serde(default = "default_date_recognizer_url")]
    pub date_recognizer_url: String,
    /// Telemetry sink base URL; `None` disables the sink
    #[serde(default)]
    pub telemetry_url: Option<String>,
    /// Booking validity window, days
    #[serde(default = "default_days_valid")]
    pub days_valid: u32,
    #[serde(default)]
    pub default_language: Language,
    /// Whether the welcome menu offers the language toggle digit
    #[serde(default = "default_true")]
    pub allow_language_toggle: bool,
    #[serde(default)]
    pub callback_mode: CallbackMode,
    /// Status-callback URL handed to the dispatch backend in callback mode
    #[serde(default)]
    pub callback_url: Option<String>,
    /// Callback poll attempts before giving up
    #[serde(default = "default_repeat_times")]
    pub repeat_times: u32,
    #[serde(default)]
    pub strict_dropoff: bool,
    #[serde(default)]
    pub geocoding_api: GeocodingApi,
    #[serde(default)]
    pub bounds: Option<BoundingBox>,
    #[serde(default)]
    pub center_bias: Option<CenterBias>,
    #[serde(default)]
    pub bounds_restriction_mode: BoundsRestrictionMode,
    #[serde(default)]
    pub auto_serve_mode: AutoServeMode,
    #[serde(default = "default_true")]
    pub ask_for_name: bool,
    #[serde(default = "default_true")]
    pub announce_name: bool,
    /// Redirect callers whose number is not from an allowed prefix
    #[serde(default)]
    pub foreign_redirect: bool,
    /// Skip the welcome menu and proceed as an immediate booking
    #[serde(default)]
    pub bypass_welcome: bool,
    /// Per-field collection retry budget
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> u32 {
    3
}

fn default_days_valid() -> u32 {
    7
}

fn default_repeat_times() -> u32 {
    10
}

fn default_date_recognizer_url() -> String {
    "http://www.iqdriver.com/Recognizers/api/Recognize/Date".to_string()
}

impl ExchangeConfig {
    /// Cross-field checks that serde defaults cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tts_provider == TtsProvider::Neural && self.neural_tts_url.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "neural_tts_url".to_string(),
                message: "required when tts_provider is \"neural\"".to_string(),
            });
        }
        Ok(())
    }

    /// Bounds to enforce for this field, if restriction applies
    pub fn bounds_for(&self, kind: LocationKind) -> Option<BoundingBox> {
        if self.bounds_restriction_mode.applies_to(kind) {
            self.bounds
        } else {
            None
        }
    }

    /// Center bias to forward for this field, if restriction applies
    pub fn bias_for(&self, kind: LocationKind) -> Option<CenterBias> {
        if self.bounds_restriction_mode.applies_to(kind) {
            self.center_bias
        } else {
            None
        }
    }
}

/// The full extension-keyed policy table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangeTable {
    #[serde(default)]
    pub exchanges: HashMap<String, ExchangeConfig>,
}

impl ExchangeTable {
    /// Load the table from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        let table: ExchangeTable = toml::from_str(&raw)?;
        tracing::info!(exchanges = table.exchanges.len(), "loaded exchange table");
        Ok(table)
    }

    /// Look up the policy for an extension
    pub fn get(&self, extension: &str) -> Result<&ExchangeConfig, ConfigError> {
        self.exchanges
            .get(extension)
            .ok_or_else(|| ConfigError::UnknownExchange(extension.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [exchanges.4039]
        name = "Downtown"
        google_api_key = "test-key"
        client_token = "test-token"
        register_base_url = "https://dispatch.example.com/api"
        operator_dial = "PJSIP/2104115200@trunk"
        sound_path = "/var/sounds/agent"
        tts_provider = "neural"
        neural_tts_url = "http://10.0.0.5:221"
        callback_mode = "callback"
        callback_url = "https://pbx.example.com/callback.php"
        strict_dropoff = true
        bounds = { north = 38.1, south = 37.8, east = 24.0, west = 23.5 }
        bounds_restriction_mode = "pickup_only"
        auto_serve_mode = "immediate_only"
    "#;

    #[test]
    fn parses_sample_table() {
        let table: ExchangeTable = toml::from_str(SAMPLE).unwrap();
        let ex = table.get("4039").unwrap();
        assert_eq!(ex.name, "Downtown");
        assert_eq!(ex.tts_provider, TtsProvider::Neural);
        assert_eq!(ex.callback_mode, CallbackMode::Callback);
        assert_eq!(ex.auto_serve_mode, AutoServeMode::ImmediateOnly);
        assert!(ex.strict_dropoff);
        // Defaults fill in everything unspecified.
        assert_eq!(ex.max_retries, 3);
        assert_eq!(ex.days_valid, 7);
        assert_eq!(ex.repeat_times, 10);
        assert!(ex.ask_for_name);
        assert!(ex.allow_language_toggle);
        assert_eq!(ex.default_language, Language::Greek);
    }

    #[test]
    fn bounds_respect_restriction_mode() {
        let table: ExchangeTable = toml::from_str(SAMPLE).unwrap();
        let ex = table.get("4039").unwrap();
        assert!(ex.bounds_for(LocationKind::Pickup).is_some());
        assert!(ex.bounds_for(LocationKind::Dropoff).is_none());
    }

    #[test]
    fn unknown_exchange_is_an_error() {
        let table: ExchangeTable = toml::from_str(SAMPLE).unwrap();
        assert!(matches!(
            table.get("9999"),
            Err(ConfigError::UnknownExchange(_))
        ));
    }

    #[test]
    fn neural_provider_without_url_fails_validation() {
        let table: ExchangeTable = toml::from_str(SAMPLE).unwrap();
        let mut ex = table.get("4039").unwrap().clone();
        assert!(ex.validate().is_ok());

        ex.neural_tts_url = None;
        assert!(matches!(
            ex.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "neural_tts_url"
        ));
    }

    #[test]
    fn restriction_mode_matrix() {
        use BoundsRestrictionMode as Mode;
        assert!(!Mode::None.applies_to(LocationKind::Pickup));
        assert!(Mode::PickupOnly.applies_to(LocationKind::Pickup));
        assert!(!Mode::PickupOnly.applies_to(LocationKind::Dropoff));
        assert!(Mode::DropoffOnly.applies_to(LocationKind::Dropoff));
        assert!(Mode::Both.applies_to(LocationKind::Pickup));
        assert!(Mode::Both.applies_to(LocationKind::Dropoff));
    }
}
