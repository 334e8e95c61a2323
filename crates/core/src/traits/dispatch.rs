//! Dispatch backend trait and payload shapes

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::location::{LatLng, ResolvedAddress};

/// What the backend knows about a returning caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallerProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Hard service block; an immediate terminal stop when set
    #[serde(default)]
    pub do_not_serve: bool,
    /// Saved main pickup address, offered for voice confirmation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_pickup: Option<ResolvedAddress>,
}

impl CallerProfile {
    /// Profile is usable for the saved-pickup shortcut only with both a
    /// name and a saved coordinate.
    pub fn has_usable_pickup(&self) -> bool {
        self.name.is_some() && self.saved_pickup.is_some()
    }
}

/// Booking registration payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub caller_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub pickup_address: String,
    pub pickup: LatLng,
    pub destination_address: String,
    pub destination: LatLng,
    /// Scheduled pickup, unix seconds; `None` books an immediate ride
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_ts: Option<i64>,
    pub comments: String,
    /// Per-call path the status webhook writes back to (callback mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_path: Option<String>,
    /// Booking validity window in days
    pub days_valid: u32,
}

/// Backend verdict on a registration attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    pub accepted: bool,
    /// Backend message, synthesized back to the caller
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<i64>,
}

/// Dispatch backend operations
#[async_trait]
pub trait DispatchApi: Send + Sync {
    /// Look up a returning caller by phone number. An unknown caller is an
    /// empty profile, not an error.
    async fn caller_profile(&self, phone: &str) -> Result<CallerProfile>;

    /// Submit a booking
    async fn register(&self, request: &BookingRequest) -> Result<RegistrationOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::GeoPrecision;

    #[test]
    fn usable_pickup_requires_name_and_address() {
        let mut profile = CallerProfile::default();
        assert!(!profile.has_usable_pickup());

        profile.name = Some("Maria".into());
        assert!(!profile.has_usable_pickup());

        profile.saved_pickup = Some(ResolvedAddress {
            address: "Ermou 10, Athens".into(),
            lat_lng: LatLng::new(37.976, 23.729),
            precision: GeoPrecision::Rooftop,
        });
        assert!(profile.has_usable_pickup());
    }
}
