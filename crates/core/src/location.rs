//! Geocoded locations and precision gating
//!
//! A spoken address resolves to a coordinate plus a precision class. Pickup
//! addresses must be precise enough to send a car to; destinations may be
//! looser unless the exchange runs a strict-dropoff policy.

use serde::{Deserialize, Serialize};

/// WGS-84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const ZERO: LatLng = LatLng { lat: 0.0, lng: 0.0 };

    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Which side of the trip an address belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Pickup,
    Dropoff,
}

/// Geocoder confidence class
///
/// `Exact` never comes from the network: it marks special-cased overrides
/// (city-centre phrases, per-exchange airport shortcuts) that bypass the
/// geocoding backend entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeoPrecision {
    Rooftop,
    RangeInterpolated,
    GeometricCenter,
    Approximate,
    Exact,
}

impl GeoPrecision {
    /// Parse the `location_type` string both geocoding backends emit
    pub fn from_api(s: &str) -> Option<Self> {
        match s {
            "ROOFTOP" => Some(Self::Rooftop),
            "RANGE_INTERPOLATED" => Some(Self::RangeInterpolated),
            "GEOMETRIC_CENTER" => Some(Self::GeometricCenter),
            "APPROXIMATE" => Some(Self::Approximate),
            "EXACT" => Some(Self::Exact),
            _ => None,
        }
    }

    /// Acceptance gate per field
    ///
    /// Pickup: ROOFTOP, RANGE_INTERPOLATED or the special-cased EXACT.
    /// Dropoff: additionally GEOMETRIC_CENTER and APPROXIMATE, unless the
    /// exchange sets strict dropoff.
    pub fn acceptable_for(&self, kind: LocationKind, strict_dropoff: bool) -> bool {
        match kind {
            LocationKind::Pickup => matches!(
                self,
                Self::Rooftop | Self::RangeInterpolated | Self::Exact
            ),
            LocationKind::Dropoff => {
                if strict_dropoff {
                    matches!(self, Self::Rooftop | Self::RangeInterpolated | Self::Exact)
                } else {
                    true
                }
            }
        }
    }
}

/// A resolved address: what the geocoder gave back for a transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAddress {
    /// Formatted address text
    pub address: String,
    #[serde(rename = "latLng")]
    pub lat_lng: LatLng,
    /// Precision classification
    pub precision: GeoPrecision,
}

/// Geographic bounding box for post-resolution validation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: LatLng) -> bool {
        point.lat <= self.north
            && point.lat >= self.south
            && point.lng <= self.east
            && point.lng >= self.west
    }
}

/// Center-point bias forwarded to the geocoding backends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CenterBias {
    pub lat: f64,
    pub lng: f64,
    /// Radius in meters
    pub radius: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pickup_gate_rejects_loose_precision() {
        assert!(!GeoPrecision::Approximate.acceptable_for(LocationKind::Pickup, false));
        assert!(!GeoPrecision::GeometricCenter.acceptable_for(LocationKind::Pickup, false));
        assert!(GeoPrecision::Rooftop.acceptable_for(LocationKind::Pickup, false));
        assert!(GeoPrecision::RangeInterpolated.acceptable_for(LocationKind::Pickup, false));
        assert!(GeoPrecision::Exact.acceptable_for(LocationKind::Pickup, true));
    }

    #[test]
    fn dropoff_gate_follows_strict_policy() {
        assert!(GeoPrecision::Approximate.acceptable_for(LocationKind::Dropoff, false));
        assert!(!GeoPrecision::Approximate.acceptable_for(LocationKind::Dropoff, true));
        assert!(GeoPrecision::RangeInterpolated.acceptable_for(LocationKind::Dropoff, true));
    }

    #[test]
    fn bounding_box_contains() {
        let athens = BoundingBox {
            north: 38.1,
            south: 37.8,
            east: 24.0,
            west: 23.5,
        };
        assert!(athens.contains(LatLng::new(37.98, 23.73)));
        assert!(!athens.contains(LatLng::new(40.63, 22.94)));
    }

    #[test]
    fn precision_parses_api_strings() {
        assert_eq!(GeoPrecision::from_api("ROOFTOP"), Some(GeoPrecision::Rooftop));
        assert_eq!(
            GeoPrecision::from_api("RANGE_INTERPOLATED"),
            Some(GeoPrecision::RangeInterpolated)
        );
        assert_eq!(GeoPrecision::from_api("garbage"), None);
    }
}
