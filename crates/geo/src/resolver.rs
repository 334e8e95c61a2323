//! Policy-driven address resolution
//!
//! One resolver per call, built from the exchange policy. Resolution runs:
//! replacement rewrite, override shortcuts, backend lookup, precision gate,
//! bounds post-check. Every rejection path collapses to `Ok(None)`; backend
//! failures do too, since the collection loop handles them all the same way.

use async_trait::async_trait;
use serde::Deserialize;
use taxi_agent_core::{
    BoundingBox, CenterBias, GeoPrecision, Geocoder, LatLng, Language, LocationKind,
    ResolvedAddress, Result,
};

use crate::normalize::apply_replacements;
use crate::overrides;

const GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const PLACES_ENDPOINT: &str = "https://places.googleapis.com/v1/places:searchText";
const PLACES_FIELD_MASK: &str =
    "places.displayName,places.formattedAddress,places.location,places.addressComponents";

/// Which backend the exchange pays for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeoBackend {
    #[default]
    Geocode,
    Places,
}

/// Per-exchange resolution policy, extracted from the exchange config
#[derive(Debug, Clone, Default)]
pub struct GeoPolicy {
    pub api_key: String,
    pub backend: GeoBackend,
    pub strict_dropoff: bool,
    /// Enables the Athens airport shortcut
    pub airport_shortcut: bool,
    pub pickup_bounds: Option<BoundingBox>,
    pub dropoff_bounds: Option<BoundingBox>,
    pub pickup_bias: Option<CenterBias>,
    pub dropoff_bias: Option<CenterBias>,
}

impl GeoPolicy {
    fn bounds_for(&self, kind: LocationKind) -> Option<BoundingBox> {
        match kind {
            LocationKind::Pickup => self.pickup_bounds,
            LocationKind::Dropoff => self.dropoff_bounds,
        }
    }

    fn bias_for(&self, kind: LocationKind) -> Option<CenterBias> {
        match kind {
            LocationKind::Pickup => self.pickup_bias,
            LocationKind::Dropoff => self.dropoff_bias,
        }
    }
}

pub struct GeoResolver {
    http: reqwest::Client,
    policy: GeoPolicy,
    geocode_endpoint: String,
    places_endpoint: String,
}

impl GeoResolver {
    pub fn new(http: reqwest::Client, policy: GeoPolicy) -> Self {
        Self {
            http,
            policy,
            geocode_endpoint: GEOCODE_ENDPOINT.to_string(),
            places_endpoint: PLACES_ENDPOINT.to_string(),
        }
    }

    pub fn with_geocode_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.geocode_endpoint = endpoint.into();
        self
    }

    pub fn with_places_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.places_endpoint = endpoint.into();
        self
    }

    async fn lookup_geocode(
        &self,
        query: &str,
        kind: LocationKind,
        language: Language,
    ) -> Option<ResolvedAddress> {
        let mut params: Vec<(&str, String)> = vec![
            ("address", query.to_string()),
            ("key", self.policy.api_key.clone()),
            ("language", language.bcp47().to_string()),
        ];
        if let Some(bias) = self.policy.bias_for(kind) {
            params.push(("location", format!("{},{}", bias.lat, bias.lng)));
            params.push(("radius", format!("{}", bias.radius)));
        }

        let response = self
            .http
            .get(&self.geocode_endpoint)
            .query(&params)
            .send()
            .await;
        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(status = %r.status(), "geocode request rejected");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "geocode request failed");
                return None;
            }
        };
        let parsed: GeocodeResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "geocode response unreadable");
                return None;
            }
        };
        if parsed.status != "OK" {
            tracing::debug!(status = %parsed.status, "geocode returned no result");
            return None;
        }
        let first = parsed.results.into_iter().next()?;
        let precision = GeoPrecision::from_api(&first.geometry.location_type)?;
        Some(ResolvedAddress {
            address: first.formatted_address,
            lat_lng: LatLng::new(first.geometry.location.lat, first.geometry.location.lng),
            precision,
        })
    }

    async fn lookup_places(
        &self,
        query: &str,
        kind: LocationKind,
        language: Language,
    ) -> Option<ResolvedAddress> {
        let mut body = serde_json::json!({
            "textQuery": query,
            "languageCode": language.code(),
            "regionCode": "GR",
            "maxResultCount": 1,
        });
        if let Some(bias) = self.policy.bias_for(kind) {
            body["locationBias"] = serde_json::json!({
                "circle": {
                    "center": { "latitude": bias.lat, "longitude": bias.lng },
                    "radius": bias.radius,
                }
            });
        }

        let response = self
            .http
            .post(&self.places_endpoint)
            .header("X-Goog-Api-Key", &self.policy.api_key)
            .header("X-Goog-FieldMask", PLACES_FIELD_MASK)
            .json(&body)
            .send()
            .await;
        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(status = %r.status(), "places request rejected");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "places request failed");
                return None;
            }
        };
        let parsed: PlacesResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "places response unreadable");
                return None;
            }
        };
        let place = parsed.places.into_iter().next()?;
        let precision = place_precision(&place.address_components);
        Some(ResolvedAddress {
            address: place.formatted_address,
            lat_lng: LatLng::new(place.location.latitude, place.location.longitude),
            precision,
        })
    }
}

#[async_trait]
impl Geocoder for GeoResolver {
    async fn resolve(
        &self,
        query: &str,
        kind: LocationKind,
        language: Language,
    ) -> Result<Option<ResolvedAddress>> {
        let query = apply_replacements(query);

        if let Some(hit) = overrides::city_centre(&query, kind) {
            return Ok(Some(hit));
        }
        if self.policy.airport_shortcut {
            if let Some(hit) = overrides::airport(&query) {
                return Ok(Some(hit));
            }
        }

        let resolved = match self.policy.backend {
            GeoBackend::Geocode => self.lookup_geocode(&query, kind, language).await,
            GeoBackend::Places => self.lookup_places(&query, kind, language).await,
        };
        let Some(resolved) = resolved else {
            return Ok(None);
        };

        if !resolved
            .precision
            .acceptable_for(kind, self.policy.strict_dropoff)
        {
            tracing::debug!(
                precision = ?resolved.precision,
                ?kind,
                "resolution below precision gate"
            );
            return Ok(None);
        }

        if let Some(bounds) = self.policy.bounds_for(kind) {
            if !bounds.contains(resolved.lat_lng) {
                tracing::debug!(
                    lat = resolved.lat_lng.lat,
                    lng = resolved.lat_lng.lng,
                    "resolution outside exchange bounds"
                );
                return Ok(None);
            }
        }

        Ok(Some(resolved))
    }
}

/// Component-derived precision for the Places backend, which has no
/// location_type of its own: street number plus route is a rooftop fix,
/// route alone is interpolated, anything else is a centre point.
fn place_precision(components: &[AddressComponent]) -> GeoPrecision {
    if components.is_empty() {
        return GeoPrecision::Approximate;
    }
    let mut has_street_number = false;
    let mut has_route = false;
    for component in components {
        for kind in &component.types {
            match kind.as_str() {
                "street_number" => has_street_number = true,
                "route" => has_route = true,
                _ => {}
            }
        }
    }
    if has_street_number && has_route {
        GeoPrecision::Rooftop
    } else if has_route {
        GeoPrecision::RangeInterpolated
    } else {
        GeoPrecision::GeometricCenter
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    formatted_address: String,
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: GeocodeLocation,
    #[serde(default)]
    location_type: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeLocation {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    places: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct Place {
    #[serde(rename = "formattedAddress", default)]
    formatted_address: String,
    location: PlaceLocation,
    #[serde(rename = "addressComponents", default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct PlaceLocation {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    #[serde(default)]
    types: Vec<String>,
}
