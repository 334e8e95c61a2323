//! Special-cased resolutions that never reach a geocoding backend

use taxi_agent_core::{GeoPrecision, LatLng, LocationKind, ResolvedAddress};

use crate::normalize::comparison_key;

/// Dropoff phrases meaning "the local centre" - dispatched as a zero
/// coordinate the backend understands as "driver asks the passenger".
const CITY_CENTRE_PHRASES: &[&str] = &[
    "κεντρο",
    "τοπικο",
    "κεντρο αθηνα",
    "κεντρο θεσσαλονικη",
    "κεντρο πατρα",
    "κεντρο ηρακλειο",
    "κεντρο λαρισα",
];

const AIRPORT_TERMS: &[&str] = &["αεροδομιο", "αεροδρομιο", "airport"];

const ATHENS_AIRPORT: LatLng = LatLng {
    lat: 37.9363405,
    lng: 23.946668,
};

/// City-centre shortcut, dropoff side only
pub fn city_centre(query: &str, kind: LocationKind) -> Option<ResolvedAddress> {
    if kind != LocationKind::Dropoff {
        return None;
    }
    let key = comparison_key(query);
    if CITY_CENTRE_PHRASES.contains(&key.as_str()) {
        Some(ResolvedAddress {
            address: query.to_string(),
            lat_lng: LatLng::ZERO,
            precision: GeoPrecision::Exact,
        })
    } else {
        None
    }
}

/// Athens airport shortcut for exchanges that opt in
pub fn airport(query: &str) -> Option<ResolvedAddress> {
    let key = comparison_key(query);
    if AIRPORT_TERMS.iter().any(|term| key.contains(term)) {
        Some(ResolvedAddress {
            address: "Αεροδρόμιο Αθηνών Ελευθέριος Βενιζέλος, Σπάτα".to_string(),
            lat_lng: ATHENS_AIRPORT,
            precision: GeoPrecision::Rooftop,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_phrase_resolves_for_dropoff_only() {
        let hit = city_centre("Κέντρο Αθήνα", LocationKind::Dropoff).unwrap();
        assert_eq!(hit.lat_lng, LatLng::ZERO);
        assert_eq!(hit.precision, GeoPrecision::Exact);
        assert!(city_centre("Κέντρο Αθήνα", LocationKind::Pickup).is_none());
    }

    #[test]
    fn centre_requires_exact_phrase() {
        assert!(city_centre("κεντρο της πολης καπου", LocationKind::Dropoff).is_none());
    }

    #[test]
    fn airport_matches_accented_and_english_terms() {
        for q in ["στο αεροδρόμιο", "Αεροδομιο παρακαλω", "to the airport"] {
            let hit = airport(q).unwrap();
            assert_eq!(hit.precision, GeoPrecision::Rooftop);
            assert!((hit.lat_lng.lat - 37.9363405).abs() < 1e-9);
        }
        assert!(airport("Λεωφόρος Συγγρού 150").is_none());
    }
}
