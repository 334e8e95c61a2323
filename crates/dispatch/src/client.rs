//! HTTP client for the dispatch backend
//!
//! Two operations: caller lookup before the flow starts, and booking
//! registration at the end. Both degrade instead of failing: an unreachable
//! backend yields an empty profile or a rejected registration with a spoken
//! fallback message, and the flow carries on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taxi_agent_core::{
    BookingRequest, CallerProfile, DispatchApi, GeoPrecision, LatLng, RegistrationOutcome,
    ResolvedAddress, Result,
};

/// Tag prepended to every comment so dispatchers can tell these bookings
/// from operator-entered ones.
pub const AUTOMATED_TAG: &str = "[ΑΥΤΟΜΑΤΟΠΟΙΗΜΕΝΗ ΚΛΗΣΗ]";

/// Spoken when the backend rejects or never answers a registration
pub const REGISTRATION_FALLBACK_MSG: &str =
    "Κάτι πήγε στραβά με την καταχώρηση της διαδρομής σας";

pub struct DispatchClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl DispatchClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            token: token.into(),
        }
    }

    fn rejected() -> RegistrationOutcome {
        RegistrationOutcome {
            accepted: false,
            message: REGISTRATION_FALLBACK_MSG.to_string(),
            registration_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterPayload<'a> {
    call_time_stamp: Option<i64>,
    caller_phone: &'a str,
    customer_name: &'a str,
    road_name: &'a str,
    latitude: f64,
    longitude: f64,
    destination: &'a str,
    dest_latitude: f64,
    dest_longitude: f64,
    taxis_no: u32,
    comments: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_path: Option<&'a str>,
    days_valid: u32,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    result: Option<RegisterResult>,
}

#[derive(Debug, Deserialize)]
struct RegisterResult {
    #[serde(rename = "resultCode", default = "default_result_code")]
    result_code: i32,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    id: Option<i64>,
}

fn default_result_code() -> i32 {
    -1
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    result: ProfileResult,
    #[serde(default)]
    response: ProfileData,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileResult {
    #[serde(default)]
    result: String,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileData {
    #[serde(rename = "callerName", default)]
    caller_name: Option<String>,
    #[serde(rename = "doNotServe", default)]
    do_not_serve: bool,
    // The backend's field carries a historical triple-s typo.
    #[serde(rename = "mainAddresss", default)]
    main_address: Option<MainAddress>,
}

#[derive(Debug, Deserialize)]
struct MainAddress {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
}

impl From<ProfileData> for CallerProfile {
    fn from(data: ProfileData) -> Self {
        let saved_pickup = data.main_address.and_then(|main| {
            match (main.address, main.lat, main.lng) {
                (Some(address), Some(lat), Some(lng)) if !address.is_empty() => {
                    Some(ResolvedAddress {
                        address,
                        lat_lng: LatLng::new(lat, lng),
                        precision: GeoPrecision::Rooftop,
                    })
                }
                _ => None,
            }
        });
        CallerProfile {
            name: data.caller_name.filter(|n| !n.trim().is_empty()),
            do_not_serve: data.do_not_serve,
            saved_pickup,
        }
    }
}

#[async_trait]
impl DispatchApi for DispatchClient {
    async fn caller_profile(&self, phone: &str) -> Result<CallerProfile> {
        let url = format!("{}/api/Calls/checkCallerID/{}", self.base_url, phone);
        let response = self
            .http
            .get(&url)
            .header("Authorization", &self.token)
            .send()
            .await;
        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(status = %r.status(), "caller lookup rejected");
                return Ok(CallerProfile::default());
            }
            Err(e) => {
                tracing::warn!(error = %e, "caller lookup failed");
                return Ok(CallerProfile::default());
            }
        };
        let parsed: ProfileResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "caller lookup response unreadable");
                return Ok(CallerProfile::default());
            }
        };
        if parsed.result.result != "SUCCESS" {
            return Ok(CallerProfile::default());
        }
        Ok(parsed.response.into())
    }

    async fn register(&self, request: &BookingRequest) -> Result<RegistrationOutcome> {
        let comments = if request.comments.is_empty() {
            AUTOMATED_TAG.to_string()
        } else {
            format!("{} {}", AUTOMATED_TAG, request.comments)
        };
        let payload = RegisterPayload {
            call_time_stamp: request.reservation_ts,
            caller_phone: &request.caller_phone,
            customer_name: request.customer_name.as_deref().unwrap_or(""),
            road_name: &request.pickup_address,
            latitude: request.pickup.lat,
            longitude: request.pickup.lng,
            destination: &request.destination_address,
            dest_latitude: request.destination.lat,
            dest_longitude: request.destination.lng,
            taxis_no: 1,
            comments,
            reference_path: request.reference_path.as_deref(),
            days_valid: request.days_valid,
        };

        let url = format!("{}/api/Calls/RegisterNoLogin", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("Authorization", &self.token)
            .json(&payload)
            .send()
            .await;
        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(status = %r.status(), "registration rejected by transport");
                return Ok(Self::rejected());
            }
            Err(e) => {
                tracing::warn!(error = %e, "registration request failed");
                return Ok(Self::rejected());
            }
        };
        let parsed: RegisterResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "registration response unreadable");
                return Ok(Self::rejected());
            }
        };

        let Some(result) = parsed.result else {
            tracing::warn!("registration response missing result block");
            return Ok(Self::rejected());
        };
        let accepted = result.result_code == 0;
        let message = {
            let msg = result.msg.trim();
            if msg.is_empty() {
                REGISTRATION_FALLBACK_MSG.to_string()
            } else {
                msg.to_string()
            }
        };
        tracing::info!(accepted, result_code = result.result_code, "registration answered");
        Ok(RegistrationOutcome {
            accepted,
            message,
            registration_id: result.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn booking() -> BookingRequest {
        BookingRequest {
            caller_phone: "6971234567".into(),
            customer_name: Some("Μαρία".into()),
            pickup_address: "Ερμού 10, Αθήνα".into(),
            pickup: LatLng::new(37.976, 23.729),
            destination_address: "κέντρο".into(),
            destination: LatLng::ZERO,
            reservation_ts: None,
            comments: String::new(),
            reference_path: None,
            days_valid: 7,
        }
    }

    #[tokio::test]
    async fn known_caller_profile_parses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/Calls/checkCallerID/6971234567"))
            .and(header("Authorization", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "result": "SUCCESS", "msg": "" },
                "response": {
                    "callerName": "Μαρία",
                    "mainAddresss": { "address": "Ερμού 10, Αθήνα", "lat": 37.976, "lng": 23.729 }
                }
            })))
            .mount(&server)
            .await;

        let client = DispatchClient::new(reqwest::Client::new(), server.uri(), "tok");
        let profile = client.caller_profile("6971234567").await.unwrap();
        assert_eq!(profile.name.as_deref(), Some("Μαρία"));
        assert!(profile.has_usable_pickup());
        assert!(!profile.do_not_serve);
    }

    #[tokio::test]
    async fn unknown_caller_is_empty_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "result": "FAILED", "msg": "not found" }
            })))
            .mount(&server)
            .await;

        let client = DispatchClient::new(reqwest::Client::new(), server.uri(), "tok");
        let profile = client.caller_profile("000").await.unwrap();
        assert_eq!(profile, CallerProfile::default());
    }

    #[tokio::test]
    async fn lookup_failure_is_empty_profile_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = DispatchClient::new(reqwest::Client::new(), server.uri(), "tok");
        let profile = client.caller_profile("6971234567").await.unwrap();
        assert_eq!(profile, CallerProfile::default());
    }

    #[tokio::test]
    async fn registration_tags_comments_and_reads_verdict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/Calls/RegisterNoLogin"))
            .and(header("Authorization", "tok"))
            .and(body_partial_json(json!({
                "callerPhone": "6971234567",
                "taxisNo": 1,
                "comments": "[ΑΥΤΟΜΑΤΟΠΟΙΗΜΕΝΗ ΚΛΗΣΗ]",
                "daysValid": 7
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "resultCode": 0, "msg": "Το ταξί σας έρχεται", "id": 5512 }
            })))
            .mount(&server)
            .await;

        let client = DispatchClient::new(reqwest::Client::new(), server.uri(), "tok");
        let outcome = client.register(&booking()).await.unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.message, "Το ταξί σας έρχεται");
        assert_eq!(outcome.registration_id, Some(5512));
    }

    #[tokio::test]
    async fn nonzero_result_code_is_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "resultCode": 3, "msg": "" }
            })))
            .mount(&server)
            .await;

        let client = DispatchClient::new(reqwest::Client::new(), server.uri(), "tok");
        let outcome = client.register(&booking()).await.unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.message, REGISTRATION_FALLBACK_MSG);
    }

    #[tokio::test]
    async fn transport_failure_is_soft_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = DispatchClient::new(reqwest::Client::new(), server.uri(), "tok");
        let outcome = client.register(&booking()).await.unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.message, REGISTRATION_FALLBACK_MSG);
    }
}
