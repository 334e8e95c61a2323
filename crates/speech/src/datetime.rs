//! Reservation date/time recognition
//!
//! Sends the caller's utterance to the recognizer service and maps its
//! candidates into a [`ReservationCandidate`]. The service translates the
//! utterance before matching, so Greek input works against an English
//! matcher. Failures come back as an empty candidate set, never an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taxi_agent_core::{DateTimeRecognizer, Language, ReservationCandidate, Result, TimeMatch};

#[derive(Debug, Serialize)]
struct RecognizeDateRequest<'a> {
    input: &'a str,
    key: &'a str,
    #[serde(rename = "translateFrom")]
    translate_from: &'a str,
    #[serde(rename = "translateTo")]
    translate_to: &'static str,
    #[serde(rename = "matchLang")]
    match_lang: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeDateResponse {
    #[serde(rename = "bestMatchUnixTimestamp")]
    best_match_unix_timestamp: Option<i64>,
    #[serde(rename = "formattedBestMatch", default)]
    formatted_best_match: String,
    #[serde(default)]
    alternates: Vec<DateAlternate>,
}

#[derive(Debug, Deserialize)]
struct DateAlternate {
    #[serde(rename = "unixTimestamp")]
    unix_timestamp: i64,
    #[serde(rename = "formattedText", default)]
    formatted_text: String,
}

impl From<RecognizeDateResponse> for ReservationCandidate {
    fn from(wire: RecognizeDateResponse) -> Self {
        let best_match = wire
            .best_match_unix_timestamp
            .filter(|ts| *ts > 0)
            .map(|ts| TimeMatch {
                timestamp: ts,
                text: wire.formatted_best_match.clone(),
            });
        let alternates = wire
            .alternates
            .into_iter()
            .filter(|a| a.unix_timestamp > 0)
            .map(|a| TimeMatch {
                timestamp: a.unix_timestamp,
                text: a.formatted_text,
            })
            .collect();
        ReservationCandidate {
            best_match,
            alternates,
        }
    }
}

/// Client for the hosted date recognizer
pub struct DateRecognizerClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl DateRecognizerClient {
    pub fn new(http: reqwest::Client, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl DateTimeRecognizer for DateRecognizerClient {
    async fn recognize(&self, utterance: &str, language: Language) -> Result<ReservationCandidate> {
        let request = RecognizeDateRequest {
            input: utterance,
            key: &self.api_key,
            translate_from: language.code(),
            translate_to: "en",
            match_lang: "en-US",
        };

        let response = self.http.post(&self.url).json(&request).send().await;
        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(status = %r.status(), "date recognizer rejected request");
                return Ok(ReservationCandidate::default());
            }
            Err(e) => {
                tracing::warn!(error = %e, "date recognizer unreachable");
                return Ok(ReservationCandidate::default());
            }
        };

        let parsed: RecognizeDateResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "date recognizer response unreadable");
                return Ok(ReservationCandidate::default());
            }
        };

        Ok(parsed.into())
    }
}
