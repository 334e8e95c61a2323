//! Google Cloud speech recognition

use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use taxi_agent_core::{Language, Result, SpeechToText};

const DEFAULT_ENDPOINT: &str = "https://speech.googleapis.com/v1/speech:recognize";

/// A recording shorter than this is an empty take (the caller said nothing
/// before the silence cutoff).
const MIN_AUDIO_MS: u32 = 300;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeConfig {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: String,
    profanity_filter: bool,
}

#[derive(Debug, Serialize)]
struct RecognizeRequest {
    config: RecognizeConfig,
    audio: RecognizeAudio,
}

#[derive(Debug, Serialize)]
struct RecognizeAudio {
    content: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognizeResult>,
}

#[derive(Debug, Deserialize)]
struct RecognizeResult {
    #[serde(default)]
    alternatives: Vec<RecognizeAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognizeAlternative {
    #[serde(default)]
    transcript: String,
}

/// Cloud STT over line recordings (LINEAR16, 8 kHz)
pub struct GoogleStt {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleStt {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Point at a different endpoint (tests, proxies)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Reject takes that are too short to hold speech. Unreadable WAV data
    /// also counts as empty; the caller gets a re-prompt either way.
    fn audible_ms(bytes: &[u8]) -> u32 {
        match hound::WavReader::new(Cursor::new(bytes)) {
            Ok(reader) => {
                let spec = reader.spec();
                if spec.sample_rate == 0 {
                    return 0;
                }
                (reader.duration() as u64 * 1000 / spec.sample_rate as u64) as u32
            }
            Err(_) => 0,
        }
    }
}

#[async_trait]
impl SpeechToText for GoogleStt {
    async fn transcribe(&self, wav: &Path, language: Language) -> Result<String> {
        let bytes = match tokio::fs::read(wav).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %wav.display(), error = %e, "recording missing, treating as silence");
                return Ok(String::new());
            }
        };

        let audible = Self::audible_ms(&bytes);
        if audible < MIN_AUDIO_MS {
            tracing::debug!(path = %wav.display(), audible_ms = audible, "recording too short");
            return Ok(String::new());
        }

        let request = RecognizeRequest {
            config: RecognizeConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: 8000,
                language_code: language.bcp47().to_string(),
                // Masking happens locally on display paths only; the raw
                // transcript must stay intact for geocoding.
                profanity_filter: false,
            },
            audio: RecognizeAudio {
                content: base64::engine::general_purpose::STANDARD.encode(&bytes),
            },
        };

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(status = %r.status(), "stt request rejected");
                return Ok(String::new());
            }
            Err(e) => {
                tracing::warn!(error = %e, "stt request failed");
                return Ok(String::new());
            }
        };

        let parsed: RecognizeResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "stt response unreadable");
                return Ok(String::new());
            }
        };

        let transcript = parsed
            .results
            .iter()
            .flat_map(|r| r.alternatives.iter())
            .map(|a| a.transcript.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(transcript)
    }

    fn provider_name(&self) -> &str {
        "google-stt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn write_wav(path: &Path, millis: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..(8 * millis) {
            writer.write_sample(100i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn audible_ms_reads_wav_duration() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("take.wav");
        write_wav(&wav, 1000);
        let bytes = std::fs::read(&wav).unwrap();
        let ms = GoogleStt::audible_ms(&bytes);
        assert!((950..=1050).contains(&ms), "got {ms}");
    }

    #[test]
    fn garbage_bytes_count_as_empty() {
        assert_eq!(GoogleStt::audible_ms(b"not a wav"), 0);
    }

    #[tokio::test]
    async fn short_recording_transcribes_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("take.wav");
        write_wav(&wav, 100);
        let stt = GoogleStt::new(reqwest::Client::new(), "k");
        let text = stt.transcribe(&wav, Language::Greek).await.unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn missing_file_transcribes_to_empty() {
        let stt = GoogleStt::new(reqwest::Client::new(), "k");
        let text = stt
            .transcribe(Path::new("/nonexistent/take.wav"), Language::Greek)
            .await
            .unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn joins_alternative_transcripts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/speech:recognize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"alternatives": [{"transcript": "Λεωφόρος Συγγρού"}]},
                    {"alternatives": [{"transcript": "150"}]}
                ]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("take.wav");
        write_wav(&wav, 1000);

        let stt = GoogleStt::new(reqwest::Client::new(), "k")
            .with_endpoint(format!("{}/v1/speech:recognize", server.uri()));
        let text = stt.transcribe(&wav, Language::Greek).await.unwrap();
        assert_eq!(text, "Λεωφόρος Συγγρού 150");
    }

    #[tokio::test]
    async fn provider_failure_is_silence_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("take.wav");
        write_wav(&wav, 1000);

        let stt = GoogleStt::new(reqwest::Client::new(), "k")
            .with_endpoint(format!("{}/v1/speech:recognize", server.uri()));
        let text = stt.transcribe(&wav, Language::Greek).await.unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn request_serializes_to_api_shape() {
        let request = RecognizeRequest {
            config: RecognizeConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: 8000,
                language_code: "el-GR".into(),
                profanity_filter: false,
            },
            audio: RecognizeAudio {
                content: "AAAA".into(),
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["config"]["sampleRateHertz"], 8000);
        assert_eq!(value["config"]["languageCode"], "el-GR");
        assert_eq!(value["audio"]["content"], "AAAA");
    }
}
