//! Text-to-speech backends
//!
//! Two interchangeable synthesizers selected by exchange policy:
//! - [`GoogleTts`] - cloud synthesis returning MP3, transcoded with ffmpeg
//!   to the 8 kHz mono WAV the line expects
//! - [`NeuralTts`] - self-hosted neural engine that already returns
//!   line-ready audio

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use taxi_agent_core::{Error, Language, Result, TextToSpeech};

const GOOGLE_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// A synthesized file smaller than this is junk, not audio.
const MIN_WAV_BYTES: u64 = 100;

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection,
    #[serde(rename = "audioConfig")]
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct VoiceSelection {
    #[serde(rename = "languageCode")]
    language_code: String,
}

#[derive(Debug, Serialize)]
struct AudioConfig {
    #[serde(rename = "audioEncoding")]
    audio_encoding: &'static str,
    #[serde(rename = "speakingRate")]
    speaking_rate: f32,
    pitch: f32,
    #[serde(rename = "volumeGainDb")]
    volume_gain_db: f32,
}

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    #[serde(rename = "audioContent")]
    audio_content: String,
}

/// Google cloud synthesis with local ffmpeg transcode
pub struct GoogleTts {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleTts {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            endpoint: GOOGLE_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn transcode_to_line_wav(mp3: &Path, wav: &Path) -> Result<()> {
        let status = tokio::process::Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(mp3)
            .args(["-ac", "1", "-ar", "8000"])
            .arg(wav)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .map_err(|e| Error::provider("tts", format!("ffmpeg spawn: {e}")))?;
        if !status.success() {
            return Err(Error::provider("tts", "ffmpeg transcode failed"));
        }
        Ok(())
    }
}

#[async_trait]
impl TextToSpeech for GoogleTts {
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
        out_base: &Path,
    ) -> Result<PathBuf> {
        let request = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: language.bcp47().to_string(),
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: 1.0,
                pitch: 0.0,
                volume_gain_db: 0.0,
            },
        };

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::provider("tts", e))?;
        if !response.status().is_success() {
            return Err(Error::provider(
                "tts",
                format!("HTTP {}", response.status()),
            ));
        }
        let parsed: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| Error::provider("tts", e))?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(parsed.audio_content.as_bytes())
            .map_err(|e| Error::provider("tts", e))?;

        let mp3 = out_base.with_extension("mp3");
        let wav = out_base.with_extension("wav");
        tokio::fs::write(&mp3, &audio).await?;
        let transcode = Self::transcode_to_line_wav(&mp3, &wav).await;
        let _ = tokio::fs::remove_file(&mp3).await;
        transcode?;

        let size = tokio::fs::metadata(&wav).await.map(|m| m.len()).unwrap_or(0);
        if size < MIN_WAV_BYTES {
            return Err(Error::provider("tts", "synthesized file is empty"));
        }
        Ok(wav)
    }

    fn provider_name(&self) -> &str {
        "google-tts"
    }
}

/// Self-hosted neural synthesis service
///
/// `GET <base>/tts?text=...&lang=...` returning 8 kHz mono WAV bytes.
pub struct NeuralTts {
    http: reqwest::Client,
    base_url: String,
}

impl NeuralTts {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl TextToSpeech for NeuralTts {
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
        out_base: &Path,
    ) -> Result<PathBuf> {
        let url = format!("{}/tts", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .query(&[("text", text), ("lang", language.code())])
            .send()
            .await
            .map_err(|e| Error::provider("tts", e))?;
        if !response.status().is_success() {
            return Err(Error::provider(
                "tts",
                format!("HTTP {}", response.status()),
            ));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::provider("tts", e))?;
        if (bytes.len() as u64) < MIN_WAV_BYTES {
            return Err(Error::provider("tts", "synthesized file is empty"));
        }
        let wav = out_base.with_extension("wav");
        tokio::fs::write(&wav, &bytes).await?;
        Ok(wav)
    }

    fn provider_name(&self) -> &str {
        "neural-tts"
    }
}
