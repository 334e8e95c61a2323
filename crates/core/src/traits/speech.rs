//! Speech and date-recognition provider traits

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::language::Language;
use crate::reservation::ReservationCandidate;

/// Speech-to-Text interface
///
/// Provider failure is non-fatal by contract: implementations return an
/// empty transcript (and log) rather than erroring, so the collection loop
/// treats it like silence and re-prompts.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe a recorded channel-encoding WAV file
    async fn transcribe(&self, wav: &Path, language: Language) -> Result<String>;

    /// Provider name for logging and telemetry
    fn provider_name(&self) -> &str;
}

/// Text-to-Speech interface
///
/// Implementations:
/// - `GoogleTts` - cloud synthesis, transcoded to the channel encoding
/// - `NeuralTts` - self-hosted neural engine returning channel-ready audio
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize `text` into `<out_base>.wav` (8 kHz mono, line-ready).
    /// Returns the written path.
    async fn synthesize(&self, text: &str, language: Language, out_base: &Path)
        -> Result<PathBuf>;

    /// Provider name for logging and telemetry
    fn provider_name(&self) -> &str;
}

/// Date/time utterance recognizer
#[async_trait]
pub trait DateTimeRecognizer: Send + Sync {
    /// Recognize absolute timestamps in a transcribed utterance.
    /// An unparseable utterance yields an empty candidate, not an error.
    async fn recognize(&self, utterance: &str, language: Language)
        -> Result<ReservationCandidate>;
}
