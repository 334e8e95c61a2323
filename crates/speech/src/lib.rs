//! Speech provider clients
//!
//! - [`GoogleStt`] - cloud speech recognition over recorded channel audio
//! - [`GoogleTts`] - cloud synthesis, transcoded to 8 kHz mono for the line
//! - [`NeuralTts`] - self-hosted neural synthesis returning line-ready WAV
//! - [`DateRecognizerClient`] - utterance to reservation-time candidates
//!
//! Recognition and synthesis failures are non-fatal by contract: the
//! collection loop treats them like silence and re-prompts.

pub mod datetime;
pub mod stt;
pub mod tts;

pub use datetime::DateRecognizerClient;
pub use stt::GoogleStt;
pub use tts::{GoogleTts, NeuralTts};
