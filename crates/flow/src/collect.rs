//! Bounded per-field collection loops
//!
//! Each field runs the same shape: liveness probe, prompt, bounded
//! recording, transcription, field-specific validation. Empty transcripts
//! get the "not understood" prompt, failed validation the "invalid" one.
//! Budget exhaustion is reported upward as a soft failure; the orchestrator
//! turns it into an operator transfer, never a disconnect.

use std::time::Instant;

use taxi_agent_core::{
    DateTimeRecognizer, Error, Geocoder, LocationKind, ReservationDecision, ResolvedAddress,
    Result, SpeechToText, TextToSpeech, TimeMatch,
};
use taxi_agent_telephony::CallChannel;

use crate::messages::{self, Prompt, Prompts};
use crate::session::CallSession;

/// Recording cap per take
pub const RECORD_MAX_MS: u32 = 10_000;
/// DTMF read timeout
pub const DIGIT_TIMEOUT_SECS: u32 = 10;

/// Result of one field's bounded loop
#[derive(Debug, PartialEq)]
pub enum Collected<T> {
    Value(T),
    /// Retry budget spent; escalate, do not disconnect
    Exhausted,
}

/// Borrowed provider set the collection loops run against
pub struct CollectDeps<'a> {
    pub stt: &'a dyn SpeechToText,
    pub tts: &'a dyn TextToSpeech,
    pub geocoder: &'a dyn Geocoder,
    pub dates: &'a dyn DateTimeRecognizer,
    pub prompts: &'a Prompts,
    pub max_retries: u32,
}

/// Synthesize and play one dynamic utterance. Synthesis failure is
/// non-fatal: the turn is skipped and the flow continues. The synthesis
/// round-trip is masked with hold music so the line never goes silent.
pub async fn speak(
    ch: &mut dyn CallChannel,
    session: &mut CallSession,
    tts: &dyn TextToSpeech,
    text: &str,
) -> Result<()> {
    let base = session.next_prompt_path();
    ch.start_hold_music().await?;
    let started = Instant::now();
    let synthesized = tts.synthesize(text, session.language, &base).await;
    session.stats.record_tts(started.elapsed().as_millis() as u64);
    ch.stop_hold_music().await?;
    match synthesized {
        Ok(_) => ch.play(&base.to_string_lossy()).await,
        Err(e) => {
            tracing::warn!(error = %e, "synthesis failed, skipping utterance");
            Ok(())
        }
    }
}

/// Synthesize an utterance and read one DTMF digit behind it. On synthesis
/// failure the read still runs, promptless.
pub async fn speak_and_read(
    ch: &mut dyn CallChannel,
    session: &mut CallSession,
    tts: &dyn TextToSpeech,
    text: &str,
) -> Result<String> {
    let base = session.next_prompt_path();
    ch.start_hold_music().await?;
    let started = Instant::now();
    let synthesized = tts.synthesize(text, session.language, &base).await;
    session.stats.record_tts(started.elapsed().as_millis() as u64);
    ch.stop_hold_music().await?;
    let prompt = match synthesized {
        Ok(_) => base.to_string_lossy().into_owned(),
        Err(e) => {
            tracing::warn!(error = %e, "synthesis failed, reading without prompt");
            String::new()
        }
    };
    ch.read_dtmf(&prompt, 1, DIGIT_TIMEOUT_SECS).await
}

/// One probe-prompt-record-transcribe turn for a named field
async fn take_transcript(
    ch: &mut dyn CallChannel,
    session: &mut CallSession,
    deps: &CollectDeps<'_>,
    prompt: Prompt,
    field: &str,
    attempt: u32,
) -> Result<String> {
    if !ch.channel_alive().await? {
        return Err(Error::Hangup);
    }
    ch.play(&deps.prompts.path(session.language, prompt)).await?;
    let base = session.recording_path(field, attempt);
    ch.record(&base.to_string_lossy(), RECORD_MAX_MS).await?;

    let wav = base.with_extension("wav");
    ch.start_hold_music().await?;
    let started = Instant::now();
    let transcribed = deps.stt.transcribe(&wav, session.language).await;
    session.stats.record_stt(started.elapsed().as_millis() as u64);
    ch.stop_hold_music().await?;
    let transcript = match transcribed {
        Ok(t) => t,
        Err(e) if e.is_hangup() => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, field, "transcription failed, treating as silence");
            String::new()
        }
    };
    Ok(transcript.trim().to_string())
}

pub async fn collect_name(
    ch: &mut dyn CallChannel,
    session: &mut CallSession,
    deps: &CollectDeps<'_>,
) -> Result<Collected<String>> {
    for _ in 0..deps.max_retries {
        session.name_attempts += 1;
        let attempt = session.name_attempts;
        let transcript =
            take_transcript(ch, session, deps, Prompt::AskName, "name", attempt).await?;
        if transcript.is_empty() {
            ch.play(&deps.prompts.path(session.language, Prompt::NotUnderstood))
                .await?;
            continue;
        }
        if transcript.chars().count() > 1 {
            return Ok(Collected::Value(transcript));
        }
        ch.play(&deps.prompts.path(session.language, Prompt::Invalid))
            .await?;
    }
    Ok(Collected::Exhausted)
}

pub async fn collect_location(
    ch: &mut dyn CallChannel,
    session: &mut CallSession,
    deps: &CollectDeps<'_>,
    kind: LocationKind,
) -> Result<Collected<ResolvedAddress>> {
    let (prompt, field) = match kind {
        LocationKind::Pickup => (Prompt::AskPickup, "pickup"),
        LocationKind::Dropoff => (Prompt::AskDestination, "destination"),
    };
    for _ in 0..deps.max_retries {
        let attempt = match kind {
            LocationKind::Pickup => {
                session.pickup_attempts += 1;
                session.pickup_attempts
            }
            LocationKind::Dropoff => {
                session.destination_attempts += 1;
                session.destination_attempts
            }
        };
        let transcript = take_transcript(ch, session, deps, prompt, field, attempt).await?;
        if transcript.is_empty() {
            ch.play(&deps.prompts.path(session.language, Prompt::NotUnderstood))
                .await?;
            continue;
        }
        if transcript.chars().count() > 2 {
            ch.start_hold_music().await?;
            let started = Instant::now();
            let resolved = deps
                .geocoder
                .resolve(&transcript, kind, session.language)
                .await;
            session
                .stats
                .record_geocode(started.elapsed().as_millis() as u64);
            ch.stop_hold_music().await?;
            if let Some(resolved) = resolved? {
                return Ok(Collected::Value(resolved));
            }
        }
        ch.play(&deps.prompts.path(session.language, Prompt::Invalid))
            .await?;
    }
    Ok(Collected::Exhausted)
}

pub async fn collect_reservation(
    ch: &mut dyn CallChannel,
    session: &mut CallSession,
    deps: &CollectDeps<'_>,
) -> Result<Collected<TimeMatch>> {
    for _ in 0..deps.max_retries {
        session.reservation_attempts += 1;
        let attempt = session.reservation_attempts;
        let transcript = take_transcript(
            ch,
            session,
            deps,
            Prompt::AskReservationTime,
            "reservation",
            attempt,
        )
        .await?;
        if transcript.is_empty() {
            ch.play(&deps.prompts.path(session.language, Prompt::NotUnderstood))
                .await?;
            continue;
        }

        ch.start_hold_music().await?;
        let started = Instant::now();
        let candidate = deps.dates.recognize(&transcript, session.language).await;
        session
            .stats
            .record_date_parse(started.elapsed().as_millis() as u64);
        ch.stop_hold_music().await?;

        match candidate?.decide() {
            ReservationDecision::Confirm(tm) => {
                let text = messages::time_confirm_text(session.language, &tm.text);
                let digit = speak_and_read(ch, session, deps.tts, &text).await?;
                if digit.trim() == "0" {
                    return Ok(Collected::Value(tm));
                }
                // Anything else re-loops for a fresh utterance.
            }
            ReservationDecision::Choose(first, second) => {
                let text =
                    messages::time_choice_text(session.language, &first.text, &second.text);
                let digit = speak_and_read(ch, session, deps.tts, &text).await?;
                match digit.trim() {
                    "1" => return Ok(Collected::Value(first)),
                    "2" => return Ok(Collected::Value(second)),
                    _ => {}
                }
            }
            ReservationDecision::Reject => {
                ch.play(&deps.prompts.path(session.language, Prompt::Invalid))
                    .await?;
            }
        }
    }
    Ok(Collected::Exhausted)
}
