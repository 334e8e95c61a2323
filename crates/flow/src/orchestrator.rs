//! The per-call state machine
//!
//! Drives one call end to end: init screening, language and intent
//! selection, field collection, confirmation, registration, terminal
//! wrap-up. All session state lives in the passed-in [`CallSession`]; the
//! orchestrator itself is immutable and shared across concurrent calls.

use std::sync::Arc;
use std::time::Instant;

use taxi_agent_config::{CallbackMode, ExchangeConfig};
use taxi_agent_core::{
    BookingRequest, CallOutcome, CallType, CallerProfile, DateTimeRecognizer, DispatchApi, Error,
    Geocoder, LocationKind, Result, SpeechToText, TelemetrySink, TextToSpeech,
};
use taxi_agent_dispatch::{CallbackPoller, PollStep, StatusArtifact};
use taxi_agent_telephony::CallChannel;

use crate::collect::{self, CollectDeps, Collected, DIGIT_TIMEOUT_SECS};
use crate::messages::{self, Prompt, Prompts};
use crate::routing::{self, Intent, RouteAction};
use crate::session::CallSession;

/// Welcome-menu retries before the operator takes over
const MENU_RETRIES: u32 = 3;
/// Confirmation summary replays before the operator takes over
const CONFIRM_LOOPS: u32 = 3;
/// Operator dial timeout
const DIAL_TIMEOUT_SECS: u32 = 60;
/// Fixed callback-mode inter-poll wait; no backoff, the caller holds the
/// line throughout
const POLL_INTERVAL_SECS: u32 = 5;

/// Shared provider set, one per exchange
pub struct Providers {
    pub stt: Arc<dyn SpeechToText>,
    pub tts: Arc<dyn TextToSpeech>,
    pub geocoder: Arc<dyn Geocoder>,
    pub dates: Arc<dyn DateTimeRecognizer>,
    pub dispatch: Arc<dyn DispatchApi>,
    pub telemetry: Arc<dyn TelemetrySink>,
}

pub struct Orchestrator {
    cfg: ExchangeConfig,
    providers: Providers,
    prompts: Prompts,
}

impl Orchestrator {
    pub fn new(cfg: ExchangeConfig, providers: Providers) -> Self {
        let prompts = Prompts::new(cfg.sound_path.clone());
        Self {
            cfg,
            providers,
            prompts,
        }
    }

    /// Run one call to its terminal outcome. Never panics the session: a
    /// hangup finalizes once and exits, any other error finalizes as
    /// `Error` and still hands the caller to the operator line.
    pub async fn run(&self, ch: &mut dyn CallChannel, session: &mut CallSession) -> CallOutcome {
        self.providers.telemetry.create(session.snapshot());

        match self.run_inner(ch, session).await {
            Ok(()) => {
                if !session.is_finalized() {
                    session.finalize(CallOutcome::Error, "flow ended without a terminal outcome");
                }
            }
            Err(e) if e.is_hangup() => {
                session.finalize(CallOutcome::Hangup, "caller hung up");
            }
            Err(e) => {
                session.finalize(CallOutcome::Error, e.to_string());
                tracing::error!(call_id = %session.call_id, error = %e, "call flow failed");
                // The caller, if still there, goes to a human.
                let _ = ch
                    .play(&self.prompts.path(session.language, Prompt::TransferOperator))
                    .await;
                let _ = ch.dial(&self.cfg.operator_dial, DIAL_TIMEOUT_SECS).await;
            }
        }

        session.write_progress().await;
        self.providers.telemetry.update(session.snapshot());
        session.outcome()
    }

    async fn run_inner(&self, ch: &mut dyn CallChannel, session: &mut CallSession) -> Result<()> {
        // Init screening: withheld ids never enter the flow.
        if taxi_agent_telephony::is_anonymous_number(&session.caller_phone) {
            session.finalize(CallOutcome::AnonymousBlocked, "withheld caller id");
            ch.play(&self.prompts.path(session.language, Prompt::AnonymousBlocked))
                .await?;
            ch.dial(&self.cfg.operator_dial, DIAL_TIMEOUT_SECS).await?;
            return Ok(());
        }
        if self.cfg.foreign_redirect && routing::is_foreign_number(&session.caller_phone) {
            return self.transfer_to_operator(ch, session, "foreign caller number").await;
        }

        let profile = self.fetch_profile(session).await;
        if profile.do_not_serve {
            session.finalize(CallOutcome::UserBlocked, "caller flagged do-not-serve");
            ch.play(&self.prompts.path(session.language, Prompt::Blocked))
                .await?;
            ch.hangup().await?;
            return Ok(());
        }

        let call_type = match self.select_intent(ch, session).await? {
            Some(call_type) => call_type,
            // Menu retries spent or caller asked for a human.
            None => return Ok(()),
        };
        session.call_type = call_type;
        if call_type == CallType::Operator {
            return self.transfer_to_operator(ch, session, "caller chose operator").await;
        }
        self.sync(session).await;

        let deps = CollectDeps {
            stt: &*self.providers.stt,
            tts: &*self.providers.tts,
            geocoder: &*self.providers.geocoder,
            dates: &*self.providers.dates,
            prompts: &self.prompts,
            max_retries: self.cfg.max_retries,
        };

        if self.cfg.ask_for_name {
            if let Some(name) = profile.name.clone() {
                session.name = Some(name);
            } else {
                match collect::collect_name(ch, session, &deps).await? {
                    Collected::Value(name) => session.name = Some(name),
                    Collected::Exhausted => {
                        return self
                            .transfer_to_operator(ch, session, "Failed to collect name")
                            .await;
                    }
                }
            }
            self.sync(session).await;
        }

        if !self.collect_pickup(ch, session, &deps, &profile).await? {
            return self
                .transfer_to_operator(ch, session, "Failed to collect pickup")
                .await;
        }
        self.sync(session).await;

        match collect::collect_location(ch, session, &deps, LocationKind::Dropoff).await? {
            Collected::Value(destination) => session.destination = Some(destination),
            Collected::Exhausted => {
                return self
                    .transfer_to_operator(ch, session, "Failed to collect destination")
                    .await;
            }
        }
        self.sync(session).await;

        if call_type == CallType::Reservation {
            match collect::collect_reservation(ch, session, &deps).await? {
                Collected::Value(tm) => session.reservation = Some(tm),
                Collected::Exhausted => {
                    return self
                        .transfer_to_operator(ch, session, "Failed to collect reservation time")
                        .await;
                }
            }
            self.sync(session).await;
        }

        if !self.confirm(ch, session, &deps).await? {
            return Ok(());
        }

        self.register(ch, session).await
    }

    async fn fetch_profile(&self, session: &mut CallSession) -> CallerProfile {
        let started = Instant::now();
        let profile = match self.providers.dispatch.caller_profile(&session.caller_phone).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(error = %e, "caller lookup failed, proceeding anonymous");
                CallerProfile::default()
            }
        };
        session
            .stats
            .record_dispatch(started.elapsed().as_millis() as u64);
        profile
    }

    /// Welcome menu: language toggle re-prompts without spending a retry;
    /// empty reads and unknown digits spend one. Returns `None` when the
    /// call was already routed (operator fallback).
    async fn select_intent(
        &self,
        ch: &mut dyn CallChannel,
        session: &mut CallSession,
    ) -> Result<Option<CallType>> {
        if self.cfg.bypass_welcome {
            return Ok(Some(CallType::Immediate));
        }

        ch.play(&self.prompts.path(session.language, Prompt::Welcome))
            .await?;
        let mut retries = 0;
        while retries < MENU_RETRIES {
            let digits = ch
                .read_dtmf(
                    &self.prompts.path(session.language, Prompt::Menu),
                    1,
                    DIGIT_TIMEOUT_SECS,
                )
                .await?;
            match routing::route(Intent::from_digits(&digits), self.cfg.auto_serve_mode) {
                RouteAction::Immediate => return Ok(Some(CallType::Immediate)),
                RouteAction::Reservation => return Ok(Some(CallType::Reservation)),
                RouteAction::Operator => return Ok(Some(CallType::Operator)),
                RouteAction::ToggleLanguage if self.cfg.allow_language_toggle => {
                    session.language = session.language.toggled();
                    tracing::debug!(language = %session.language, "language toggled");
                }
                RouteAction::ToggleLanguage => {
                    retries += 1;
                }
                RouteAction::Reprompt => {
                    retries += 1;
                    if !ch.channel_alive().await? {
                        return Err(Error::Hangup);
                    }
                }
            }
        }
        self.transfer_to_operator(ch, session, "no selection at welcome menu")
            .await?;
        Ok(None)
    }

    /// Pickup via the saved-address shortcut when the profile carries one,
    /// otherwise fresh collection. Returns false on budget exhaustion.
    async fn collect_pickup(
        &self,
        ch: &mut dyn CallChannel,
        session: &mut CallSession,
        deps: &CollectDeps<'_>,
        profile: &CallerProfile,
    ) -> Result<bool> {
        if profile.has_usable_pickup() {
            // has_usable_pickup guarantees both fields.
            if let Some(saved) = profile.saved_pickup.clone() {
                let name = if self.cfg.announce_name {
                    profile.name.as_deref()
                } else {
                    None
                };
                let offer = messages::saved_pickup_text(session.language, name, &saved.address);
                let digit =
                    collect::speak_and_read(ch, session, &*self.providers.tts, &offer).await?;
                if digit.trim() == "0" {
                    session.pickup = Some(saved);
                    return Ok(true);
                }
            }
        }
        match collect::collect_location(ch, session, deps, LocationKind::Pickup).await? {
            Collected::Value(pickup) => {
                session.pickup = Some(pickup);
                Ok(true)
            }
            Collected::Exhausted => Ok(false),
        }
    }

    /// Spoken summary with per-field re-entry. Returns true to proceed to
    /// registration; false when the call was routed to the operator.
    async fn confirm(
        &self,
        ch: &mut dyn CallChannel,
        session: &mut CallSession,
        deps: &CollectDeps<'_>,
    ) -> Result<bool> {
        for _ in 0..CONFIRM_LOOPS {
            let summary = {
                let pickup = session.pickup.as_ref().map(|p| p.address.clone()).unwrap_or_default();
                let destination = session
                    .destination
                    .as_ref()
                    .map(|d| d.address.clone())
                    .unwrap_or_default();
                let reservation = session.reservation.as_ref().map(|r| r.text.clone());
                messages::summary_text(
                    session.language,
                    session.name.as_deref(),
                    &pickup,
                    &destination,
                    reservation.as_deref(),
                )
            };
            let digit = collect::speak_and_read(ch, session, &*self.providers.tts, &summary).await?;

            match digit.trim() {
                "0" => return Ok(true),
                "1" if self.cfg.ask_for_name => {
                    match collect::collect_name(ch, session, deps).await? {
                        Collected::Value(name) => session.name = Some(name),
                        Collected::Exhausted => {
                            self.transfer_to_operator(ch, session, "Failed to collect name")
                                .await?;
                            return Ok(false);
                        }
                    }
                    self.sync(session).await;
                }
                "2" => {
                    match collect::collect_location(ch, session, deps, LocationKind::Pickup).await? {
                        Collected::Value(pickup) => session.pickup = Some(pickup),
                        Collected::Exhausted => {
                            self.transfer_to_operator(ch, session, "Failed to collect pickup")
                                .await?;
                            return Ok(false);
                        }
                    }
                    self.sync(session).await;
                }
                "3" => {
                    match collect::collect_location(ch, session, deps, LocationKind::Dropoff).await?
                    {
                        Collected::Value(destination) => session.destination = Some(destination),
                        Collected::Exhausted => {
                            self.transfer_to_operator(ch, session, "Failed to collect destination")
                                .await?;
                            return Ok(false);
                        }
                    }
                    self.sync(session).await;
                }
                "4" if session.call_type == CallType::Reservation => {
                    match collect::collect_reservation(ch, session, deps).await? {
                        Collected::Value(tm) => session.reservation = Some(tm),
                        Collected::Exhausted => {
                            self.transfer_to_operator(
                                ch,
                                session,
                                "Failed to collect reservation time",
                            )
                            .await?;
                            return Ok(false);
                        }
                    }
                    self.sync(session).await;
                }
                _ => {
                    if !ch.channel_alive().await? {
                        return Err(Error::Hangup);
                    }
                }
            }
        }
        self.transfer_to_operator(ch, session, "confirmation not accepted")
            .await?;
        Ok(false)
    }

    async fn register(&self, ch: &mut dyn CallChannel, session: &mut CallSession) -> Result<()> {
        let (Some(pickup), Some(destination)) = (session.pickup.clone(), session.destination.clone())
        else {
            return Err(Error::Config("registration without collected fields".into()));
        };

        let callback = self.cfg.callback_mode == CallbackMode::Callback;
        // The callback reference tells the webhook receiver which call
        // directory the status artifact belongs to.
        let reference_path = callback.then(|| {
            let call_dir = session.call_dir().to_string_lossy().into_owned();
            match &self.cfg.callback_url {
                Some(url) => format!("{url}?ref={call_dir}"),
                None => call_dir,
            }
        });
        let request = BookingRequest {
            caller_phone: session.caller_phone.clone(),
            customer_name: session.name.clone(),
            pickup_address: pickup.address,
            pickup: pickup.lat_lng,
            destination_address: destination.address,
            destination: destination.lat_lng,
            reservation_ts: session.reservation.as_ref().map(|r| r.timestamp),
            comments: String::new(),
            reference_path,
            days_valid: self.cfg.days_valid,
        };

        ch.play(&self.prompts.path(session.language, Prompt::PleaseWait))
            .await?;
        ch.start_hold_music().await?;
        let started = Instant::now();
        let outcome = self.providers.dispatch.register(&request).await;
        session
            .stats
            .record_dispatch(started.elapsed().as_millis() as u64);
        ch.stop_hold_music().await?;
        let outcome = outcome?;

        if !outcome.accepted {
            collect::speak(ch, session, &*self.providers.tts, &outcome.message).await?;
            return self
                .transfer_to_operator(ch, session, "registration rejected")
                .await;
        }

        if callback {
            self.await_driver(ch, session).await?;
        } else {
            collect::speak(ch, session, &*self.providers.tts, &outcome.message).await?;
            session.finalize(CallOutcome::Success, "booking registered");
        }

        if session.outcome() == CallOutcome::Success {
            ch.play(&self.prompts.path(session.language, Prompt::Goodbye))
                .await?;
            ch.wait(1).await?;
            ch.hangup().await?;
        }
        Ok(())
    }

    /// Callback mode: hold the line, poll the status artifact, announce
    /// changes, stop on a terminal status or budget exhaustion.
    async fn await_driver(
        &self,
        ch: &mut dyn CallChannel,
        session: &mut CallSession,
    ) -> Result<()> {
        let mut poller = CallbackPoller::new(self.cfg.repeat_times);
        ch.start_hold_music().await?;
        loop {
            let artifact = StatusArtifact::read(session.call_dir()).await;
            match poller.observe(artifact) {
                PollStep::Wait => {
                    ch.wait(POLL_INTERVAL_SECS).await?;
                }
                PollStep::Announce(a) | PollStep::Replay(a) => {
                    ch.stop_hold_music().await?;
                    let text = messages::driver_update_text(session.language, &a);
                    collect::speak(ch, session, &*self.providers.tts, &text).await?;
                    ch.start_hold_music().await?;
                    ch.wait(POLL_INTERVAL_SECS).await?;
                }
                PollStep::Abort => {
                    ch.stop_hold_music().await?;
                    let text = messages::no_taxi_text(session.language);
                    collect::speak(ch, session, &*self.providers.tts, &text).await?;
                    return self
                        .transfer_to_operator(ch, session, "no taxi found")
                        .await;
                }
                PollStep::Done(status) => {
                    ch.stop_hold_music().await?;
                    if status.is_cancellation() {
                        let text = messages::cancelled_text(session.language);
                        collect::speak(ch, session, &*self.providers.tts, &text).await?;
                    }
                    session.finalize(
                        CallOutcome::Success,
                        format!("trip reached terminal status {status:?}"),
                    );
                    return Ok(());
                }
                PollStep::Exhausted => {
                    ch.stop_hold_music().await?;
                    session.finalize(
                        CallOutcome::Success,
                        "booking registered, no further status before poll budget",
                    );
                    return Ok(());
                }
            }
        }
    }

    /// Finalize as operator transfer and dial the human line. Safe to call
    /// on an already-finalized session: the first outcome stands.
    async fn transfer_to_operator(
        &self,
        ch: &mut dyn CallChannel,
        session: &mut CallSession,
        reason: &str,
    ) -> Result<()> {
        session.finalize(CallOutcome::OperatorTransfer, reason);
        ch.play(&self.prompts.path(session.language, Prompt::TransferOperator))
            .await?;
        ch.dial(&self.cfg.operator_dial, DIAL_TIMEOUT_SECS).await?;
        Ok(())
    }

    /// Progress snapshot plus telemetry update after a field mutation
    async fn sync(&self, session: &CallSession) {
        session.write_progress().await;
        self.providers.telemetry.update(session.snapshot());
    }
}
