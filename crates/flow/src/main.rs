//! Per-call entrypoint
//!
//! The telephony host spawns one process per inbound call and hands it the
//! AGI environment over stdio. The process loads the exchange table, builds
//! the provider set for the dialed extension, runs the call to a terminal
//! outcome and exits.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::BufReader;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;

use taxi_agent_config::{ExchangeConfig, ExchangeTable, TtsProvider};
use taxi_agent_core::{Error, Result, TextToSpeech};
use taxi_agent_dispatch::DispatchClient;
use taxi_agent_flow::{CallSession, Orchestrator, Providers};
use taxi_agent_geo::{GeoBackend, GeoPolicy, GeoResolver};
use taxi_agent_speech::{DateRecognizerClient, GoogleStt, GoogleTts, NeuralTts};
use taxi_agent_telemetry::{HttpTelemetrySink, NullSink};
use taxi_agent_telephony::AgiChannel;

const CONFIG_ENV: &str = "TAXI_AGENT_CONFIG";
const DATA_ROOT_ENV: &str = "TAXI_AGENT_DATA_ROOT";

const DEFAULT_CONFIG: &str = "/etc/taxi-agent/exchanges.toml";
const DEFAULT_DATA_ROOT: &str = "/var/lib/taxi-agent/calls";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "call handler exited with error");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config_path =
        std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let data_root = PathBuf::from(
        std::env::var(DATA_ROOT_ENV).unwrap_or_else(|_| DEFAULT_DATA_ROOT.to_string()),
    );

    let table = ExchangeTable::load(&config_path)
        .map_err(|e| Error::Config(format!("{config_path}: {e}")))?;

    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    let mut channel = AgiChannel::accept(reader, writer).await?;

    let extension = channel.env().extension().to_string();
    let cfg = table
        .get(&extension)
        .map_err(|e| Error::Config(e.to_string()))?
        .clone();
    cfg.validate().map_err(|e| Error::Config(e.to_string()))?;

    let call_id = match channel.env().unique_id() {
        "" | "unknown" => uuid::Uuid::new_v4().to_string(),
        id => id.to_string(),
    };
    let caller = channel.env().caller_number().to_string();

    // The call directory is keyed by the dialed extension, matching what
    // the webhook receiver is provisioned with.
    let mut session = CallSession::new(
        &data_root,
        extension.clone(),
        caller,
        call_id,
        cfg.default_language,
    );
    session.ensure_dirs().await?;

    let providers = build_providers(&cfg)?;
    let orchestrator = Orchestrator::new(cfg, providers);

    let span = tracing::info_span!(
        "call",
        call_id = %session.call_id,
        exchange = %session.exchange,
        caller = %session.caller_phone,
    );
    let outcome = orchestrator
        .run(&mut channel, &mut session)
        .instrument(span)
        .await;
    tracing::info!(
        call_id = %session.call_id,
        outcome = %outcome,
        reason = session.outcome_reason().unwrap_or(""),
        "call handler done"
    );
    Ok(())
}

fn build_providers(cfg: &ExchangeConfig) -> Result<Providers> {
    let http = reqwest::Client::new();

    let tts: Arc<dyn TextToSpeech> = match cfg.tts_provider {
        TtsProvider::Google => Arc::new(GoogleTts::new(http.clone(), cfg.google_api_key.clone())),
        TtsProvider::Neural => {
            let url = cfg.neural_tts_url.clone().ok_or_else(|| {
                Error::Config("tts_provider = \"neural\" requires neural_tts_url".into())
            })?;
            Arc::new(NeuralTts::new(http.clone(), url))
        }
    };

    let policy = GeoPolicy {
        api_key: cfg.google_api_key.clone(),
        backend: match cfg.geocoding_api {
            taxi_agent_config::GeocodingApi::Geocode => GeoBackend::Geocode,
            taxi_agent_config::GeocodingApi::Places => GeoBackend::Places,
        },
        strict_dropoff: cfg.strict_dropoff,
        airport_shortcut: cfg.name.eq_ignore_ascii_case("cosmos"),
        pickup_bounds: cfg.bounds_for(taxi_agent_core::LocationKind::Pickup),
        dropoff_bounds: cfg.bounds_for(taxi_agent_core::LocationKind::Dropoff),
        pickup_bias: cfg.bias_for(taxi_agent_core::LocationKind::Pickup),
        dropoff_bias: cfg.bias_for(taxi_agent_core::LocationKind::Dropoff),
    };

    let telemetry: Arc<dyn taxi_agent_core::TelemetrySink> = match &cfg.telemetry_url {
        Some(url) => Arc::new(HttpTelemetrySink::new(http.clone(), url.clone())),
        None => Arc::new(NullSink),
    };

    Ok(Providers {
        stt: Arc::new(GoogleStt::new(http.clone(), cfg.google_api_key.clone())),
        tts,
        geocoder: Arc::new(GeoResolver::new(http.clone(), policy)),
        dates: Arc::new(DateRecognizerClient::new(
            http.clone(),
            cfg.date_recognizer_url.clone(),
            cfg.google_api_key.clone(),
        )),
        dispatch: Arc::new(DispatchClient::new(
            http,
            cfg.register_base_url.clone(),
            cfg.client_token.clone(),
        )),
        telemetry,
    })
}
