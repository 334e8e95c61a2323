//! Per-session provider counters
//!
//! Recorded for telemetry only; nothing in the call flow branches on these.

use serde::{Deserialize, Serialize};

/// Counters and cumulative timings for one call session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStats {
    pub stt_calls: u32,
    pub stt_ms: u64,
    pub tts_calls: u32,
    pub tts_ms: u64,
    pub geocode_calls: u32,
    pub geocode_ms: u64,
    pub date_parse_calls: u32,
    pub date_parse_ms: u64,
    pub dispatch_calls: u32,
    pub dispatch_ms: u64,
}

impl ProviderStats {
    pub fn record_stt(&mut self, elapsed_ms: u64) {
        self.stt_calls += 1;
        self.stt_ms += elapsed_ms;
    }

    pub fn record_tts(&mut self, elapsed_ms: u64) {
        self.tts_calls += 1;
        self.tts_ms += elapsed_ms;
    }

    pub fn record_geocode(&mut self, elapsed_ms: u64) {
        self.geocode_calls += 1;
        self.geocode_ms += elapsed_ms;
    }

    pub fn record_date_parse(&mut self, elapsed_ms: u64) {
        self.date_parse_calls += 1;
        self.date_parse_ms += elapsed_ms;
    }

    pub fn record_dispatch(&mut self, elapsed_ms: u64) {
        self.dispatch_calls += 1;
        self.dispatch_ms += elapsed_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let mut stats = ProviderStats::default();
        stats.record_stt(120);
        stats.record_stt(80);
        stats.record_tts(40);
        assert_eq!(stats.stt_calls, 2);
        assert_eq!(stats.stt_ms, 200);
        assert_eq!(stats.tts_calls, 1);
        assert_eq!(stats.geocode_calls, 0);
    }
}
