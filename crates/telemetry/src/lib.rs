//! Call-record delivery sinks
//!
//! The analytics store keeps one row per call, created at session start and
//! overwritten on every update. Delivery runs on detached tasks so a slow or
//! dead store never stalls the call; a lost record is a log line, nothing
//! more.

use std::sync::Arc;

use parking_lot::Mutex;
use taxi_agent_core::{CallRecord, TelemetrySink};

/// HTTP sink posting to the analytics receiver
///
/// `POST <base>?endpoint=call` creates the row, `PUT` replaces it. Records
/// are keyed by `call_id` on the receiving side.
pub struct HttpTelemetrySink {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTelemetrySink {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn deliver(&self, record: CallRecord, update: bool) {
        let http = self.http.clone();
        let url = format!("{}?endpoint=call", self.base_url);
        tokio::spawn(async move {
            let request = if update {
                http.put(&url)
            } else {
                http.post(&url)
            };
            match request.json(&record).send().await {
                Ok(r) if r.status().is_success() => {}
                Ok(r) => {
                    tracing::warn!(call_id = %record.call_id, status = %r.status(), "telemetry store refused record");
                }
                Err(e) => {
                    tracing::warn!(call_id = %record.call_id, error = %e, "telemetry delivery failed");
                }
            }
        });
    }
}

impl TelemetrySink for HttpTelemetrySink {
    fn create(&self, record: CallRecord) {
        self.deliver(record, false);
    }

    fn update(&self, record: CallRecord) {
        self.deliver(record, true);
    }
}

/// Sink for exchanges that run without an analytics store
#[derive(Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn create(&self, _record: CallRecord) {}
    fn update(&self, _record: CallRecord) {}
}

/// In-memory capture sink for tests
#[derive(Default, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<CallRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records received so far, creates and updates alike, in order
    pub fn records(&self) -> Vec<CallRecord> {
        self.records.lock().clone()
    }

    pub fn last(&self) -> Option<CallRecord> {
        self.records.lock().last().cloned()
    }
}

impl TelemetrySink for MemorySink {
    fn create(&self, record: CallRecord) {
        self.records.lock().push(record);
    }

    fn update(&self, record: CallRecord) {
        self.records.lock().push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use taxi_agent_core::{CallOutcome, Language};
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record() -> CallRecord {
        CallRecord::new("call-1", "4039", "6971234567", Language::Greek)
    }

    #[tokio::test]
    async fn create_posts_and_update_puts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("endpoint", "call"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(query_param("endpoint", "call"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sink = HttpTelemetrySink::new(reqwest::Client::new(), server.uri());
        sink.create(record());
        sink.update(record());

        // Delivery is detached; give the spawned tasks a moment.
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    #[tokio::test]
    async fn dead_store_does_not_block_the_caller() {
        let sink = HttpTelemetrySink::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1/analytics".to_string(),
        );
        let start = std::time::Instant::now();
        sink.create(record());
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn memory_sink_captures_in_order() {
        let sink = MemorySink::new();
        sink.create(record());
        let mut updated = record();
        updated.outcome = CallOutcome::Hangup;
        sink.update(updated);

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].outcome, CallOutcome::Hangup);
    }
}
