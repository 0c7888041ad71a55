//! Telemetry ingestion pipeline (application-level orchestration).
//!
//! For every record of a batch, strictly in input order:
//!
//! ```text
//! record
//!   ↓
//! 1. Resolve vehicle id (default "unknown")
//!   ↓
//! 2. Serialize and put into the vehicle table (unconditional overwrite)
//!   ↓
//! 3. If `anomaly == true`, publish one alert to the topic
//! ```
//!
//! Each record produces an explicit [`RecordOutcome`] or [`RecordFailure`].
//! What happens after a failure is decided by [`FailurePolicy`]:
//!
//! - `FailFast` stops at the failing record and returns
//!   [`IngestError::RecordFailed`]. Records before it stay written.
//! - `Isolate` logs the failure, carries on, and still reports `Processed`.
//!
//! A failed store call means no alert is attempted for that record.
//!
//! This module contains no IO itself; it composes the injected store and topic.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

use fleetguard_core::{
    AlertNotification, DomainError, StoredItem, TelemetryBatch, TelemetryRecord, VehicleId,
};
use fleetguard_events::Topic;

use crate::config::FailurePolicy;
use crate::item_store::ItemStore;

/// Invocation result status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestStatus {
    Processed,
}

/// Body returned to the caller of a successful invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub status: IngestStatus,
}

impl IngestResponse {
    pub fn processed() -> Self {
        Self {
            status: IngestStatus::Processed,
        }
    }
}

/// Which side effect of a record failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Serialize,
    Store,
    Publish,
}

impl core::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Serialize => f.write_str("serialize"),
            Self::Store => f.write_str("store"),
            Self::Publish => f.write_str("publish"),
        }
    }
}

/// A record whose store/publish pair completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub index: usize,
    pub vehicle_id: VehicleId,
    pub alerted: bool,
}

/// A record whose store/publish pair did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record {index} (vehicle {vehicle_id}) failed at {stage}: {message}")]
pub struct RecordFailure {
    pub index: usize,
    pub vehicle_id: VehicleId,
    pub stage: FailureStage,
    pub message: String,
}

/// Per-record results of one batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    results: Vec<Result<RecordOutcome, RecordFailure>>,
}

impl BatchReport {
    pub fn push(&mut self, result: Result<RecordOutcome, RecordFailure>) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[Result<RecordOutcome, RecordFailure>] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Records whose store and publish steps both completed.
    pub fn completed(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    /// Records that were written, including those whose alert then failed.
    pub fn stored(&self) -> usize {
        self.results
            .iter()
            .filter(|r| match r {
                Ok(_) => true,
                Err(failure) => failure.stage == FailureStage::Publish,
            })
            .count()
    }

    pub fn alerts(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r, Ok(o) if o.alerted))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &RecordFailure> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// The trigger event has no usable `records` list.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// Fail-fast policy: a record failed and the rest of the batch was skipped.
    #[error("{failure} ({processed} record(s) processed before it)")]
    RecordFailed {
        failure: RecordFailure,
        processed: usize,
    },
}

impl From<DomainError> for IngestError {
    fn from(value: DomainError) -> Self {
        IngestError::MalformedEvent(value.to_string())
    }
}

/// Object-safe entry point used by hosting runtimes.
pub trait EventHandler: Send + Sync {
    fn handle_event(&self, event: &JsonValue) -> Result<IngestResponse, IngestError>;
}

/// Writes telemetry to the vehicle table and raises anomaly alerts.
///
/// Store and topic are injected; the handler keeps no state between
/// invocations.
#[derive(Debug)]
pub struct IngestionHandler<S, T> {
    store: S,
    topic: T,
    policy: FailurePolicy,
}

impl<S, T> IngestionHandler<S, T> {
    pub fn new(store: S, topic: T) -> Self {
        Self {
            store,
            topic,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn topic(&self) -> &T {
        &self.topic
    }

    pub fn into_parts(self) -> (S, T) {
        (self.store, self.topic)
    }
}

impl<S, T> IngestionHandler<S, T>
where
    S: ItemStore,
    T: Topic<AlertNotification>,
{
    /// Parse the trigger event and process its batch.
    pub fn handle(&self, event: &JsonValue) -> Result<IngestResponse, IngestError> {
        let batch = TelemetryBatch::from_event(event)?;
        self.process_batch(&batch)?;
        Ok(IngestResponse::processed())
    }

    /// Process every record in order, applying the failure policy.
    pub fn process_batch(&self, batch: &TelemetryBatch) -> Result<BatchReport, IngestError> {
        let span = info_span!(
            "ingest_batch",
            records = batch.len(),
            table = %self.store.table_name(),
            topic = %self.topic.name(),
            policy = %self.policy,
        );
        let _guard = span.enter();

        let mut report = BatchReport::default();

        for (index, record) in batch.iter().enumerate() {
            match self.process_record(index, record) {
                Ok(outcome) => report.push(Ok(outcome)),
                Err(failure) => match self.policy {
                    FailurePolicy::FailFast => {
                        warn!(%failure, "aborting batch");
                        return Err(IngestError::RecordFailed {
                            failure,
                            processed: report.stored(),
                        });
                    }
                    FailurePolicy::Isolate => {
                        warn!(%failure, "record failed; continuing");
                        report.push(Err(failure));
                    }
                },
            }
        }

        info!(
            stored = report.stored(),
            completed = report.completed(),
            alerts = report.alerts(),
            failed = report.failures().count(),
            "batch processed"
        );
        Ok(report)
    }

    /// Store one record and, if it is anomalous, publish its alert.
    pub fn process_record(
        &self,
        index: usize,
        record: &TelemetryRecord,
    ) -> Result<RecordOutcome, RecordFailure> {
        let vehicle_id = record.vehicle_id();
        let fail = |stage: FailureStage, message: String| RecordFailure {
            index,
            vehicle_id: vehicle_id.clone(),
            stage,
            message,
        };

        let item = StoredItem::from_record(record)
            .map_err(|e| fail(FailureStage::Serialize, e.to_string()))?;

        self.store
            .put_item(item)
            .map_err(|e| fail(FailureStage::Store, e.to_string()))?;
        debug!(index, vehicle_id = %vehicle_id, "record stored");

        let alerted = record.is_anomalous();
        if alerted {
            self.topic
                .publish(AlertNotification::anomaly_detected(vehicle_id.clone()))
                .map_err(|e| fail(FailureStage::Publish, e.to_string()))?;
            info!(index, vehicle_id = %vehicle_id, "anomaly alert published");
        }

        Ok(RecordOutcome {
            index,
            vehicle_id,
            alerted,
        })
    }
}

impl<S, T> EventHandler for IngestionHandler<S, T>
where
    S: ItemStore,
    T: Topic<AlertNotification>,
{
    fn handle_event(&self, event: &JsonValue) -> Result<IngestResponse, IngestError> {
        self.handle(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use fleetguard_events::{InMemoryTopic, Subscription};

    use crate::item_store::{InMemoryItemStore, StoreError};

    type Handler = IngestionHandler<Arc<InMemoryItemStore>, Arc<InMemoryTopic<AlertNotification>>>;

    fn setup() -> (Handler, Arc<InMemoryItemStore>, Subscription<AlertNotification>) {
        let store = Arc::new(InMemoryItemStore::new("vehicles"));
        let topic = Arc::new(InMemoryTopic::new("alerts"));
        let alerts = topic.subscribe();
        (IngestionHandler::new(store.clone(), topic), store, alerts)
    }

    /// Store that fails the n-th put (0-based) and delegates otherwise.
    struct FlakyStore {
        inner: InMemoryItemStore,
        fail_on: usize,
        calls: AtomicUsize,
    }

    impl ItemStore for FlakyStore {
        fn table_name(&self) -> &str {
            self.inner.table_name()
        }

        fn put_item(&self, item: StoredItem) -> Result<(), StoreError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_on {
                return Err(StoreError::Backend("connection reset".into()));
            }
            self.inner.put_item(item)
        }

        fn get_item(&self, vehicle_id: &VehicleId) -> Result<Option<StoredItem>, StoreError> {
            self.inner.get_item(vehicle_id)
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("topic unavailable")]
    struct Unavailable;

    /// Topic that rejects every publish.
    struct DownTopic;

    impl Topic<AlertNotification> for DownTopic {
        type Error = Unavailable;

        fn name(&self) -> &str {
            "alerts"
        }

        fn publish(&self, _message: AlertNotification) -> Result<(), Self::Error> {
            Err(Unavailable)
        }

        fn subscribe(&self) -> Subscription<AlertNotification> {
            let (_tx, rx) = std::sync::mpsc::channel();
            Subscription::new(rx)
        }
    }

    fn flaky(fail_on: usize) -> FlakyStore {
        FlakyStore {
            inner: InMemoryItemStore::new("vehicles"),
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn single_anomalous_record() {
        let (handler, store, alerts) = setup();

        let response = handler
            .handle(&json!({"records": [{"vehicleId": "V1", "anomaly": true, "speed": 80}]}))
            .unwrap();

        assert_eq!(serde_json::to_value(response).unwrap(), json!({"status": "Processed"}));
        assert_eq!(store.put_count(), 1);

        let item = store.get_item(&VehicleId::from("V1")).unwrap().unwrap();
        assert_eq!(item.data, r#"{"vehicleId":"V1","anomaly":true,"speed":80}"#);

        let sent = alerts.drain();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].vehicle_id.as_str(), "V1");
        assert!(sent[0].message.contains("V1"));
    }

    #[test]
    fn empty_and_absent_batches() {
        let (handler, store, alerts) = setup();

        for event in [json!({"records": []}), json!({}), json!({"records": null})] {
            assert_eq!(handler.handle(&event).unwrap(), IngestResponse::processed());
        }

        assert_eq!(store.put_count(), 0);
        assert!(alerts.drain().is_empty());
    }

    #[test]
    fn missing_fields_degrade_to_defaults() {
        let (handler, store, alerts) = setup();

        handler
            .handle(&json!({"records": [{"speed": 10}, {"vehicleId": "V2"}]}))
            .unwrap();

        assert_eq!(store.put_count(), 2);
        let unknown = store.get_item(&VehicleId::unknown()).unwrap().unwrap();
        assert_eq!(unknown.data, r#"{"speed":10}"#);
        assert!(alerts.drain().is_empty());
    }

    #[test]
    fn last_write_wins_within_batch() {
        let (handler, store, _alerts) = setup();

        handler
            .handle(&json!({"records": [
                {"vehicleId": "V1", "speed": 10},
                {"vehicleId": "V1", "speed": 20}
            ]}))
            .unwrap();

        assert_eq!(store.put_count(), 2);
        assert_eq!(store.len(), 1);
        let item = store.get_item(&VehicleId::from("V1")).unwrap().unwrap();
        assert_eq!(item.data, r#"{"vehicleId":"V1","speed":20}"#);
    }

    #[test]
    fn one_alert_per_anomalous_record() {
        let (handler, _store, alerts) = setup();

        let report = handler
            .process_batch(&TelemetryBatch::from_event(&json!({"records": [
                {"vehicleId": "V1", "anomaly": true},
                {"vehicleId": "V1", "anomaly": true},
                {"vehicleId": "V2", "anomaly": false},
                {"vehicleId": "V3"}
            ]})).unwrap())
            .unwrap();

        assert_eq!(report.stored(), 4);
        assert_eq!(report.alerts(), 2);
        let sent = alerts.drain();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|a| a.vehicle_id.as_str() == "V1"));
    }

    #[test]
    fn malformed_event_is_rejected_without_side_effects() {
        let (handler, store, _alerts) = setup();
        let err = handler.handle(&json!({"records": {"vehicleId": "V1"}})).unwrap_err();
        assert!(matches!(err, IngestError::MalformedEvent(_)));
        assert_eq!(store.put_count(), 0);
    }

    #[test]
    fn fail_fast_stops_at_first_failure() {
        let topic: Arc<InMemoryTopic<AlertNotification>> = Arc::new(InMemoryTopic::new("alerts"));
        let handler = IngestionHandler::new(flaky(1), topic.clone());

        let err = handler
            .handle(&json!({"records": [
                {"vehicleId": "A", "anomaly": true},
                {"vehicleId": "B", "anomaly": true},
                {"vehicleId": "C", "anomaly": true}
            ]}))
            .unwrap_err();

        match err {
            IngestError::RecordFailed { failure, processed } => {
                assert_eq!(processed, 1);
                assert_eq!(failure.index, 1);
                assert_eq!(failure.vehicle_id.as_str(), "B");
                assert_eq!(failure.stage, FailureStage::Store);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Only A was written and alerted; B never alerted, C never attempted.
        assert_eq!(handler.store().inner.put_count(), 1);
        assert_eq!(topic.published_count(), 1);
    }

    #[test]
    fn isolate_continues_past_failures() {
        let topic: Arc<InMemoryTopic<AlertNotification>> = Arc::new(InMemoryTopic::new("alerts"));
        let handler =
            IngestionHandler::new(flaky(0), topic.clone()).with_policy(FailurePolicy::Isolate);

        let report = handler
            .process_batch(&TelemetryBatch::from_event(&json!({"records": [
                {"vehicleId": "A", "anomaly": true},
                {"vehicleId": "B", "anomaly": true}
            ]})).unwrap())
            .unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report.stored(), 1);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].vehicle_id.as_str(), "A");
        assert_eq!(topic.published_count(), 1);

        // Still reported as processed to the caller.
        assert_eq!(
            handler.handle(&json!({"records": [{"vehicleId": "C"}]})).unwrap(),
            IngestResponse::processed()
        );
    }

    #[test]
    fn publish_failure_keeps_the_stored_item() {
        let store = Arc::new(InMemoryItemStore::new("vehicles"));
        let handler = IngestionHandler::new(store.clone(), DownTopic);

        let err = handler
            .handle(&json!({"records": [{"vehicleId": "V9", "anomaly": true}]}))
            .unwrap_err();

        assert!(matches!(
            err,
            IngestError::RecordFailed { ref failure, processed: 0 }
                if failure.stage == FailureStage::Publish
        ));
        assert!(store.get_item(&VehicleId::from("V9")).unwrap().is_some());
    }

    #[test]
    fn isolate_counts_items_written_before_a_failed_alert() {
        let store = Arc::new(InMemoryItemStore::new("vehicles"));
        let handler =
            IngestionHandler::new(store.clone(), DownTopic).with_policy(FailurePolicy::Isolate);

        let report = handler
            .process_batch(&TelemetryBatch::from_event(&json!({"records": [
                {"vehicleId": "A", "anomaly": true},
                {"vehicleId": "B"}
            ]})).unwrap())
            .unwrap();

        assert_eq!(store.put_count(), 2);
        assert_eq!(report.stored(), 2);
        assert_eq!(report.completed(), 1);
        assert_eq!(report.alerts(), 0);

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].vehicle_id.as_str(), "A");
        assert_eq!(failures[0].stage, FailureStage::Publish);
    }

    #[test]
    fn usable_as_trait_object() {
        let (handler, store, _alerts) = setup();
        let handler: Arc<dyn EventHandler> = Arc::new(handler);

        handler.handle_event(&json!({"records": [{"vehicleId": "X"}]})).unwrap();
        assert_eq!(store.put_count(), 1);
    }
}
