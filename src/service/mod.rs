use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::domain::batch::*;
use crate::domain::rules::RuleCatalog;
use crate::domain::validation::*;
use crate::event_sourcing::core::{Aggregate, EventEnvelope};
use crate::event_sourcing::store::EventStore;
use crate::metrics::Metrics;

pub mod requests;

pub use requests::*;

// ============================================================================
// Provenance Service - Query/Command Interface
// ============================================================================
//
// Command flow:
//   request → malformation check → Validation Engine → command handler
//   (per-batch lock: load → decide → append) → updated batch
//
// Validation never holds a lock. A rejected command leaves the ledger as it
// was. Queries fold the stream under its lock and never see half an event.
//
// ============================================================================

pub struct ProvenanceService {
    config: ServiceConfig,
    engine: ValidationEngine,
    event_store: Arc<EventStore<BatchEvent>>,
    handler: BatchCommandHandler,
    metrics: Arc<Metrics>,
}

fn new_event_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::now_v7())
}

impl ProvenanceService {
    pub fn new(
        config: ServiceConfig,
        catalog: Arc<RuleCatalog>,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        let event_store = Arc::new(EventStore::new("Batch"));
        tracing::info!(
            catalog_version = catalog.version(),
            species = ?catalog.species_names(),
            recollection = %config.recollection,
            rejected_quality = %config.rejected_quality,
            "📒 Provenance ledger ready"
        );

        Ok(Self {
            config,
            engine: ValidationEngine::new(catalog, clock),
            handler: BatchCommandHandler::new(event_store.clone()),
            event_store,
            metrics,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn catalog(&self) -> &RuleCatalog {
        self.engine.catalog()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    pub async fn record_collection(&self, request: RecordCollectionRequest) -> Result<Batch, BatchError> {
        let started = Instant::now();
        let result = self.collect(request).await;
        self.finish(ValidationAction::Collection, started, &result);
        result
    }

    pub async fn record_quality_test(&self, request: RecordQualityTestRequest) -> Result<Batch, BatchError> {
        let started = Instant::now();
        let result = self.test_quality(request).await;
        self.finish(ValidationAction::Quality, started, &result);
        result
    }

    pub async fn record_processing_step(&self, request: RecordProcessingStepRequest) -> Result<Batch, BatchError> {
        let started = Instant::now();
        let result = self.process(request).await;
        self.finish(ValidationAction::Processing, started, &result);
        result
    }

    async fn collect(&self, request: RecordCollectionRequest) -> Result<Batch, BatchError> {
        let timestamp = request.check()?;

        let verdict = self.validate(&ValidationPayload::Collection(CollectionPayload {
            species: request.species.clone(),
            coordinates: request.coordinates,
        }));

        let collection = CollectionEvent {
            id: new_event_id("CE"),
            species: request.species,
            collector_id: request.collector_id,
            coordinates: request.coordinates,
            timestamp,
            location: request.location,
            quantity_kg: request.quantity_kg,
            initial_quality: request.initial_quality,
            photo_refs: request.photo_refs,
            verified: verdict.accepted,
        };
        let actor = collection.collector_id.clone();

        // Admission is unconditional; the verdict only sets `verified`
        let command = BatchCommand::RecordCollection {
            collection,
            sustainability_score: self.config.initial_sustainability_score,
            verdict,
            policy: self.config.recollection,
        };
        let batch = self.dispatch(&request.batch_id, command, &actor).await?;

        tracing::info!(
            batch_id = %batch.id,
            species = %batch.species,
            verified = batch.is_verified(),
            version = batch.version,
            "🌿 Collection recorded"
        );
        Ok(batch)
    }

    async fn test_quality(&self, request: RecordQualityTestRequest) -> Result<Batch, BatchError> {
        let test_date = request.check()?;

        let verdict = self.validate(&ValidationPayload::Quality(QualityPayload {
            results: request.results.clone(),
        }));
        let certified = verdict.accepted && self.engine.certify(&request.results);

        let test = QualityTest {
            id: new_event_id("QT"),
            lab_id: request.lab_id,
            test_date,
            results: request.results,
            certified,
            certificate_ref: request.certificate_ref,
        };
        let actor = test.lab_id.clone();

        let command = BatchCommand::RecordQualityTest {
            test,
            verdict,
            policy: self.config.rejected_quality,
        };
        let batch = self.dispatch(&request.batch_id, command, &actor).await?;

        tracing::info!(
            batch_id = %batch.id,
            certified = certified,
            tests = batch.quality_tests.len(),
            version = batch.version,
            "🧪 Quality test recorded"
        );
        Ok(batch)
    }

    async fn process(&self, request: RecordProcessingStepRequest) -> Result<Batch, BatchError> {
        let timestamp = request.check()?;

        let verdict = self.validate(&ValidationPayload::Processing(ProcessingPayload {
            parameters: request.parameters.clone(),
        }));

        let step = ProcessingStep {
            id: new_event_id("PS"),
            processor_id: request.processor_id,
            step: ProcessingStepKind::parse(&request.step),
            timestamp,
            location: request.location,
            parameters: request.parameters,
        };
        let actor = step.processor_id.clone();

        let command = BatchCommand::RecordProcessingStep { step, verdict };
        let batch = self.dispatch(&request.batch_id, command, &actor).await?;

        tracing::info!(
            batch_id = %batch.id,
            location = %batch.current_location,
            version = batch.version,
            "🏭 Processing step recorded"
        );
        Ok(batch)
    }

    async fn dispatch(&self, batch_id: &str, command: BatchCommand, actor: &str) -> Result<Batch, BatchError> {
        let outcome = self.handler.handle(batch_id, command, Uuid::new_v4(), actor).await?;
        for event_type in &outcome.event_types {
            self.metrics.record_appended(event_type);
        }
        Ok(outcome.batch)
    }

    fn finish(&self, action: ValidationAction, started: Instant, result: &Result<Batch, BatchError>) {
        let outcome = match result {
            Ok(_) => "accepted",
            Err(e) => {
                tracing::warn!(action = %action, kind = e.kind().as_str(), "❌ Command refused: {}", e);
                e.kind().as_str()
            }
        };
        self.metrics.record_command(action.as_str(), outcome, started.elapsed().as_secs_f64());
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    /// Evaluate a proposed event without recording anything
    pub fn validate(&self, payload: &ValidationPayload) -> Verdict {
        let verdict = self.engine.validate(payload);
        if let Some(reason) = &verdict.reason {
            self.metrics.record_rejection(payload.action().as_str(), reason.rule());
        }
        verdict
    }

    pub fn is_valid(&self, payload: &ValidationPayload) -> bool {
        self.validate(payload).accepted
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Current state of a batch. Unknown ids yield `None`.
    pub async fn get_batch(&self, batch_id: &str) -> Option<Batch> {
        match self.event_store.load_aggregate::<BatchAggregate>(batch_id).await {
            Ok(batch) => batch,
            Err(e) => {
                // Imports are replayed before they land, so a stream always folds
                tracing::error!(batch_id = %batch_id, "Failed to replay batch: {}", e);
                None
            }
        }
    }

    /// Batches matching `filter`, ordered by id
    pub async fn list_batches(&self, filter: &BatchFilter) -> Vec<Batch> {
        let mut batches = Vec::new();
        for id in self.event_store.aggregate_ids().await {
            if let Some(batch) = self.get_batch(&id).await {
                if filter.matches(&batch) {
                    batches.push(batch);
                }
            }
        }
        batches
    }

    /// Ordered event history of a batch
    pub async fn history(&self, batch_id: &str) -> Option<Vec<EventEnvelope<BatchEvent>>> {
        let events = self.event_store.load_events(batch_id).await;
        if events.is_empty() {
            return None;
        }
        Some(events)
    }

    // ------------------------------------------------------------------------
    // Segments
    // ------------------------------------------------------------------------

    /// JSON-lines segment of a batch's stream, `None` for unknown ids
    pub async fn export_segment(&self, batch_id: &str) -> Result<Option<String>, BatchError> {
        Ok(self.event_store.export_segment(batch_id).await?)
    }

    /// Replay a segment and, if it folds into a batch, load it into an empty stream
    pub async fn import_segment(&self, segment: &str) -> Result<Batch, BatchError> {
        let events = EventStore::<BatchEvent>::parse_segment(segment)?;
        let batch = BatchAggregate::load_from_events(&events)?.ok_or(BatchError::NotInitialized)?;
        self.check_recorded_outcomes(&events)?;

        let (batch_id, version) = self.event_store.import_events(events).await?;
        tracing::info!(batch_id = %batch_id, version = version, "📥 Segment imported");

        Ok(batch)
    }

    /// Recorded flags in an imported stream must agree with this ledger's catalog.
    /// Seasonality is not re-checked: it depended on the clock at record time.
    fn check_recorded_outcomes(&self, events: &[EventEnvelope<BatchEvent>]) -> Result<(), BatchError> {
        let quality = self.engine.catalog().quality();

        for envelope in events {
            let seq = envelope.sequence_number;
            match &envelope.event_data {
                BatchEvent::Collected(e) => {
                    let c = &e.collection;
                    if c.verified != e.verdict.accepted {
                        return Err(BatchError::malformed(format!(
                            "event {}: verified flag disagrees with its verdict", seq
                        )));
                    }
                    if c.verified && geo_fencing(self.engine.catalog(), &c.coordinates, &c.species).is_err() {
                        return Err(BatchError::malformed(format!(
                            "event {}: verified collection lies outside the {} zone", seq, c.species
                        )));
                    }
                }
                BatchEvent::QualityTested(e) => {
                    let accepted = quality_gate(quality, &e.test.results).is_ok();
                    if e.verdict.accepted != accepted {
                        return Err(BatchError::malformed(format!(
                            "event {}: quality verdict disagrees with the catalog thresholds", seq
                        )));
                    }
                    if e.test.certified != (accepted && certify(quality, &e.test.results)) {
                        return Err(BatchError::malformed(format!(
                            "event {}: certified flag disagrees with the test results", seq
                        )));
                    }
                }
                BatchEvent::ProcessingRecorded(_) => {}
            }
        }
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Service whose clock sits in November (Ashwagandha season)
    fn service_with(config: ServiceConfig) -> ProvenanceService {
        ProvenanceService::new(
            config,
            Arc::new(RuleCatalog::builtin()),
            Arc::new(FixedClock::in_month(2025, 11)),
            Arc::new(Metrics::new().unwrap()),
        )
        .unwrap()
    }

    fn service() -> ProvenanceService {
        service_with(ServiceConfig::default())
    }

    fn collection(batch_id: &str, lat: f64, lng: f64) -> RecordCollectionRequest {
        RecordCollectionRequest {
            batch_id: batch_id.to_string(),
            species: "Ashwagandha".to_string(),
            collector_id: "FARMER-1".to_string(),
            coordinates: GpsCoordinates::new(lat, lng),
            timestamp: "2025-11-03T06:30:00Z".to_string(),
            location: "Mandsaur, MP".to_string(),
            quantity_kg: 42.5,
            initial_quality: InitialQuality {
                moisture: 9.5,
                appearance: "good".to_string(),
                aroma: "earthy".to_string(),
            },
            photo_refs: vec!["photo-1.jpg".to_string()],
        }
    }

    fn quality(batch_id: &str, moisture: f64) -> RecordQualityTestRequest {
        RecordQualityTestRequest {
            batch_id: batch_id.to_string(),
            lab_id: "LAB-1".to_string(),
            test_date: "2025-11-10T09:00:00Z".to_string(),
            results: QualityResults {
                moisture,
                pesticides: 0.004,
                heavy_metals: 0.002,
                microbial: true,
                dna_barcode: "DNA-ASH-01".to_string(),
            },
            certificate_ref: "CERT-001".to_string(),
        }
    }

    fn processing(batch_id: &str, location: &str) -> RecordProcessingStepRequest {
        RecordProcessingStepRequest {
            batch_id: batch_id.to_string(),
            processor_id: "PROC-1".to_string(),
            step: "Drying".to_string(),
            timestamp: "2025-11-12T09:00:00Z".to_string(),
            location: location.to_string(),
            parameters: ProcessingParameters::default().with_temperature(45.0).with_duration(6.0),
        }
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let service = service();

        let batch = service.record_collection(collection("ASH-001", 20.0, 80.0)).await.unwrap();
        assert_eq!(batch.status, BatchStatus::Collected);
        assert!(batch.is_verified());
        assert_eq!(batch.qr_code, "QR-ASH-001-2025");
        assert_eq!(batch.sustainability_score, 85);
        assert!(batch.collection_event.as_ref().unwrap().id.starts_with("CE-"));

        let batch = service.record_quality_test(quality("ASH-001", 7.8)).await.unwrap();
        assert_eq!(batch.status, BatchStatus::Tested);
        assert!(batch.quality_tests[0].certified);
        assert!(batch.quality_tests[0].id.starts_with("QT-"));

        let batch = service.record_processing_step(processing("ASH-001", "Neemuch Facility")).await.unwrap();
        assert_eq!(batch.status, BatchStatus::Processed);
        assert_eq!(batch.display_status(), BatchStatus::Manufactured);
        assert_eq!(batch.current_location, "Neemuch Facility");
        assert_eq!(batch.processing_steps[0].step, ProcessingStepKind::Drying);

        assert_eq!(service.get_batch("ASH-001").await, Some(batch));
    }

    #[tokio::test]
    async fn test_out_of_zone_collection_is_admitted_unverified() {
        let service = service();

        let batch = service.record_collection(collection("ASH-002", 19.0760, 72.8777)).await.unwrap();

        assert_eq!(batch.status, BatchStatus::Collected);
        assert!(!batch.is_verified());

        let history = service.history("ASH-002").await.unwrap();
        match &history[0].event_data {
            BatchEvent::Collected(e) => {
                assert!(matches!(e.verdict.reason, Some(RejectionReason::OutsideGeoZone { .. })))
            }
            other => panic!("unexpected first event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wet_sample_rejected_and_ledger_unchanged() {
        let service = service();
        service.record_collection(collection("ASH-003", 20.0, 80.0)).await.unwrap();

        let result = service.record_quality_test(quality("ASH-003", 13.0)).await;

        assert!(matches!(
            result,
            Err(BatchError::ValidationRejected(RejectionReason::MoistureTooHigh { .. }))
        ));
        let batch = service.get_batch("ASH-003").await.unwrap();
        assert_eq!(batch.status, BatchStatus::Collected);
        assert!(batch.quality_tests.is_empty());
        assert_eq!(batch.version, 1);
    }

    #[tokio::test]
    async fn test_wet_sample_recorded_for_audit() {
        let service = service_with(ServiceConfig::strict());
        service.record_collection(collection("ASH-004", 20.0, 80.0)).await.unwrap();

        let batch = service.record_quality_test(quality("ASH-004", 13.0)).await.unwrap();

        assert_eq!(batch.status, BatchStatus::Tested);
        assert_eq!(batch.quality_tests.len(), 1);
        assert!(!batch.quality_tests[0].certified);
    }

    #[tokio::test]
    async fn test_unknown_batch() {
        let service = service();

        assert_eq!(service.get_batch("UNKNOWN-ID").await, None);
        assert!(service.history("UNKNOWN-ID").await.is_none());
        assert!(service.export_segment("UNKNOWN-ID").await.unwrap().is_none());

        let result = service.record_processing_step(processing("UNKNOWN-ID", "Kanpur")).await;
        assert!(matches!(result, Err(BatchError::NotFound(_))));

        let result = service.record_quality_test(quality("UNKNOWN-ID", 7.8)).await;
        assert!(matches!(result, Err(BatchError::NotFound(_))));

        assert!(service.list_batches(&BatchFilter::default()).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_request_never_reaches_ledger() {
        let service = service();

        let mut request = collection("ASH-005", 20.0, 80.0);
        request.timestamp = "not a date".to_string();
        let result = service.record_collection(request).await;

        assert!(matches!(result, Err(BatchError::MalformedInput(_))));
        assert!(service.get_batch("ASH-005").await.is_none());
    }

    #[tokio::test]
    async fn test_recollection_policies() {
        let service = service();
        service.record_collection(collection("ASH-006", 20.0, 80.0)).await.unwrap();
        service.record_quality_test(quality("ASH-006", 7.8)).await.unwrap();

        let batch = service.record_collection(collection("ASH-006", 21.0, 81.0)).await.unwrap();
        assert_eq!(batch.status, BatchStatus::Collected);
        assert_eq!(batch.collection_event.unwrap().coordinates, GpsCoordinates::new(21.0, 81.0));

        let strict = service_with(ServiceConfig::strict());
        strict.record_collection(collection("ASH-007", 20.0, 80.0)).await.unwrap();
        let result = strict.record_collection(collection("ASH-007", 20.0, 80.0)).await;
        assert!(matches!(result, Err(BatchError::AlreadyCollected(_))));
    }

    #[tokio::test]
    async fn test_processing_one_batch_leaves_others_alone() {
        let service = service();
        service.record_collection(collection("ASH-010", 20.0, 80.0)).await.unwrap();
        service.record_collection(collection("ASH-011", 20.0, 80.0)).await.unwrap();
        let before = service.get_batch("ASH-011").await.unwrap();

        service.record_processing_step(processing("ASH-010", "Neemuch")).await.unwrap();

        assert_eq!(service.get_batch("ASH-011").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_concurrent_commands_across_batches() {
        let service = Arc::new(service());
        for i in 0..4 {
            service.record_collection(collection(&format!("ASH-1{:02}", i), 20.0, 80.0)).await.unwrap();
        }

        let mut tasks = Vec::new();
        for i in 0..40 {
            let service = service.clone();
            tasks.push(tokio::spawn(async move {
                let id = format!("ASH-1{:02}", i % 4);
                service.record_processing_step(processing(&id, &format!("Site {}", i))).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        for i in 0..4 {
            let batch = service.get_batch(&format!("ASH-1{:02}", i)).await.unwrap();
            assert_eq!(batch.processing_steps.len(), 10);
            assert_eq!(batch.version, 11);
        }
    }

    #[tokio::test]
    async fn test_list_batches_filters() {
        let service = service();
        service.record_collection(collection("ASH-B", 20.0, 80.0)).await.unwrap();
        service.record_collection(collection("ASH-A", 20.0, 80.0)).await.unwrap();
        service.record_quality_test(quality("ASH-B", 7.8)).await.unwrap();

        let mut tulsi = collection("TUL-1", 12.9, 77.6);
        tulsi.species = "Tulsi".to_string();
        service.record_collection(tulsi).await.unwrap();

        let all: Vec<String> = service.list_batches(&BatchFilter::default()).await.into_iter().map(|b| b.id).collect();
        assert_eq!(all, vec!["ASH-A", "ASH-B", "TUL-1"]);

        let awaiting = service.list_batches(&BatchFilter::default().awaiting_quality_test()).await;
        assert_eq!(awaiting.len(), 2);

        let certified = service.list_batches(&BatchFilter::default().certified_only()).await;
        assert_eq!(certified.len(), 1);
        assert_eq!(certified[0].id, "ASH-B");

        let tulsi = service.list_batches(&BatchFilter::default().with_species("Tulsi")).await;
        assert_eq!(tulsi.len(), 1);

        let tested = service.list_batches(&BatchFilter::default().with_status(BatchStatus::Tested)).await;
        assert_eq!(tested.len(), 1);
    }

    #[tokio::test]
    async fn test_segment_replay_reproduces_batch() {
        let source = service();
        source.record_collection(collection("ASH-020", 20.0, 80.0)).await.unwrap();
        source.record_quality_test(quality("ASH-020", 7.8)).await.unwrap();
        let original = source.record_processing_step(processing("ASH-020", "Neemuch")).await.unwrap();

        let segment = source.export_segment("ASH-020").await.unwrap().unwrap();
        assert_eq!(segment.lines().count(), 3);

        let target = service();
        let imported = target.import_segment(&segment).await.unwrap();
        assert_eq!(imported, original);
        assert_eq!(target.get_batch("ASH-020").await, Some(original));

        let again = target.import_segment(&segment).await;
        assert!(matches!(again, Err(BatchError::Store(_))));
    }

    #[tokio::test]
    async fn test_import_rejects_stream_without_collection() {
        let source = service();
        source.record_collection(collection("ASH-021", 20.0, 80.0)).await.unwrap();
        source.record_processing_step(processing("ASH-021", "Neemuch")).await.unwrap();

        let segment = source.export_segment("ASH-021").await.unwrap().unwrap();
        let tail: String = segment.lines().skip(1).map(|l| format!("{}\n", l)).collect();

        let target = service();
        let result = target.import_segment(&tail).await;
        assert!(matches!(result, Err(BatchError::NotInitialized)));
        assert!(target.get_batch("ASH-021").await.is_none());
    }

    fn to_segment(events: &[EventEnvelope<BatchEvent>]) -> String {
        events
            .iter()
            .map(|e| format!("{}\n", serde_json::to_string(e).unwrap()))
            .collect()
    }

    #[tokio::test]
    async fn test_import_rejects_collection_of_other_species() {
        let source = service();
        source.record_collection(collection("ASH-022", 20.0, 80.0)).await.unwrap();
        source
            .record_collection(RecordCollectionRequest {
                species: "Tulsi".to_string(),
                ..collection("TUL-022", 25.3, 82.9)
            })
            .await
            .unwrap();

        let mut events = source.history("ASH-022").await.unwrap();
        let mut tulsi = source.history("TUL-022").await.unwrap().remove(0);
        tulsi.aggregate_id = "ASH-022".to_string();
        tulsi.sequence_number = 2;
        events.push(tulsi);

        let target = service();
        let result = target.import_segment(&to_segment(&events)).await;
        assert!(matches!(result, Err(BatchError::MalformedInput(_))));
        assert!(target.get_batch("ASH-022").await.is_none());
    }

    #[tokio::test]
    async fn test_import_rejects_edited_certification() {
        let source = service_with(ServiceConfig::strict());
        source.record_collection(collection("ASH-023", 20.0, 80.0)).await.unwrap();
        source.record_quality_test(quality("ASH-023", 50.0)).await.unwrap();

        let mut events = source.history("ASH-023").await.unwrap();
        if let BatchEvent::QualityTested(e) = &mut events[1].event_data {
            assert!(!e.test.certified);
            e.test.certified = true;
        }

        let target = service();
        let result = target.import_segment(&to_segment(&events)).await;
        assert!(matches!(result, Err(BatchError::MalformedInput(msg)) if msg.contains("certified")));
        assert!(target.get_batch("ASH-023").await.is_none());

        // Flipping the verdict as well is caught by the quality gate
        if let BatchEvent::QualityTested(e) = &mut events[1].event_data {
            e.verdict = Verdict::accept();
        }
        let result = target.import_segment(&to_segment(&events)).await;
        assert!(matches!(result, Err(BatchError::MalformedInput(msg)) if msg.contains("verdict")));
    }

    #[tokio::test]
    async fn test_import_rejects_verified_collection_outside_zone() {
        let source = service();
        source.record_collection(collection("ASH-024", 19.0760, 72.8777)).await.unwrap();

        let mut events = source.history("ASH-024").await.unwrap();
        if let BatchEvent::Collected(e) = &mut events[0].event_data {
            assert!(!e.collection.verified);
            e.collection.verified = true;
            e.verdict = Verdict::accept();
        }

        let target = service();
        let result = target.import_segment(&to_segment(&events)).await;
        assert!(matches!(result, Err(BatchError::MalformedInput(msg)) if msg.contains("zone")));
        assert!(target.get_batch("ASH-024").await.is_none());
    }

    #[tokio::test]
    async fn test_validate_boundary() {
        let service = service();

        let payload = ValidationPayload::Collection(CollectionPayload {
            species: "Ashwagandha".to_string(),
            coordinates: GpsCoordinates::new(19.0760, 72.8777),
        });
        assert!(!service.is_valid(&payload));
        assert!(service.list_batches(&BatchFilter::default()).await.is_empty());

        let text = service.metrics().render().unwrap();
        assert!(text.contains("provenance_validation_rejections_total{action=\"collection\",rule=\"geo_fencing\"} 1"));
    }

    #[test]
    fn test_invalid_config_is_refused() {
        let result = ProvenanceService::new(
            ServiceConfig::default().with_initial_score(150),
            Arc::new(RuleCatalog::builtin()),
            Arc::new(SystemClock),
            Arc::new(Metrics::new().unwrap()),
        );
        assert!(result.is_err());
    }
}
