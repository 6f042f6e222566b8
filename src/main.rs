use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use herb_provenance::domain::batch::{GpsCoordinates, InitialQuality, ProcessingParameters, QualityResults};
use herb_provenance::service::{
    RecordCollectionRequest, RecordProcessingStepRequest, RecordQualityTestRequest,
};
use herb_provenance::{Args, BatchFilter, Metrics, ProvenanceService, RuleCatalog, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,herb_provenance=debug"))
        )
        .init();

    let args = Args::parse();
    tracing::info!("🚀 Starting herb provenance ledger");

    // === 1. Rule catalog ===
    let catalog = match &args.rules {
        Some(path) => RuleCatalog::from_path(path)
            .with_context(|| format!("loading rule catalog from {}", path.display()))?,
        None => RuleCatalog::builtin(),
    };
    tracing::info!("📚 Rule catalog {} covers {:?}", catalog.version(), catalog.species_names());

    // === 2. Metrics and service ===
    let metrics = Arc::new(Metrics::new()?);
    let service = ProvenanceService::new(
        args.service_config(),
        Arc::new(catalog),
        Arc::new(SystemClock),
        metrics.clone(),
    )?;

    // === 3. Walk one batch through its lifecycle ===
    tracing::info!("📝 Demonstrating batch lifecycle");
    let now = chrono::Utc::now().to_rfc3339();

    let batch = service
        .record_collection(RecordCollectionRequest {
            batch_id: "ASH-DEMO-001".to_string(),
            species: "Ashwagandha".to_string(),
            collector_id: "FARMER-001".to_string(),
            coordinates: GpsCoordinates::new(23.2599, 77.4126),
            timestamp: now.clone(),
            location: "Bhopal, Madhya Pradesh".to_string(),
            quantity_kg: 50.0,
            initial_quality: InitialQuality {
                moisture: 10.5,
                appearance: "Good".to_string(),
                aroma: "Strong earthy".to_string(),
            },
            photo_refs: vec![],
        })
        .await?;
    tracing::info!("✅ Batch {} collected (verified: {}, QR: {})", batch.id, batch.is_verified(), batch.qr_code);

    let batch = service
        .record_quality_test(RecordQualityTestRequest {
            batch_id: batch.id.clone(),
            lab_id: "LAB-001".to_string(),
            test_date: now.clone(),
            results: QualityResults {
                moisture: 7.8,
                pesticides: 0.004,
                heavy_metals: 0.002,
                microbial: true,
                dna_barcode: "DNA-ASH-7781".to_string(),
            },
            certificate_ref: "CERT-2025-001".to_string(),
        })
        .await?;
    tracing::info!("✅ Batch {} tested (certified: {})", batch.id, batch.has_certified_test());

    let batch = service
        .record_processing_step(RecordProcessingStepRequest {
            batch_id: batch.id.clone(),
            processor_id: "PROC-001".to_string(),
            step: "drying".to_string(),
            timestamp: now.clone(),
            location: "Indore Processing Unit".to_string(),
            parameters: ProcessingParameters::default()
                .with_temperature(45.0)
                .with_duration(6.0)
                .with_notes("Shade dried on mesh trays"),
        })
        .await?;
    tracing::info!("✅ Batch {} is now {}", batch.id, batch.display_status());

    // === 4. Rule rejections ===
    let outside = service
        .record_collection(RecordCollectionRequest {
            batch_id: "ASH-DEMO-002".to_string(),
            species: "Ashwagandha".to_string(),
            collector_id: "FARMER-002".to_string(),
            coordinates: GpsCoordinates::new(19.0760, 72.8777),
            timestamp: now.clone(),
            location: "Mumbai, Maharashtra".to_string(),
            quantity_kg: 12.0,
            initial_quality: InitialQuality {
                moisture: 11.0,
                appearance: "Fair".to_string(),
                aroma: "Mild".to_string(),
            },
            photo_refs: vec![],
        })
        .await?;
    tracing::info!("⚠️ Batch {} admitted (verified: {})", outside.id, outside.is_verified());

    let wet = service
        .record_quality_test(RecordQualityTestRequest {
            batch_id: outside.id.clone(),
            lab_id: "LAB-001".to_string(),
            test_date: now,
            results: QualityResults {
                moisture: 13.0,
                pesticides: 0.004,
                heavy_metals: 0.002,
                microbial: true,
                dna_barcode: "DNA-ASH-7782".to_string(),
            },
            certificate_ref: String::new(),
        })
        .await;
    if let Err(e) = wet {
        tracing::info!("🚫 Wet sample refused: {}", e);
    }

    // === 5. Queries ===
    let batches = service.list_batches(&BatchFilter::default()).await;
    tracing::info!("📦 Ledger holds {} batches", batches.len());
    if let Some(segment) = service.export_segment("ASH-DEMO-001").await? {
        tracing::info!("🧾 ASH-DEMO-001 segment has {} events", segment.lines().count());
    }

    tracing::info!("📊 Metrics:\n{}", metrics.render()?);
    tracing::info!("🎉 Demo complete!");

    Ok(())
}
