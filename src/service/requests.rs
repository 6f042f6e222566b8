use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::domain::batch::{
    Batch, BatchError, BatchStatus, GpsCoordinates, InitialQuality, ProcessingParameters,
    QualityResults,
};

// ============================================================================
// Boundary Requests
// ============================================================================
//
// What callers send. Everything is checked for malformation here, before any
// rule runs or any lock is taken. Timestamps arrive as RFC 3339 strings.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCollectionRequest {
    pub batch_id: String,
    pub species: String,
    pub collector_id: String,
    pub coordinates: GpsCoordinates,
    pub timestamp: String,
    pub location: String,
    pub quantity_kg: f64,
    pub initial_quality: InitialQuality,
    #[serde(default)]
    pub photo_refs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordQualityTestRequest {
    pub batch_id: String,
    pub lab_id: String,
    pub test_date: String,
    pub results: QualityResults,
    #[serde(default)]
    pub certificate_ref: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordProcessingStepRequest {
    pub batch_id: String,
    pub processor_id: String,
    pub step: String,
    pub timestamp: String,
    pub location: String,
    #[serde(default)]
    pub parameters: ProcessingParameters,
}

fn require(field: &str, value: &str) -> Result<(), BatchError> {
    if value.trim().is_empty() {
        return Err(BatchError::malformed(format!("{} is required", field)));
    }
    Ok(())
}

fn require_finite(field: &str, value: f64) -> Result<(), BatchError> {
    if !value.is_finite() {
        return Err(BatchError::malformed(format!("{} must be a finite number, got {}", field, value)));
    }
    Ok(())
}

fn require_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), BatchError> {
    require_finite(field, value)?;
    if value < min || value > max {
        return Err(BatchError::malformed(format!("{} must be within [{}, {}], got {}", field, min, max, value)));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: f64) -> Result<(), BatchError> {
    require_finite(field, value)?;
    if value < 0.0 {
        return Err(BatchError::malformed(format!("{} must not be negative, got {}", field, value)));
    }
    Ok(())
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, BatchError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| BatchError::malformed(format!("{} is not an RFC 3339 timestamp ({}): {}", field, value, e)))
}

impl RecordCollectionRequest {
    /// Returns the parsed collection timestamp
    pub fn check(&self) -> Result<DateTime<Utc>, BatchError> {
        require("batchId", &self.batch_id)?;
        require("species", &self.species)?;
        require("collectorId", &self.collector_id)?;
        require("location", &self.location)?;
        require_range("coordinates.lat", self.coordinates.lat, -90.0, 90.0)?;
        require_range("coordinates.lng", self.coordinates.lng, -180.0, 180.0)?;
        require_non_negative("quantityKg", self.quantity_kg)?;
        require_range("initialQuality.moisture", self.initial_quality.moisture, 0.0, 100.0)?;
        parse_timestamp("timestamp", &self.timestamp)
    }
}

impl RecordQualityTestRequest {
    /// Returns the parsed test date
    pub fn check(&self) -> Result<DateTime<Utc>, BatchError> {
        require("batchId", &self.batch_id)?;
        require("labId", &self.lab_id)?;
        require_range("results.moisture", self.results.moisture, 0.0, 100.0)?;
        require_non_negative("results.pesticides", self.results.pesticides)?;
        require_non_negative("results.heavyMetals", self.results.heavy_metals)?;
        parse_timestamp("testDate", &self.test_date)
    }
}

impl RecordProcessingStepRequest {
    /// Returns the parsed step timestamp
    pub fn check(&self) -> Result<DateTime<Utc>, BatchError> {
        require("batchId", &self.batch_id)?;
        require("processorId", &self.processor_id)?;
        require("step", &self.step)?;
        require("location", &self.location)?;
        if let Some(temperature) = self.parameters.temperature {
            require_finite("parameters.temperature", temperature)?;
        }
        if let Some(duration) = self.parameters.duration {
            require_non_negative("parameters.duration", duration)?;
        }
        parse_timestamp("timestamp", &self.timestamp)
    }
}

// ============================================================================
// Batch Filter
// ============================================================================

/// Query filter for `list_batches`. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchFilter {
    pub status: Option<BatchStatus>,
    pub display_status: Option<BatchStatus>,
    pub species: Option<String>,
    /// Batches with at least one certified quality test
    pub certified_only: bool,
    /// Collected batches with no quality test yet
    pub awaiting_quality_test: bool,
}

impl BatchFilter {
    pub fn with_status(mut self, status: BatchStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_display_status(mut self, status: BatchStatus) -> Self {
        self.display_status = Some(status);
        self
    }

    pub fn with_species(mut self, species: impl Into<String>) -> Self {
        self.species = Some(species.into());
        self
    }

    pub fn certified_only(mut self) -> Self {
        self.certified_only = true;
        self
    }

    pub fn awaiting_quality_test(mut self) -> Self {
        self.awaiting_quality_test = true;
        self
    }

    pub fn matches(&self, batch: &Batch) -> bool {
        self.status.map_or(true, |s| batch.status == s)
            && self.display_status.map_or(true, |s| batch.display_status() == s)
            && self.species.as_deref().map_or(true, |s| batch.species == s)
            && (!self.certified_only || batch.has_certified_test())
            && (!self.awaiting_quality_test
                || (batch.status == BatchStatus::Collected && batch.quality_tests.is_empty()))
    }
}
