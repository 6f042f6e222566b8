use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Batch Value Objects
// ============================================================================

/// Lifecycle status of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Collected,
    Tested,
    Processed,
    Manufactured,
    Shipped,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Collected => "collected",
            BatchStatus::Tested => "tested",
            BatchStatus::Processed => "processed",
            BatchStatus::Manufactured => "manufactured",
            BatchStatus::Shipped => "shipped",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinates {
    pub lat: f64,
    pub lng: f64,
}

impl GpsCoordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for GpsCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

/// Quality snapshot taken by the collector in the field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialQuality {
    pub moisture: f64,
    #[serde(default)]
    pub appearance: String,
    #[serde(default)]
    pub aroma: String,
}

/// Laboratory results. Residues are in mg/kg, moisture in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityResults {
    pub moisture: f64,
    pub pesticides: f64,
    pub heavy_metals: f64,
    pub microbial: bool,
    #[serde(default)]
    pub dna_barcode: String,
}

/// Processing step label. Known steps are recognised case-insensitively,
/// anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProcessingStepKind {
    Cleaning,
    Drying,
    Grinding,
    Blending,
    Packaging,
    Labeling,
    Other(String),
}

impl ProcessingStepKind {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "cleaning" => Self::Cleaning,
            "drying" => Self::Drying,
            "grinding" => Self::Grinding,
            "blending" | "mixing" => Self::Blending,
            "packaging" => Self::Packaging,
            "labeling" | "labelling" => Self::Labeling,
            _ => Self::Other(label.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Cleaning => "cleaning",
            Self::Drying => "drying",
            Self::Grinding => "grinding",
            Self::Blending => "blending",
            Self::Packaging => "packaging",
            Self::Labeling => "labeling",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for ProcessingStepKind {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl From<ProcessingStepKind> for String {
    fn from(kind: ProcessingStepKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ProcessingStepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar value in a processing parameter bag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, ParamValue>,
}

impl ProcessingParameters {
    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(celsius);
        self
    }

    pub fn with_duration(mut self, hours: f64) -> Self {
        self.duration = Some(hours);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

// ============================================================================
// Recorded Events (the parts of a batch)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEvent {
    pub id: String,
    pub species: String,
    pub collector_id: String,
    pub coordinates: GpsCoordinates,
    pub timestamp: DateTime<Utc>,
    pub location: String,
    pub quantity_kg: f64,
    pub initial_quality: InitialQuality,
    #[serde(default)]
    pub photo_refs: Vec<String>,
    /// Rule compliance at admission time, never recomputed
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityTest {
    pub id: String,
    pub lab_id: String,
    pub test_date: DateTime<Utc>,
    pub results: QualityResults,
    /// Four-condition certification, computed once at admission
    pub certified: bool,
    #[serde(default)]
    pub certificate_ref: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStep {
    pub id: String,
    pub processor_id: String,
    pub step: ProcessingStepKind,
    pub timestamp: DateTime<Utc>,
    pub location: String,
    #[serde(default)]
    pub parameters: ProcessingParameters,
}

// ============================================================================
// Unit Tests
// ============================================================================
