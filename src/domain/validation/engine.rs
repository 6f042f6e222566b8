use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::domain::batch::{GpsCoordinates, ProcessingParameters, QualityResults};
use crate::domain::rules::{QualityThresholds, RuleCatalog};
use super::clock::Clock;

// ============================================================================
// Validation Engine
// ============================================================================
//
// Pure rule checks over a proposed event. Nothing here touches the ledger;
// every function is safe to call speculatively and concurrently.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationAction {
    Collection,
    Quality,
    Processing,
}

impl ValidationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationAction::Collection => "collection",
            ValidationAction::Quality => "quality",
            ValidationAction::Processing => "processing",
        }
    }
}

impl fmt::Display for ValidationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPayload {
    pub species: String,
    pub coordinates: GpsCoordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityPayload {
    pub results: QualityResults,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingPayload {
    #[serde(default)]
    pub parameters: ProcessingParameters,
}

/// Proposed event, tagged by the action it is validated for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "lowercase")]
pub enum ValidationPayload {
    Collection(CollectionPayload),
    Quality(QualityPayload),
    Processing(ProcessingPayload),
}

impl ValidationPayload {
    pub fn action(&self) -> ValidationAction {
        match self {
            ValidationPayload::Collection(_) => ValidationAction::Collection,
            ValidationPayload::Quality(_) => ValidationAction::Quality,
            ValidationPayload::Processing(_) => ValidationAction::Processing,
        }
    }
}

/// Why a rule rejected a proposed event
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum RejectionReason {
    #[error("coordinates ({lat}, {lng}) are outside the {species} sourcing zone")]
    OutsideGeoZone { species: String, lat: f64, lng: f64 },

    #[error("{species} may not be harvested in month {month0} (zero-based)")]
    OutOfSeason { species: String, month0: u32 },

    #[error("moisture {value}% is not below the {limit}% limit")]
    MoistureTooHigh { value: f64, limit: f64 },

    #[error("pesticide residue {value} mg/kg is not below the {limit} mg/kg limit")]
    PesticideResidueTooHigh { value: f64, limit: f64 },
}

impl RejectionReason {
    /// Short rule name, used as a metrics label
    pub fn rule(&self) -> &'static str {
        match self {
            RejectionReason::OutsideGeoZone { .. } => "geo_fencing",
            RejectionReason::OutOfSeason { .. } => "seasonal",
            RejectionReason::MoistureTooHigh { .. } => "moisture",
            RejectionReason::PesticideResidueTooHigh { .. } => "pesticides",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectionReason>,
}

impl Verdict {
    pub fn accept() -> Self {
        Self { accepted: true, reason: None }
    }

    pub fn reject(reason: RejectionReason) -> Self {
        Self { accepted: false, reason: Some(reason) }
    }
}

impl From<Result<(), RejectionReason>> for Verdict {
    fn from(result: Result<(), RejectionReason>) -> Self {
        match result {
            Ok(()) => Verdict::accept(),
            Err(reason) => Verdict::reject(reason),
        }
    }
}

// ============================================================================
// Rule Predicates
// ============================================================================

/// Passes when the species is uncatalogued or has no zone
pub fn geo_fencing(
    catalog: &RuleCatalog,
    coordinates: &GpsCoordinates,
    species: &str,
) -> Result<(), RejectionReason> {
    match catalog.geo_zone(species) {
        Some(zone) if !zone.contains(coordinates) => Err(RejectionReason::OutsideGeoZone {
            species: species.to_string(),
            lat: coordinates.lat,
            lng: coordinates.lng,
        }),
        _ => Ok(()),
    }
}

/// Passes when the species is uncatalogued or has no harvest window
pub fn seasonal(catalog: &RuleCatalog, species: &str, month0: u32) -> Result<(), RejectionReason> {
    match catalog.harvest_window(species) {
        Some(window) if !window.contains(month0) => Err(RejectionReason::OutOfSeason {
            species: species.to_string(),
            month0,
        }),
        _ => Ok(()),
    }
}

/// Two-condition admission gate: moisture and pesticide residue
pub fn quality_gate(
    thresholds: &QualityThresholds,
    results: &QualityResults,
) -> Result<(), RejectionReason> {
    if !(results.moisture < thresholds.max_moisture) {
        return Err(RejectionReason::MoistureTooHigh {
            value: results.moisture,
            limit: thresholds.max_moisture,
        });
    }
    if !(results.pesticides < thresholds.max_pesticides) {
        return Err(RejectionReason::PesticideResidueTooHigh {
            value: results.pesticides,
            limit: thresholds.max_pesticides,
        });
    }
    Ok(())
}

/// Four-condition certification. Stricter than `quality_gate`.
pub fn certify(thresholds: &QualityThresholds, results: &QualityResults) -> bool {
    results.moisture < thresholds.max_moisture
        && results.pesticides < thresholds.max_pesticides
        && results.heavy_metals < thresholds.max_heavy_metals
        && (results.microbial || !thresholds.require_microbial_pass)
}

// ============================================================================
// Engine
// ============================================================================

/// Binds the predicates to a catalog and a clock.
#[derive(Clone)]
pub struct ValidationEngine {
    catalog: Arc<RuleCatalog>,
    clock: Arc<dyn Clock>,
}

impl ValidationEngine {
    pub fn new(catalog: Arc<RuleCatalog>, clock: Arc<dyn Clock>) -> Self {
        Self { catalog, clock }
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Evaluate a proposed event. Geo-fencing is reported before seasonality.
    pub fn validate(&self, payload: &ValidationPayload) -> Verdict {
        let outcome = match payload {
            ValidationPayload::Collection(p) => {
                // Seasonality uses the current month, not the declared harvest date
                geo_fencing(&self.catalog, &p.coordinates, &p.species)
                    .and_then(|_| seasonal(&self.catalog, &p.species, self.clock.current_month0()))
            }
            ValidationPayload::Quality(p) => quality_gate(self.catalog.quality(), &p.results),
            ValidationPayload::Processing(_) => Ok(()),
        };

        let verdict = Verdict::from(outcome);
        if let Some(reason) = &verdict.reason {
            tracing::debug!(action = %payload.action(), rule = reason.rule(), "Validation rejected: {}", reason);
        }
        verdict
    }

    pub fn is_valid(&self, payload: &ValidationPayload) -> bool {
        self.validate(payload).accepted
    }

    pub fn certify(&self, results: &QualityResults) -> bool {
        certify(self.catalog.quality(), results)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
