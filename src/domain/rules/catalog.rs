use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::str::FromStr;

use crate::domain::batch::GpsCoordinates;

// ============================================================================
// Rule Catalog
// ============================================================================
//
// Per-species geo-zones and harvest windows plus global quality thresholds.
// Loaded once at startup and shared read-only. Species missing from the
// catalog are unconstrained.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read rule catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse rule catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid geo-zone for {species}: {detail}")]
    InvalidZone { species: String, detail: String },

    #[error("Unknown harvest month for {species}: {month}")]
    UnknownMonth { species: String, month: String },

    #[error("Invalid quality threshold {name}: {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}

/// Inclusive bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoZone {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl GeoZone {
    pub fn new(lat_min: f64, lat_max: f64, lng_min: f64, lng_max: f64) -> Self {
        Self { lat_min, lat_max, lng_min, lng_max }
    }

    pub fn contains(&self, point: &GpsCoordinates) -> bool {
        point.lat >= self.lat_min
            && point.lat <= self.lat_max
            && point.lng >= self.lng_min
            && point.lng <= self.lng_max
    }

    fn check(&self, species: &str) -> Result<(), CatalogError> {
        let bounds = [self.lat_min, self.lat_max, self.lng_min, self.lng_max];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(CatalogError::InvalidZone {
                species: species.to_string(),
                detail: "bounds must be finite".to_string(),
            });
        }
        if self.lat_min > self.lat_max || self.lng_min > self.lng_max {
            return Err(CatalogError::InvalidZone {
                species: species.to_string(),
                detail: format!("min exceeds max in {:?}", self),
            });
        }
        Ok(())
    }
}

/// Valid harvest months, zero-based (January = 0)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestWindow(BTreeSet<u32>);

impl HarvestWindow {
    pub fn from_months(months: impl IntoIterator<Item = u32>) -> Self {
        Self(months.into_iter().filter(|m| *m < 12).collect())
    }

    pub fn contains(&self, month0: u32) -> bool {
        self.0.contains(&month0)
    }

    pub fn months(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesRules {
    pub zone: Option<GeoZone>,
    pub harvest_window: Option<HarvestWindow>,
}

/// Laboratory limits. Every limit is exclusive: a value must be strictly below it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityThresholds {
    /// Percent
    pub max_moisture: f64,
    /// mg/kg
    pub max_pesticides: f64,
    /// mg/kg
    pub max_heavy_metals: f64,
    pub require_microbial_pass: bool,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            max_moisture: 12.0,
            max_pesticides: 0.01,
            max_heavy_metals: 0.005,
            require_microbial_pass: true,
        }
    }
}

impl QualityThresholds {
    fn check(&self) -> Result<(), CatalogError> {
        for (name, value) in [
            ("maxMoisture", self.max_moisture),
            ("maxPesticides", self.max_pesticides),
            ("maxHeavyMetals", self.max_heavy_metals),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CatalogError::InvalidThreshold { name, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleCatalog {
    version: String,
    species: HashMap<String, SpeciesRules>,
    quality: QualityThresholds,
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleCatalog {
    /// Catalog shipped with the service: Ashwagandha and Tulsi.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty(QualityThresholds::default())
            .with_species(
                "Ashwagandha",
                SpeciesRules {
                    zone: Some(GeoZone::new(15.0, 30.0, 75.0, 85.0)),
                    // Nov-Feb
                    harvest_window: Some(HarvestWindow::from_months([10, 11, 0, 1])),
                },
            )
            .with_species(
                "Tulsi",
                SpeciesRules {
                    zone: Some(GeoZone::new(10.0, 35.0, 70.0, 90.0)),
                    // Mar-Oct
                    harvest_window: Some(HarvestWindow::from_months(2..=9)),
                },
            );
        catalog.version = "builtin-1".to_string();
        catalog
    }

    /// Catalog with no species rules; every species passes geo and season checks
    pub fn empty(quality: QualityThresholds) -> Self {
        Self {
            version: "empty".to_string(),
            species: HashMap::new(),
            quality,
        }
    }

    pub fn with_species(mut self, name: impl Into<String>, rules: SpeciesRules) -> Self {
        self.species.insert(name.into(), rules);
        self
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        json.parse()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn quality(&self) -> &QualityThresholds {
        &self.quality
    }

    pub fn species_rules(&self, species: &str) -> Option<&SpeciesRules> {
        self.species.get(species)
    }

    pub fn geo_zone(&self, species: &str) -> Option<&GeoZone> {
        self.species_rules(species).and_then(|r| r.zone.as_ref())
    }

    pub fn harvest_window(&self, species: &str) -> Option<&HarvestWindow> {
        self.species_rules(species).and_then(|r| r.harvest_window.as_ref())
    }

    pub fn species_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.species.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// ============================================================================
// File Format
// ============================================================================
//
// {
//   "version": "2025-10",
//   "species": {
//     "Ashwagandha": {
//       "zone": { "latMin": 15, "latMax": 30, "lngMin": 75, "lngMax": 85 },
//       "harvestMonths": ["November", "December", "January", "February"]
//     }
//   },
//   "quality": { "maxMoisture": 12, ... }
// }
//
// Months may be given as names ("Nov", "november") or zero-based indexes.
//
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    species: BTreeMap<String, SpeciesFile>,
    #[serde(default)]
    quality: QualityThresholds,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpeciesFile {
    zone: Option<GeoZone>,
    harvest_months: Option<Vec<MonthSpec>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MonthSpec {
    Index(u32),
    Name(String),
}

fn default_version() -> String {
    "unversioned".to_string()
}

fn month_index(species: &str, spec: &MonthSpec) -> Result<u32, CatalogError> {
    let unknown = |month: String| CatalogError::UnknownMonth {
        species: species.to_string(),
        month,
    };
    match spec {
        MonthSpec::Index(i) if *i < 12 => Ok(*i),
        MonthSpec::Index(i) => Err(unknown(i.to_string())),
        MonthSpec::Name(name) => chrono::Month::from_str(name.trim())
            .map(|m| m.number_from_month() - 1)
            .map_err(|_| unknown(name.clone())),
    }
}

impl FromStr for RuleCatalog {
    type Err = CatalogError;

    fn from_str(json: &str) -> Result<Self, Self::Err> {
        let file: CatalogFile = serde_json::from_str(json)?;
        file.quality.check()?;

        let mut species = HashMap::with_capacity(file.species.len());
        for (name, entry) in file.species {
            if let Some(zone) = &entry.zone {
                zone.check(&name)?;
            }
            let harvest_window = match entry.harvest_months {
                Some(months) => {
                    let months = months
                        .iter()
                        .map(|m| month_index(&name, m))
                        .collect::<Result<Vec<_>, _>>()?;
                    Some(HarvestWindow::from_months(months))
                }
                None => None,
            };
            species.insert(name, SpeciesRules { zone: entry.zone, harvest_window });
        }

        Ok(Self {
            version: file.version,
            species,
            quality: file.quality,
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = RuleCatalog::builtin();

        assert_eq!(catalog.species_names(), vec!["Ashwagandha", "Tulsi"]);
        let zone = catalog.geo_zone("Ashwagandha").unwrap();
        assert_eq!(*zone, GeoZone::new(15.0, 30.0, 75.0, 85.0));

        let window = catalog.harvest_window("Ashwagandha").unwrap();
        assert_eq!(window.months().collect::<Vec<_>>(), vec![0, 1, 10, 11]);

        let tulsi = catalog.harvest_window("Tulsi").unwrap();
        assert_eq!(tulsi.months().collect::<Vec<_>>(), (2..=9).collect::<Vec<_>>());

        assert_eq!(catalog.quality().max_moisture, 12.0);
        assert!(catalog.species_rules("Brahmi").is_none());
    }

    #[test]
    fn test_zone_bounds_are_inclusive() {
        let zone = GeoZone::new(15.0, 30.0, 75.0, 85.0);

        assert!(zone.contains(&GpsCoordinates::new(15.0, 75.0)));
        assert!(zone.contains(&GpsCoordinates::new(30.0, 85.0)));
        assert!(!zone.contains(&GpsCoordinates::new(19.0760, 72.8777)));
        assert!(!zone.contains(&GpsCoordinates::new(f64::NAN, 80.0)));
    }

    #[test]
    fn test_parse_catalog_file() {
        let json = r#"{
            "version": "2025-10",
            "species": {
                "Brahmi": {
                    "zone": { "latMin": 8, "latMax": 28, "lngMin": 72, "lngMax": 92 },
                    "harvestMonths": ["June", "jul", 7]
                },
                "Neem": { "zone": { "latMin": 5, "latMax": 30, "lngMin": 68, "lngMax": 97 } }
            }
        }"#;

        let catalog: RuleCatalog = json.parse().unwrap();

        assert_eq!(catalog.version(), "2025-10");
        let window = catalog.harvest_window("Brahmi").unwrap();
        assert_eq!(window.months().collect::<Vec<_>>(), vec![5, 6, 7]);
        assert!(catalog.harvest_window("Neem").is_none());
        assert!(catalog.geo_zone("Neem").is_some());
        assert_eq!(*catalog.quality(), QualityThresholds::default());
    }

    #[test]
    fn test_parse_rejects_inverted_zone() {
        let json = r#"{ "species": { "Tulsi": { "zone": { "latMin": 35, "latMax": 10, "lngMin": 70, "lngMax": 90 } } } }"#;
        let result = json.parse::<RuleCatalog>();
        assert!(matches!(result, Err(CatalogError::InvalidZone { .. })));
    }

    #[test]
    fn test_parse_rejects_unknown_month() {
        let json = r#"{ "species": { "Tulsi": { "harvestMonths": ["Smarch"] } } }"#;
        let result = json.parse::<RuleCatalog>();
        assert!(matches!(result, Err(CatalogError::UnknownMonth { .. })));

        let json = r#"{ "species": { "Tulsi": { "harvestMonths": [12] } } }"#;
        let result = json.parse::<RuleCatalog>();
        assert!(matches!(result, Err(CatalogError::UnknownMonth { .. })));
    }

    #[test]
    fn test_parse_rejects_bad_thresholds() {
        let json = r#"{ "quality": { "maxMoisture": 0, "maxPesticides": 0.01, "maxHeavyMetals": 0.005, "requireMicrobialPass": true } }"#;
        let result = json.parse::<RuleCatalog>();
        assert!(matches!(result, Err(CatalogError::InvalidThreshold { name: "maxMoisture", .. })));
    }

    #[test]
    fn test_from_missing_path_is_io_error() {
        let result = RuleCatalog::from_path("/definitely/not/here/rules.json");
        assert!(matches!(result, Err(CatalogError::Io(_))));
    }
}
