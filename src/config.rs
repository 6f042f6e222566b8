use clap::Parser;
use std::path::PathBuf;

use crate::domain::batch::{RecollectionPolicy, RejectedQualityPolicy};

// ============================================================================
// Service Configuration
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct ServiceConfig {
    /// Sustainability score given to every new batch (0-100)
    pub initial_sustainability_score: u8,
    /// Behaviour of a collection event for an existing batch
    pub recollection: RecollectionPolicy,
    /// Behaviour of a quality test that fails the acceptance gate
    pub rejected_quality: RejectedQualityPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            initial_sustainability_score: 85,
            recollection: RecollectionPolicy::Overwrite,
            rejected_quality: RejectedQualityPolicy::Reject,
        }
    }
}

impl ServiceConfig {
    /// Refuses re-collection and records failed lab tests for audit
    pub fn strict() -> Self {
        Self {
            recollection: RecollectionPolicy::Reject,
            rejected_quality: RejectedQualityPolicy::RecordForAudit,
            ..Self::default()
        }
    }

    pub fn with_initial_score(mut self, score: u8) -> Self {
        self.initial_sustainability_score = score;
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.initial_sustainability_score <= 100,
            "initial sustainability score must be between 0 and 100, got {}",
            self.initial_sustainability_score
        );
        Ok(())
    }
}

// ============================================================================
// Command Line
// ============================================================================

/// Herb provenance ledger
#[derive(Parser, Debug, Clone)]
#[command(name = "herb-provenance")]
#[command(about = "Validated provenance ledger for herbal supply-chain batches")]
pub struct Args {
    /// Rule catalog JSON file. The built-in catalog is used when absent.
    #[arg(long, env = "PROVENANCE_RULES")]
    pub rules: Option<PathBuf>,

    /// Sustainability score assigned to new batches
    #[arg(long, env = "PROVENANCE_INITIAL_SCORE", default_value = "85")]
    pub initial_score: u8,

    /// Re-collection of an existing batch (overwrite, reject)
    #[arg(long, env = "PROVENANCE_RECOLLECTION", default_value = "overwrite")]
    pub recollection: RecollectionPolicy,

    /// Quality tests failing the gate (reject, audit)
    #[arg(long, env = "PROVENANCE_REJECTED_QUALITY", default_value = "reject")]
    pub rejected_quality: RejectedQualityPolicy,
}

impl Args {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            initial_sustainability_score: self.initial_score,
            recollection: self.recollection,
            rejected_quality: self.rejected_quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.initial_sustainability_score, 85);
        assert_eq!(config.recollection, RecollectionPolicy::Overwrite);
        assert_eq!(config.rejected_quality, RejectedQualityPolicy::Reject);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_score_out_of_range() {
        let config = ServiceConfig::default().with_initial_score(101);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "herb-provenance",
            "--initial-score",
            "70",
            "--recollection",
            "reject",
            "--rejected-quality",
            "audit",
        ])
        .unwrap();

        assert!(args.rules.is_none());
        assert_eq!(args.service_config(), ServiceConfig::strict().with_initial_score(70));
    }

    #[test]
    fn test_parse_args_rejects_unknown_policy() {
        let result = Args::try_parse_from(["herb-provenance", "--recollection", "maybe"]);
        assert!(result.is_err());
    }
}
