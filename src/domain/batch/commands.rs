use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::validation::Verdict;
use super::value_objects::{CollectionEvent, ProcessingStep, QualityTest};

// ============================================================================
// Batch Commands - Represent user intent
// ============================================================================
//
// Commands arrive already validated: the verdict is computed before the
// stream lock is taken and travels with the command.
//
// ============================================================================

#[derive(Debug, Clone)]
pub enum BatchCommand {
    RecordCollection {
        collection: CollectionEvent,
        sustainability_score: u8,
        verdict: Verdict,
        policy: RecollectionPolicy,
    },
    RecordQualityTest {
        test: QualityTest,
        verdict: Verdict,
        policy: RejectedQualityPolicy,
    },
    RecordProcessingStep {
        step: ProcessingStep,
        verdict: Verdict,
    },
}

impl BatchCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BatchCommand::RecordCollection { .. } => "RecordCollection",
            BatchCommand::RecordQualityTest { .. } => "RecordQualityTest",
            BatchCommand::RecordProcessingStep { .. } => "RecordProcessingStep",
        }
    }
}

// ============================================================================
// Policies
// ============================================================================

#[derive(Debug, thiserror::Error)]
#[error("Unknown {policy} policy: {value}")]
pub struct PolicyParseError {
    policy: &'static str,
    value: String,
}

/// What a collection event does to a batch that already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecollectionPolicy {
    /// Replace the collection event and return the batch to `collected`
    #[default]
    Overwrite,
    /// Refuse with `AlreadyCollected`
    Reject,
}

impl FromStr for RecollectionPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "reject" => Ok(Self::Reject),
            _ => Err(PolicyParseError { policy: "recollection", value: s.to_string() }),
        }
    }
}

impl fmt::Display for RecollectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overwrite => f.write_str("overwrite"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

/// What happens to a quality test that fails the acceptance gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectedQualityPolicy {
    /// Nothing is recorded, the caller gets `ValidationRejected`
    #[default]
    Reject,
    /// Recorded uncertified with its rejecting verdict
    #[serde(rename = "audit")]
    RecordForAudit,
}

impl FromStr for RejectedQualityPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "audit" | "record-for-audit" => Ok(Self::RecordForAudit),
            _ => Err(PolicyParseError { policy: "rejected-quality", value: s.to_string() }),
        }
    }
}

impl fmt::Display for RejectedQualityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => f.write_str("reject"),
            Self::RecordForAudit => f.write_str("audit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policies() {
        assert_eq!("Overwrite".parse::<RecollectionPolicy>().unwrap(), RecollectionPolicy::Overwrite);
        assert_eq!("reject".parse::<RecollectionPolicy>().unwrap(), RecollectionPolicy::Reject);
        assert_eq!("audit".parse::<RejectedQualityPolicy>().unwrap(), RejectedQualityPolicy::RecordForAudit);
        assert_eq!(RejectedQualityPolicy::default(), RejectedQualityPolicy::Reject);

        let err = "sometimes".parse::<RecollectionPolicy>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown recollection policy: sometimes");
    }

    #[test]
    fn test_policy_display_round_trips() {
        for policy in [RejectedQualityPolicy::Reject, RejectedQualityPolicy::RecordForAudit] {
            assert_eq!(policy.to_string().parse::<RejectedQualityPolicy>().unwrap(), policy);
        }
    }
}
