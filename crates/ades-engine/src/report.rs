//! Validation reports
//!
//! The detailed report carries the full building-block trees and stage
//! conclusions; the simple report is a projection of it and never re-runs
//! any validation logic.

use crate::bbb::BasicBuildingBlocks;
use crate::runner::StageRecord;
use crate::stage::StageConclusion;
use ades_core::{AdesError, Result};
use ades_policy::{Conclusion, Indication, Message, SubIndication, ValidationModel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureReport {
    pub id: String,
    pub basic: BasicBuildingBlocks,
    #[serde(default)]
    pub timestamps: Vec<BasicBuildingBlocks>,
    pub long_term: StageConclusion,
    pub archival: StageConclusion,
    pub stages: Vec<StageRecord>,
}

impl SignatureReport {
    /// Final outcome: the archival data validation conclusion
    pub fn conclusion(&self) -> &Conclusion {
        &self.archival.conclusion
    }

    pub fn timestamp(&self, id: &str) -> Option<&BasicBuildingBlocks> {
        self.timestamps.iter().find(|t| t.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedReport {
    pub validation_time: DateTime<Utc>,
    pub policy: String,
    pub model: ValidationModel,
    pub pipeline: String,
    pub signatures: Vec<SignatureReport>,
}

impl DetailedReport {
    pub fn signature(&self, id: &str) -> Option<&SignatureReport> {
        self.signatures.iter().find(|s| s.id == id)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| AdesError::Serialize(e.to_string()))
    }

    /// Digest of the canonical JSON form. Identical inputs give identical
    /// fingerprints.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self).map_err(|e| AdesError::Serialize(e.to_string()))?;
        Ok(format!("blake3:{}", blake3::hash(&bytes)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleSignature {
    pub id: String,
    pub indication: Indication,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_indication: Option<SubIndication>,
    pub best_signature_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub infos: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleReport {
    pub validation_time: DateTime<Utc>,
    pub policy: String,
    pub signatures: Vec<SimpleSignature>,
}

impl SimpleReport {
    pub fn signature(&self, id: &str) -> Option<&SimpleSignature> {
        self.signatures.iter().find(|s| s.id == id)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| AdesError::Serialize(e.to_string()))
    }
}

/// Message keys in first-seen order, without repeats
fn keys(messages: &[Message]) -> Vec<String> {
    let mut seen = Vec::new();
    for message in messages {
        if !seen.contains(&message.key) {
            seen.push(message.key.clone());
        }
    }
    seen
}

impl From<&SignatureReport> for SimpleSignature {
    fn from(report: &SignatureReport) -> Self {
        let conclusion = report.conclusion();
        Self {
            id: report.id.clone(),
            indication: conclusion.indication(),
            sub_indication: conclusion.sub_indication(),
            best_signature_time: report.archival.best_signature_time,
            errors: keys(&conclusion.errors),
            warnings: keys(&conclusion.warnings),
            infos: keys(&conclusion.infos),
        }
    }
}

impl From<&DetailedReport> for SimpleReport {
    fn from(report: &DetailedReport) -> Self {
        Self {
            validation_time: report.validation_time,
            policy: report.policy.clone(),
            signatures: report.signatures.iter().map(SimpleSignature::from).collect(),
        }
    }
}
