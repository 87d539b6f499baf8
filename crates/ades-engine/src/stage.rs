//! Stage trait: the single contract of every validation stage
//!
//! A signature goes through the stages in order, each reading what earlier
//! stages left in the [`SignatureState`] and adding its own product. The
//! serialized product is returned so the runner can fingerprint it.

use crate::aggregate;
use crate::bbb::{self, BasicBuildingBlocks, TimestampValidation};
use crate::poe::{self, PoeEntry, PoeScope};
use crate::psv::PsvResult;
use crate::token::TokenRef;
use ades_core::{SigIdx, ValidationContext};
use ades_policy::Conclusion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// One validation stage
pub trait Stage: Send + Sync {
    /// Unique stage id (e.g. "ltv.v1")
    fn id(&self) -> &'static str;

    /// Whether the output depends only on the inputs (default: true)
    fn deterministic(&self) -> bool {
        true
    }

    fn run(&self, ctx: &ValidationContext, state: &mut SignatureState) -> Result<StageOutput, StageError>;
}

#[derive(Error, Debug, Clone)]
pub enum StageError {
    #[error("STAGE/{stage} requires {missing}")]
    MissingInput {
        stage: &'static str,
        missing: &'static str,
    },

    #[error("SERIALIZE/{0}")]
    Serialize(String),
}

/// What a stage hands back to the runner
#[derive(Debug, Clone)]
pub struct StageOutput {
    /// Short human-readable outcome
    pub summary: String,
    /// Serialized stage product
    pub bytes: Vec<u8>,
}

impl StageOutput {
    fn of<T: Serialize>(summary: impl Into<String>, product: &T) -> Result<Self, StageError> {
        Ok(Self {
            summary: summary.into(),
            bytes: serde_json::to_vec(product).map_err(|e| StageError::Serialize(e.to_string()))?,
        })
    }
}

/// A timestamp lifted by past signature validation while building POE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampRecovery {
    pub timestamp: String,
    pub psv: PsvResult,
}

/// Outcome of the long-term or archival stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConclusion {
    pub conclusion: Conclusion,
    /// Past signature validation of the signature, when attempted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psv: Option<PsvResult>,
    pub best_signature_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proofs_of_existence: Vec<PoeEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recovered_timestamps: Vec<TimestampRecovery>,
}

/// Everything known about one signature while its stages run
#[derive(Debug, Clone)]
pub struct SignatureState {
    pub signature: SigIdx,
    pub basic: Option<BasicBuildingBlocks>,
    pub timestamps: Vec<TimestampValidation>,
    pub long_term: Option<StageConclusion>,
    pub archival: Option<StageConclusion>,
}

impl SignatureState {
    pub fn new(signature: SigIdx) -> Self {
        Self {
            signature,
            basic: None,
            timestamps: Vec::new(),
            long_term: None,
            archival: None,
        }
    }
}

pub struct BasicSignatureStage;

impl Stage for BasicSignatureStage {
    fn id(&self) -> &'static str {
        "basic.signature.v1"
    }

    fn run(&self, ctx: &ValidationContext, state: &mut SignatureState) -> Result<StageOutput, StageError> {
        let bbb = bbb::validate_basic(ctx, TokenRef::Signature(state.signature));
        info!(signature = %bbb.id, conclusion = %bbb.conclusion, "basic signature validation");
        let output = StageOutput::of(bbb.conclusion.to_string(), &bbb)?;
        state.basic = Some(bbb);
        Ok(output)
    }
}

pub struct BasicTimestampStage;

impl Stage for BasicTimestampStage {
    fn id(&self) -> &'static str {
        "basic.timestamp.v1"
    }

    fn run(&self, ctx: &ValidationContext, state: &mut SignatureState) -> Result<StageOutput, StageError> {
        let related = ctx.graph().related_timestamps(state.signature);
        let timestamps = bbb::validate_timestamps(ctx, &related);
        let passed = timestamps.iter().filter(|t| t.bbb.conclusion.is_passed()).count();
        info!(
            signature = ctx.graph().signature(state.signature).id.as_str(),
            timestamps = timestamps.len(),
            passed,
            "basic timestamp validation"
        );

        let blocks: Vec<&BasicBuildingBlocks> = timestamps.iter().map(|t| &t.bbb).collect();
        let output = StageOutput::of(format!("{}/{} PASSED", passed, timestamps.len()), &blocks)?;
        state.timestamps = timestamps;
        Ok(output)
    }
}

/// Past validation against the POE built from timestamps in `scope`
fn past_stage(
    ctx: &ValidationContext,
    state: &SignatureState,
    prior: &Conclusion,
    scope: PoeScope,
    stage: &'static str,
) -> Result<StageConclusion, StageError> {
    let basic = state.basic.as_ref().ok_or(StageError::MissingInput {
        stage,
        missing: "basic.signature.v1",
    })?;
    let token = TokenRef::Signature(state.signature);
    let build = poe::build(ctx, &state.timestamps, scope);
    let (conclusion, psv) = aggregate::past_validation(ctx, token, basic, prior, &build.poe);

    let recovered_timestamps = build
        .recovered
        .into_iter()
        .map(|(position, psv)| TimestampRecovery {
            timestamp: state.timestamps[position].bbb.id.clone(),
            psv,
        })
        .collect();

    Ok(StageConclusion {
        conclusion,
        psv,
        best_signature_time: token.best_poe(ctx.graph(), &build.poe, false),
        proofs_of_existence: build.poe.entries(ctx.graph()),
        recovered_timestamps,
    })
}

pub struct LongTermStage;

impl Stage for LongTermStage {
    fn id(&self) -> &'static str {
        "ltv.v1"
    }

    fn run(&self, ctx: &ValidationContext, state: &mut SignatureState) -> Result<StageOutput, StageError> {
        let prior = state
            .basic
            .as_ref()
            .map(|bbb| bbb.conclusion.clone())
            .ok_or(StageError::MissingInput {
                stage: self.id(),
                missing: "basic.signature.v1",
            })?;
        let result = past_stage(ctx, state, &prior, PoeScope::LongTerm, self.id())?;
        info!(
            signature = ctx.graph().signature(state.signature).id.as_str(),
            conclusion = %result.conclusion,
            recovered = result.psv.is_some(),
            "long-term validation"
        );
        let output = StageOutput::of(result.conclusion.to_string(), &result)?;
        state.long_term = Some(result);
        Ok(output)
    }
}

pub struct ArchivalStage;

impl Stage for ArchivalStage {
    fn id(&self) -> &'static str {
        "adv.v1"
    }

    fn run(&self, ctx: &ValidationContext, state: &mut SignatureState) -> Result<StageOutput, StageError> {
        let prior = state
            .long_term
            .as_ref()
            .map(|ltv| ltv.conclusion.clone())
            .ok_or(StageError::MissingInput {
                stage: self.id(),
                missing: "ltv.v1",
            })?;
        let result = past_stage(ctx, state, &prior, PoeScope::Archival, self.id())?;
        info!(
            signature = ctx.graph().signature(state.signature).id.as_str(),
            conclusion = %result.conclusion,
            recovered = result.psv.is_some(),
            "archival data validation"
        );
        let output = StageOutput::of(result.conclusion.to_string(), &result)?;
        state.archival = Some(result);
        Ok(output)
    }
}
