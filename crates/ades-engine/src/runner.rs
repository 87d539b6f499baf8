//! Stage runner: chains the validation stages of one signature and records
//! a digest of every stage product
use crate::stage::{
    ArchivalStage, BasicSignatureStage, BasicTimestampStage, LongTermStage, SignatureState, Stage,
};
use ades_core::{AdesError, Result, SigIdx, ValidationContext};
use serde::{Deserialize, Serialize};

/// Trace of one executed stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub id: String,
    pub summary: String,
    pub out_hash: String,
    pub deterministic: bool,
}

pub struct StageRunner {
    stages: Vec<Box<dyn Stage>>,
    pipeline_id: String,
}

impl StageRunner {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        let pipeline_id = stages
            .iter()
            .map(|s| s.id())
            .collect::<Vec<_>>()
            .join("→");

        Self { stages, pipeline_id }
    }

    /// Basic signature, basic timestamp, long-term and archival validation
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(BasicSignatureStage),
            Box::new(BasicTimestampStage),
            Box::new(LongTermStage),
            Box::new(ArchivalStage),
        ])
    }

    pub fn run(
        &self,
        ctx: &ValidationContext,
        signature: SigIdx,
    ) -> Result<(SignatureState, Vec<StageRecord>)> {
        let mut state = SignatureState::new(signature);
        let mut records = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let output = stage
                .run(ctx, &mut state)
                .map_err(|e| AdesError::Stage(e.to_string()))?;

            records.push(StageRecord {
                id: stage.id().to_string(),
                summary: output.summary,
                out_hash: self.hash_bytes(&output.bytes),
                deterministic: stage.deterministic(),
            });
        }

        Ok((state, records))
    }

    fn hash_bytes(&self, data: &[u8]) -> String {
        format!("blake3:{}", blake3::hash(data))
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_pipeline_order() {
        let runner = StageRunner::standard();
        assert_eq!(
            runner.pipeline_id(),
            "basic.signature.v1→basic.timestamp.v1→ltv.v1→adv.v1"
        );
    }

    #[test]
    fn test_hash_format() {
        let runner = StageRunner::new(Vec::new());
        let hash = runner.hash_bytes(b"conclusion");
        assert!(hash.starts_with("blake3:"));
        assert_eq!(hash.len(), "blake3:".len() + 64);
    }
}
