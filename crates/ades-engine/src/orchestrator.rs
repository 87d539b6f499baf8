//! Validation orchestrator
//!
//! Runs the stage pipeline once per signature and assembles the detailed
//! report. Signatures share nothing but the read-only graph and policy, so
//! they can be validated on separate blocking tasks; results are joined in
//! graph order, which keeps the report identical to a sequential run.

use crate::report::{DetailedReport, SignatureReport};
use crate::runner::{StageRecord, StageRunner};
use crate::stage::SignatureState;
use ades_core::{AdesError, Result, SigIdx, ValidationContext};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct ValidationOrchestrator {
    runner: Arc<StageRunner>,
}

impl Default for ValidationOrchestrator {
    fn default() -> Self {
        Self::new(StageRunner::standard())
    }
}

impl ValidationOrchestrator {
    pub fn new(runner: StageRunner) -> Self {
        Self {
            runner: Arc::new(runner),
        }
    }

    pub fn pipeline_id(&self) -> &str {
        self.runner.pipeline_id()
    }

    /// Validate a single signature through every stage
    pub fn validate_signature(&self, ctx: &ValidationContext, signature: SigIdx) -> Result<SignatureReport> {
        let (state, stages) = self.runner.run(ctx, signature)?;
        into_report(ctx, state, stages)
    }

    /// Validate every signature of the graph, one after the other
    pub fn validate(&self, ctx: &ValidationContext) -> Result<DetailedReport> {
        let signatures = ctx
            .graph()
            .signatures()
            .map(|(idx, _)| self.validate_signature(ctx, idx))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.report(ctx, signatures))
    }

    /// Validate every signature on its own blocking task
    pub async fn validate_concurrently(&self, ctx: &ValidationContext) -> Result<DetailedReport> {
        let handles: Vec<_> = ctx
            .graph()
            .signatures()
            .map(|(idx, _)| {
                let orchestrator = self.clone();
                let ctx = ctx.clone();
                tokio::task::spawn_blocking(move || orchestrator.validate_signature(&ctx, idx))
            })
            .collect();

        let mut signatures = Vec::with_capacity(handles.len());
        for handle in handles {
            let report = handle.await.map_err(|e| {
                warn!(error = %e, "signature validation task failed");
                AdesError::Task(e.to_string())
            })??;
            signatures.push(report);
        }
        Ok(self.report(ctx, signatures))
    }

    fn report(&self, ctx: &ValidationContext, signatures: Vec<SignatureReport>) -> DetailedReport {
        info!(
            policy = %ctx.policy().name,
            signatures = signatures.len(),
            "validation finished"
        );
        DetailedReport {
            validation_time: ctx.current_time(),
            policy: ctx.policy().name.clone(),
            model: ctx.policy().model(),
            pipeline: self.pipeline_id().to_string(),
            signatures,
        }
    }
}

fn into_report(
    ctx: &ValidationContext,
    state: SignatureState,
    stages: Vec<StageRecord>,
) -> Result<SignatureReport> {
    let incomplete = |stage: &str| AdesError::Stage(format!("pipeline ended without {}", stage));
    let id = ctx.graph().signature(state.signature).id.clone();

    Ok(SignatureReport {
        id,
        basic: state.basic.ok_or_else(|| incomplete("basic.signature.v1"))?,
        timestamps: state.timestamps.into_iter().map(|t| t.bbb).collect(),
        long_term: state.long_term.ok_or_else(|| incomplete("ltv.v1"))?,
        archival: state.archival.ok_or_else(|| incomplete("adv.v1"))?,
        stages,
    })
}
