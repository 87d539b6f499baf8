//! Validation Context: shared read-only state of one validation run
use crate::graph::DiagnosticGraph;
use ades_policy::ValidationPolicy;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Graph, policy and the caller-supplied validation time.
///
/// Cloning is cheap; concurrent signature validation hands one clone to each
/// task.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    graph: Arc<DiagnosticGraph>,
    policy: Arc<ValidationPolicy>,
    current_time: DateTime<Utc>,
}

impl ValidationContext {
    pub fn new(graph: DiagnosticGraph, policy: ValidationPolicy, current_time: DateTime<Utc>) -> Self {
        Self {
            graph: Arc::new(graph),
            policy: Arc::new(policy),
            current_time,
        }
    }

    pub fn graph(&self) -> &DiagnosticGraph {
        &self.graph
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn current_time(&self) -> DateTime<Utc> {
        self.current_time
    }
}
