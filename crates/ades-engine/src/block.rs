//! Constraint recorder
//!
//! A [`Block`] collects executed checks in order and derives its conclusion
//! from them: the first NOT_OK check decides the indication, every finding
//! lands in the matching message list.

use ades_policy::{
    evaluate, Conclusion, Constraint, Indication, LevelConstraint, MessageTag, Param, Severity,
    Status, SubIndication,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One check outcome waiting to be recorded
#[derive(Debug, Clone)]
pub struct Check {
    pub tag: MessageTag,
    pub constraint: Option<LevelConstraint>,
    pub passed: bool,
    pub indication: Indication,
    pub sub_indication: SubIndication,
    pub params: Vec<Param>,
    pub id: Option<String>,
}

impl Check {
    /// A check that yields INDETERMINATE when it fails at FAIL level
    pub fn indeterminate(
        tag: MessageTag,
        constraint: Option<LevelConstraint>,
        passed: bool,
        sub_indication: SubIndication,
    ) -> Self {
        Self {
            tag,
            constraint,
            passed,
            indication: Indication::Indeterminate,
            sub_indication,
            params: Vec::new(),
            id: None,
        }
    }

    /// A check that yields FAILED when it fails at FAIL level
    pub fn failed(
        tag: MessageTag,
        constraint: Option<LevelConstraint>,
        passed: bool,
        sub_indication: SubIndication,
    ) -> Self {
        Self {
            indication: Indication::Failed,
            ..Self::indeterminate(tag, constraint, passed, sub_indication)
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push(Param::new(name, value));
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub constraints: Vec<Constraint>,
    pub conclusion: Conclusion,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a check. Returns its status, or `None` when the policy does
    /// not request it.
    pub fn apply(&mut self, check: Check) -> Option<Status> {
        let Some(constraint) = check.constraint else {
            debug!(check = %check.tag, "check not requested");
            return None;
        };

        let evaluation = evaluate(check.tag, check.passed, &constraint);
        let recorded = Constraint::record(check.tag, &evaluation, check.params, check.id);

        if let Some(finding) = &evaluation.finding {
            let message = recorded
                .error
                .clone()
                .or_else(|| recorded.warning.clone())
                .or_else(|| recorded.info.clone())
                .unwrap_or_else(|| finding.message.clone());
            match finding.severity {
                Severity::Error => self.conclusion.errors.push(message),
                Severity::Warning => self.conclusion.warnings.push(message),
                Severity::Info => self.conclusion.infos.push(message),
            }
        }

        if evaluation.status.is_blocking() && self.conclusion.is_passed() {
            match check.indication {
                Indication::Failed => self.conclusion.set_failed(check.sub_indication),
                Indication::Indeterminate | Indication::Passed => {
                    self.conclusion.set_indeterminate(check.sub_indication)
                }
            }
        }

        self.constraints.push(recorded);
        Some(evaluation.status)
    }

    pub fn is_passed(&self) -> bool {
        self.conclusion.is_passed()
    }

    /// First recorded entry for a check
    pub fn constraint(&self, tag: MessageTag) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == tag)
    }

    /// Status of the first recorded entry for a check
    pub fn status_of(&self, tag: MessageTag) -> Option<Status> {
        self.constraint(tag).map(|c| c.status)
    }
}
