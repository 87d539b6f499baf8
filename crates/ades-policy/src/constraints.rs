//! Level-driven constraint evaluation
//!
//! [`evaluate`] is the single place where a check predicate meets its
//! configured level. It is pure: the caller decides what to do with the
//! returned status and message.

use crate::level::{Level, LevelConstraint, Status};
use crate::messages::{Message, MessageTag, Param};
use serde::{Deserialize, Serialize};

/// Which message list a finding belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A message produced by a non-OK evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub message: Message,
}

/// Result of evaluating one check against its level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub status: Status,
    pub finding: Option<Finding>,
    /// Evaluated at IGNORE level: the report entry carries no details
    pub silent: bool,
}

/// Map a predicate outcome and a level to a status and optional message.
///
/// | level  | passed | failed      |
/// |--------|--------|-------------|
/// | FAIL   | OK     | NOT_OK      |
/// | WARN   | OK     | WARNING     |
/// | INFORM | OK     | INFORMATION |
/// | IGNORE | OK     | IGNORED     |
///
/// IGNORE never produces a message, whatever the predicate.
pub fn evaluate(tag: MessageTag, passed: bool, constraint: &LevelConstraint) -> Evaluation {
    let silent = constraint.level == Level::Ignore;
    if passed {
        return Evaluation {
            status: Status::Ok,
            finding: None,
            silent,
        };
    }

    let (status, severity) = match constraint.level {
        Level::Fail => (Status::NotOk, Some(Severity::Error)),
        Level::Warn => (Status::Warning, Some(Severity::Warning)),
        Level::Inform => (Status::Information, Some(Severity::Info)),
        Level::Ignore => (Status::Ignored, None),
    };

    Evaluation {
        status,
        finding: severity.map(|severity| Finding {
            severity,
            message: Message::answer(tag),
        }),
        silent,
    }
}

/// One executed check as it appears in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: MessageTag,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Message>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_info: Vec<Param>,
    /// Object the check was run against, when it is not the block's owner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Constraint {
    /// Build the report entry for an evaluation.
    ///
    /// Parameters are attached both to the emitted message and to the
    /// additional info, except for IGNORED entries which carry neither.
    pub fn record(
        name: MessageTag,
        evaluation: &Evaluation,
        params: Vec<Param>,
        id: Option<String>,
    ) -> Self {
        let mut constraint = Self {
            name,
            status: evaluation.status,
            error: None,
            warning: None,
            info: None,
            additional_info: Vec::new(),
            id,
        };

        if evaluation.silent {
            return constraint;
        }

        if let Some(finding) = &evaluation.finding {
            let message = finding.message.clone().with_params(params.clone());
            match finding.severity {
                Severity::Error => constraint.error = Some(message),
                Severity::Warning => constraint.warning = Some(message),
                Severity::Info => constraint.info = Some(message),
            }
        }
        constraint.additional_info = params;
        constraint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVELS: [Level; 4] = [Level::Fail, Level::Warn, Level::Inform, Level::Ignore];

    #[test]
    fn test_level_table() {
        let expected = [
            (Level::Fail, Status::NotOk, Some(Severity::Error)),
            (Level::Warn, Status::Warning, Some(Severity::Warning)),
            (Level::Inform, Status::Information, Some(Severity::Info)),
            (Level::Ignore, Status::Ignored, None),
        ];

        for (level, status, severity) in expected {
            let ok = evaluate(MessageTag::BbbXcvIcsi, true, &LevelConstraint::new(level));
            assert_eq!(ok.status, Status::Ok);
            assert!(ok.finding.is_none());

            let not_ok = evaluate(MessageTag::BbbXcvIcsi, false, &LevelConstraint::new(level));
            assert_eq!(not_ok.status, status, "level {}", level);
            assert_eq!(not_ok.finding.map(|f| f.severity), severity, "level {}", level);
        }
    }

    #[test]
    fn test_ignore_is_silent_for_any_predicate() {
        for passed in [true, false] {
            let evaluation = evaluate(MessageTag::BbbXcvRfc, passed, &LevelConstraint::ignore());
            let constraint = Constraint::record(
                MessageTag::BbbXcvRfc,
                &evaluation,
                vec![Param::new("revocation", "R-1")],
                None,
            );
            assert!(constraint.error.is_none());
            assert!(constraint.warning.is_none());
            assert!(constraint.info.is_none());
            assert!(constraint.additional_info.is_empty());
            assert!(evaluation.silent);
        }
    }

    #[test]
    fn test_only_fail_level_blocks() {
        for level in LEVELS {
            let evaluation = evaluate(MessageTag::BbbCvIsi, false, &LevelConstraint::new(level));
            assert_eq!(evaluation.status.is_blocking(), level == Level::Fail);
        }
    }

    #[test]
    fn test_record_attaches_params_to_message() {
        let evaluation = evaluate(MessageTag::BbbXcvIscr, false, &LevelConstraint::warn());
        let constraint = Constraint::record(
            MessageTag::BbbXcvIscr,
            &evaluation,
            vec![Param::new("revocationDate", "2024-01-01T00:00:00.000Z")],
            Some("C-2".to_string()),
        );
        let warning = constraint.warning.unwrap();
        assert_eq!(warning.key, "BBB_XCV_ISCR_ANS");
        assert_eq!(warning.params.len(), 1);
        assert_eq!(constraint.additional_info.len(), 1);
        assert_eq!(constraint.id.as_deref(), Some("C-2"));
    }
}
