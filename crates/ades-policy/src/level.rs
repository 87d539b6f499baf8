//! Constraint levels and the statuses they produce

use serde::{Deserialize, Serialize};
use std::fmt;

/// How strongly a failed check affects the owning conclusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    /// Failure turns the owning conclusion non-PASSED
    Fail,
    /// Failure adds a warning
    Warn,
    /// Failure adds an informational note
    Inform,
    /// Check runs but its outcome is suppressed
    Ignore,
}

/// Recorded status of an executed check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Ok,
    NotOk,
    Warning,
    Information,
    Ignored,
}

impl Status {
    /// Whether this status turns the owning conclusion non-PASSED
    pub fn is_blocking(&self) -> bool {
        matches!(self, Status::NotOk)
    }
}

/// A configured level for one check.
///
/// An absent `LevelConstraint` (`None` in the policy) means the check is not
/// requested at all, which is different from [`Level::Ignore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConstraint {
    pub level: Level,
}

impl LevelConstraint {
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    pub fn fail() -> Self {
        Self::new(Level::Fail)
    }

    pub fn warn() -> Self {
        Self::new(Level::Warn)
    }

    pub fn inform() -> Self {
        Self::new(Level::Inform)
    }

    pub fn ignore() -> Self {
        Self::new(Level::Ignore)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Level::Fail => write!(f, "FAIL"),
            Level::Warn => write!(f, "WARN"),
            Level::Inform => write!(f, "INFORM"),
            Level::Ignore => write!(f, "IGNORE"),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::NotOk => write!(f, "NOT_OK"),
            Status::Warning => write!(f, "WARNING"),
            Status::Information => write!(f, "INFORMATION"),
            Status::Ignored => write!(f, "IGNORED"),
        }
    }
}
