//! Check categories
//!
//! Each function evaluates one predicate over the diagnostic facts and
//! returns a [`Check`](crate::block::Check) carrying the configured level
//! and the outcome to use on failure. Nothing here records or aggregates;
//! the building blocks run the checks in a fixed order.

pub mod acceptance;
pub mod chain;
pub mod crypto;
pub mod identification;
pub mod revocation;
pub mod sunset;

use chrono::{DateTime, SecondsFormat, Utc};

/// Stable rendering of instants in message parameters
pub(crate) fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
