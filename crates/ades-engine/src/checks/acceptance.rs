//! Signature acceptance checks

use crate::block::Check;
use crate::checks::format_time;
use ades_policy::{AcceptanceConstraints, MessageTag, SubIndication};
use chrono::{DateTime, Utc};

/// A claimed signing time is present in the signed attributes
pub fn signing_time_present(
    claimed: Option<DateTime<Utc>>,
    constraints: &AcceptanceConstraints,
) -> Check {
    let check = Check::indeterminate(
        MessageTag::BbbSavIsqpstp,
        constraints.signing_time,
        claimed.is_some(),
        SubIndication::SigConstraintsFailure,
    );
    match claimed {
        Some(time) => check.with_param("signingTime", format_time(time)),
        None => check,
    }
}
