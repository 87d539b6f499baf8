//! Chain checks: prospective chain, certificate signature, validity range

use crate::block::Check;
use crate::checks::{crypto, format_time};
use ades_core::Certificate;
use ades_policy::{
    AlgorithmCatalogue, CertificateConstraints, ChainConstraints, Conclusion, Indication,
    LevelConstraint, MessageTag, SubIndication,
};
use chrono::{DateTime, Utc};

/// Some path from the signer to a trust anchor exists
pub fn prospective_chain(found: bool, constraints: &ChainConstraints) -> Check {
    Check::indeterminate(
        MessageTag::BbbXcvCccbb,
        constraints.prospective_chain,
        found,
        SubIndication::NoCertificateChainFound,
    )
}

pub fn certificate_signature(
    certificate: &Certificate,
    constraints: &CertificateConstraints,
) -> Check {
    Check::indeterminate(
        MessageTag::BbbXcvIcsi,
        constraints.signature,
        certificate.signature_intact,
        SubIndication::CertificateChainGeneralFailure,
    )
    .with_id(certificate.id.clone())
}

/// Validation time lies within notBefore..=notAfter.
///
/// A revoked or not-yet-valid certificate yields OUT_OF_BOUNDS_NO_POE,
/// an expired unrevoked one OUT_OF_BOUNDS_NOT_REVOKED.
pub fn validity_range(
    certificate: &Certificate,
    time: DateTime<Utc>,
    revoked: bool,
    constraints: &CertificateConstraints,
) -> Check {
    let sub_indication = if revoked || time < certificate.not_before {
        SubIndication::OutOfBoundsNoPoe
    } else {
        SubIndication::OutOfBoundsNotRevoked
    };

    Check::indeterminate(
        MessageTag::BbbXcvIctivrsc,
        constraints.validity_range,
        certificate.is_valid_at(time),
        sub_indication,
    )
    .with_id(certificate.id.clone())
    .with_param("validationTime", format_time(time))
    .with_param("notBefore", format_time(certificate.not_before))
    .with_param("notAfter", format_time(certificate.not_after))
}

/// The issuer's signature algorithm is acceptable at `time`. `None` when
/// the certificate does not state its algorithm or signs itself.
pub fn certificate_algorithm(
    certificate: &Certificate,
    time: DateTime<Utc>,
    catalogue: &AlgorithmCatalogue,
    constraints: &CertificateConstraints,
) -> Option<Check> {
    if certificate.self_signed {
        return None;
    }
    let algorithm = certificate.signature_algorithm.as_deref()?;
    Some(
        crypto::algorithm_acceptable(
            MessageTag::BbbXcvAsccm,
            algorithm,
            time,
            catalogue,
            constraints.signature_algorithm,
        )
        .with_id(certificate.id.clone()),
    )
}

/// Per-certificate validation was conclusive. Carries the certificate's own
/// outcome when it was not.
pub fn certificate_conclusive(certificate_id: &str, outcome: &Conclusion) -> Check {
    let sub_indication = outcome
        .sub_indication()
        .unwrap_or(SubIndication::CertificateChainGeneralFailure);
    let check = match outcome.indication() {
        Indication::Failed => Check::failed(
            MessageTag::BbbXcvSub,
            Some(LevelConstraint::fail()),
            false,
            sub_indication,
        ),
        Indication::Passed | Indication::Indeterminate => Check::indeterminate(
            MessageTag::BbbXcvSub,
            Some(LevelConstraint::fail()),
            outcome.is_passed(),
            sub_indication,
        ),
    };
    check.with_id(certificate_id.to_string())
}
