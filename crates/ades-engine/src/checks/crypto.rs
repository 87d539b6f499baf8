//! Cryptographic verification checks

use crate::block::Check;
use crate::checks::format_time;
use ades_core::DigestMatcherFacts;
use ades_policy::{
    AlgorithmCatalogue, CryptographicConstraints, LevelConstraint, MessageTag, SubIndication,
};
use chrono::{DateTime, Utc};

fn reference_name(matcher: &DigestMatcherFacts) -> String {
    match &matcher.name {
        Some(name) => format!("{}:{}", matcher.kind, name),
        None => matcher.kind.clone(),
    }
}

pub fn reference_data_found(
    matcher: &DigestMatcherFacts,
    constraints: &CryptographicConstraints,
) -> Check {
    Check::indeterminate(
        MessageTag::BbbCvIrdof,
        constraints.reference_data_found,
        matcher.data_found,
        SubIndication::SignedDataNotFound,
    )
    .with_param("reference", reference_name(matcher))
}

/// A signature without any signed reference has nothing to verify
pub fn no_reference_data(constraints: &CryptographicConstraints) -> Check {
    Check::indeterminate(
        MessageTag::BbbCvIrdof,
        constraints.reference_data_found,
        false,
        SubIndication::SignedDataNotFound,
    )
}

pub fn reference_data_intact(
    matcher: &DigestMatcherFacts,
    constraints: &CryptographicConstraints,
) -> Check {
    Check::failed(
        MessageTag::BbbCvIrdoi,
        constraints.reference_data_intact,
        matcher.data_intact,
        SubIndication::HashFailure,
    )
    .with_param("reference", reference_name(matcher))
}

pub fn reference_name_match(
    matcher: &DigestMatcherFacts,
    constraints: &CryptographicConstraints,
) -> Check {
    Check::failed(
        MessageTag::BbbCvDmenmnd,
        constraints.reference_name_match,
        matcher.name_match,
        SubIndication::FormatFailure,
    )
    .with_param("reference", reference_name(matcher))
}

pub fn message_imprint_found(found: bool, constraints: &CryptographicConstraints) -> Check {
    Check::indeterminate(
        MessageTag::BbbCvTspIrdof,
        constraints.reference_data_found,
        found,
        SubIndication::SignedDataNotFound,
    )
}

pub fn message_imprint_intact(intact: bool, constraints: &CryptographicConstraints) -> Check {
    Check::failed(
        MessageTag::BbbCvTspIrdoi,
        constraints.reference_data_intact,
        intact,
        SubIndication::HashFailure,
    )
}

pub fn signature_intact(intact: bool, constraints: &CryptographicConstraints) -> Check {
    Check::failed(
        MessageTag::BbbCvIsi,
        constraints.signature_intact,
        intact,
        SubIndication::SigCryptoFailure,
    )
}

/// The algorithm is acceptable at `time`.
///
/// An unlisted algorithm yields CRYPTO_CONSTRAINTS_FAILURE. A listed one past
/// its expiry yields CRYPTO_CONSTRAINTS_FAILURE_NO_POE, which proof of
/// existence before the expiry can lift.
pub fn algorithm_acceptable(
    tag: MessageTag,
    algorithm: &str,
    time: DateTime<Utc>,
    catalogue: &AlgorithmCatalogue,
    level: Option<LevelConstraint>,
) -> Check {
    let sub_indication = if catalogue.is_listed(algorithm) {
        SubIndication::CryptoConstraintsFailureNoPoe
    } else {
        SubIndication::CryptoConstraintsFailure
    };
    let check = Check::indeterminate(tag, level, catalogue.is_secure_at(algorithm, time), sub_indication)
        .with_param("algorithm", algorithm)
        .with_param("validationTime", format_time(time));
    match catalogue.get(algorithm).and_then(|entry| entry.expires) {
        Some(expires) => check.with_param("expires", format_time(expires)),
        None => check,
    }
}

pub fn signature_algorithm(
    algorithm: &str,
    time: DateTime<Utc>,
    catalogue: &AlgorithmCatalogue,
    constraints: &CryptographicConstraints,
) -> Check {
    algorithm_acceptable(
        MessageTag::BbbCvAsccm,
        algorithm,
        time,
        catalogue,
        constraints.signature_algorithm,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn catalogue() -> AlgorithmCatalogue {
        AlgorithmCatalogue::new()
            .with("RSA-SHA1", Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).single())
            .with("RSA-SHA256", None)
    }

    #[test]
    fn test_expired_algorithm_is_recoverable() {
        let after = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let check = algorithm_acceptable(
            MessageTag::BbbCvAsccm,
            "RSA-SHA1",
            after,
            &catalogue(),
            Some(LevelConstraint::fail()),
        );
        assert!(!check.passed);
        assert_eq!(check.sub_indication, SubIndication::CryptoConstraintsFailureNoPoe);
        assert!(check.params.iter().any(|p| p.name == "expires"));

        let before = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap();
        assert!(algorithm_acceptable(MessageTag::BbbCvAsccm, "RSA-SHA1", before, &catalogue(), None).passed);
    }

    #[test]
    fn test_unlisted_algorithm_is_final() {
        let time = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let check = algorithm_acceptable(
            MessageTag::BbbCvAsccm,
            "DSA-SHA1",
            time,
            &catalogue(),
            Some(LevelConstraint::fail()),
        );
        assert!(!check.passed);
        assert_eq!(check.sub_indication, SubIndication::CryptoConstraintsFailure);
    }
}
