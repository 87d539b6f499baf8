//! Identification of the signing certificate

use crate::block::Check;
use ades_policy::{IdentificationConstraints, MessageTag, SubIndication};

pub fn signing_certificate_identified(
    identified: bool,
    constraints: &IdentificationConstraints,
) -> Check {
    Check::indeterminate(
        MessageTag::BbbIcsIsci,
        constraints.signing_certificate_identified,
        identified,
        SubIndication::NoSigningCertificateFound,
    )
}

pub fn signing_certificate_digest_match(
    digest_match: bool,
    constraints: &IdentificationConstraints,
) -> Check {
    Check::indeterminate(
        MessageTag::BbbIcsIcdvv,
        constraints.signing_certificate_digest_match,
        digest_match,
        SubIndication::NoSigningCertificateFound,
    )
}
