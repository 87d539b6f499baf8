//! Revocation checks and revocation data selection

use crate::block::Check;
use crate::checks::format_time;
use ades_core::{CertIdx, Certificate, DiagnosticGraph, RevIdx, Revocation, RevocationStatus};
use ades_policy::{
    CertificateConstraints, MessageTag, RevocationFreshness, SubContext, SubIndication,
};
use chrono::{DateTime, Utc};

/// Revocation data usable for `certificate`: signature verifies, status is
/// known, issued within the certificate validity and not after `current_time`.
pub fn is_acceptable(
    revocation: &Revocation,
    certificate: &Certificate,
    current_time: DateTime<Utc>,
) -> bool {
    revocation.signature_intact
        && revocation.status != RevocationStatus::Unknown
        && certificate.is_valid_at(revocation.this_update)
        && revocation.this_update <= current_time
}

/// Latest acceptable revocation data for a certificate
pub fn latest_acceptable(
    graph: &DiagnosticGraph,
    certificate: CertIdx,
    current_time: DateTime<Utc>,
) -> Option<RevIdx> {
    let cert = graph.certificate(certificate);
    cert.revocations()
        .iter()
        .copied()
        .filter(|idx| is_acceptable(graph.revocation(*idx), cert, current_time))
        .max_by(|a, b| {
            let (ra, rb) = (graph.revocation(*a), graph.revocation(*b));
            ra.this_update
                .cmp(&rb.this_update)
                .then(ra.production_date.cmp(&rb.production_date))
                // earlier arena entry wins ties
                .then(b.cmp(a))
        })
}

/// Revocation time of a certificate known to be revoked
pub fn revocation_time(
    graph: &DiagnosticGraph,
    certificate: CertIdx,
    current_time: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    latest_acceptable(graph, certificate, current_time)
        .map(|idx| graph.revocation(idx))
        .filter(|revocation| revocation.is_revoked())
        .and_then(|revocation| revocation.revocation_date)
}

/// Fresh at `time`: within the policy maximum age when one is set, else not
/// past the revocation's next update. Data without either bound is fresh.
/// A maximum age that is negative or too large for a duration counts as
/// unset.
pub fn is_fresh(
    revocation: &Revocation,
    time: DateTime<Utc>,
    freshness: &RevocationFreshness,
) -> bool {
    match (freshness.max_age(), revocation.next_update) {
        (Some(max_age), _) => time - revocation.this_update <= max_age,
        (None, Some(next_update)) => time <= next_update,
        (None, None) => true,
    }
}

pub fn revocation_data_available(
    certificate: &Certificate,
    constraints: &CertificateConstraints,
) -> Check {
    Check::indeterminate(
        MessageTag::BbbXcvIrdpfc,
        constraints.revocation_data_available,
        !certificate.revocations().is_empty(),
        SubIndication::TryLater,
    )
    .with_id(certificate.id.clone())
}

pub fn acceptable_revocation(
    certificate: &Certificate,
    selected: Option<&Revocation>,
    constraints: &CertificateConstraints,
) -> Check {
    let check = Check::indeterminate(
        MessageTag::BbbXcvIardpfc,
        constraints.acceptable_revocation_data,
        selected.is_some(),
        SubIndication::TryLater,
    )
    .with_id(certificate.id.clone());
    match selected {
        Some(revocation) => check.with_param("revocation", revocation.id.clone()),
        None => check,
    }
}

pub fn freshness(
    revocation: &Revocation,
    time: DateTime<Utc>,
    freshness: &RevocationFreshness,
    constraints: &CertificateConstraints,
) -> Check {
    Check::indeterminate(
        MessageTag::BbbXcvRfc,
        constraints.revocation_freshness,
        is_fresh(revocation, time, freshness),
        SubIndication::TryLater,
    )
    .with_id(revocation.id.clone())
    .with_param("thisUpdate", format_time(revocation.this_update))
}

/// Not revoked before `time`. The signing certificate and CA certificates
/// map to different sub-indications.
pub fn not_revoked(
    revocation: &Revocation,
    time: DateTime<Utc>,
    sub_context: SubContext,
    constraints: &CertificateConstraints,
) -> Check {
    let sub_indication = match sub_context {
        SubContext::SigningCert => SubIndication::RevokedNoPoe,
        SubContext::CaCertificate => SubIndication::RevokedCaNoPoe,
    };
    let check = Check::indeterminate(
        MessageTag::BbbXcvIscr,
        constraints.not_revoked,
        !revocation.is_revoked_before(time),
        sub_indication,
    )
    .with_id(revocation.id.clone());

    match (revocation.revocation_date, &revocation.reason) {
        (Some(date), Some(reason)) => check
            .with_param("revocationDate", format_time(date))
            .with_param("reason", reason.clone()),
        (Some(date), None) => check.with_param("revocationDate", format_time(date)),
        (None, _) => check,
    }
}

pub fn not_on_hold(revocation: &Revocation, constraints: &CertificateConstraints) -> Check {
    Check::indeterminate(
        MessageTag::BbbXcvIscoh,
        constraints.not_on_hold,
        !revocation.is_on_hold(),
        SubIndication::TryLater,
    )
    .with_id(revocation.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ades_core::{CertificateFacts, DiagnosticData, RevocationFacts, RevocationKind};
    use chrono::{Duration, TimeZone};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    fn crl(id: &str, this_update: DateTime<Utc>, status: RevocationStatus) -> RevocationFacts {
        RevocationFacts {
            id: id.to_string(),
            certificate_id: "leaf".to_string(),
            kind: RevocationKind::Crl,
            production_date: this_update,
            this_update,
            next_update: Some(this_update + Duration::days(7)),
            status,
            revocation_date: None,
            reason: None,
            signature_intact: true,
        }
    }

    fn graph(revocations: Vec<RevocationFacts>) -> DiagnosticGraph {
        DiagnosticGraph::build(DiagnosticData {
            certificates: vec![CertificateFacts {
                id: "leaf".to_string(),
                not_before: day(1) - Duration::days(365),
                not_after: day(1) + Duration::days(365),
                self_signed: false,
                trusted: false,
                sunset_date: None,
                signature_intact: true,
                ocsp_no_check: false,
                signature_algorithm: None,
            }],
            revocations,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_latest_acceptable_skips_unusable_data() {
        let mut broken = crl("broken", day(20), RevocationStatus::Good);
        broken.signature_intact = false;
        let graph = graph(vec![
            crl("old", day(2), RevocationStatus::Good),
            crl("new", day(10), RevocationStatus::Good),
            broken,
            crl("unknown", day(15), RevocationStatus::Unknown),
            crl("future", day(28), RevocationStatus::Good),
        ]);
        let leaf = graph.certificate_index("leaf").unwrap();

        let selected = latest_acceptable(&graph, leaf, day(25)).unwrap();
        assert_eq!(graph.revocation(selected).id, "new");
    }

    #[test]
    fn test_freshness_bounds() {
        let graph = graph(vec![crl("crl", day(10), RevocationStatus::Good)]);
        let revocation = graph.revocation(graph.certificate(graph.certificate_index("leaf").unwrap()).revocations()[0]);

        let by_next_update = RevocationFreshness::default();
        assert!(is_fresh(revocation, day(17), &by_next_update));
        assert!(!is_fresh(revocation, day(18), &by_next_update));

        let one_day = RevocationFreshness {
            max_age_seconds: Some(86_400),
        };
        assert!(is_fresh(revocation, day(11), &one_day));
        assert!(!is_fresh(revocation, day(12), &one_day));
    }

    #[test]
    fn test_unrepresentable_max_age_falls_back_to_next_update() {
        let graph = graph(vec![crl("crl", day(10), RevocationStatus::Good)]);
        let revocation = graph.revocation(graph.certificate(graph.certificate_index("leaf").unwrap()).revocations()[0]);

        for max_age_seconds in [i64::MAX, i64::MIN, -1] {
            let freshness = RevocationFreshness {
                max_age_seconds: Some(max_age_seconds),
            };
            assert!(is_fresh(revocation, day(17), &freshness));
            assert!(!is_fresh(revocation, day(18), &freshness));
        }
    }

    #[test]
    fn test_revocation_time_only_for_revoked() {
        let mut revoked = crl("revoked", day(10), RevocationStatus::Revoked);
        revoked.revocation_date = Some(day(5));
        let graph = graph(vec![revoked]);
        let leaf = graph.certificate_index("leaf").unwrap();
        assert_eq!(revocation_time(&graph, leaf, day(20)), Some(day(5)));

        let good = self::graph(vec![crl("good", day(10), RevocationStatus::Good)]);
        let leaf = good.certificate_index("leaf").unwrap();
        assert_eq!(revocation_time(&good, leaf, day(20)), None);
    }

    #[test]
    fn test_not_revoked_sub_indication_by_position() {
        let mut revoked = crl("revoked", day(10), RevocationStatus::Revoked);
        revoked.revocation_date = Some(day(5));
        let graph = graph(vec![revoked]);
        let revocation = graph.revocation(graph.certificate(graph.certificate_index("leaf").unwrap()).revocations()[0]);
        let constraints = CertificateConstraints::strict();

        let leaf = not_revoked(revocation, day(6), SubContext::SigningCert, &constraints);
        assert!(!leaf.passed);
        assert_eq!(leaf.sub_indication, SubIndication::RevokedNoPoe);

        let ca = not_revoked(revocation, day(6), SubContext::CaCertificate, &constraints);
        assert_eq!(ca.sub_indication, SubIndication::RevokedCaNoPoe);

        // revocation is strictly before the validation time
        assert!(not_revoked(revocation, day(5), SubContext::SigningCert, &constraints).passed);
    }
}
