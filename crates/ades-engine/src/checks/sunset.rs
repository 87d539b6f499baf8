//! Trust anchor sunset checks

use crate::block::Check;
use crate::checks::format_time;
use ades_core::Certificate;
use ades_policy::{ChainConstraints, MessageTag, SubIndication};
use chrono::{DateTime, Duration, Utc};

/// The anchor is used strictly before its sunset date
pub fn anchor_before_sunset(
    anchor: &Certificate,
    time: DateTime<Utc>,
    constraints: &ChainConstraints,
) -> Check {
    let check = Check::indeterminate(
        MessageTag::BbbXcvIvtbctsd,
        constraints.trust_anchor_sunset,
        anchor.is_before_sunset(time),
        SubIndication::NoCertificateChainFoundNoPoe,
    )
    .with_id(anchor.id.clone());

    match anchor.sunset_date {
        Some(sunset) => check.with_param("sunsetDate", format_time(sunset)),
        None => check,
    }
}

/// A later trust anchor validated after `anchor` could not be used
pub fn other_trust_anchor(anchor_id: &str, found: bool, constraints: &ChainConstraints) -> Check {
    Check::indeterminate(
        MessageTag::BbbXcvIotaa,
        constraints.other_trust_anchor,
        found,
        SubIndication::NoCertificateChainFoundNoPoe,
    )
    .with_id(anchor_id.to_string())
}

/// Latest instant at which the anchor is still usable
pub fn sunset_bound(anchor: &Certificate) -> Option<DateTime<Utc>> {
    anchor
        .sunset_date
        .map(|sunset| sunset - Duration::milliseconds(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ades_core::{CertificateFacts, DiagnosticData, DiagnosticGraph};
    use ades_policy::LevelConstraint;
    use chrono::TimeZone;

    fn anchor_graph(sunset: Option<DateTime<Utc>>) -> DiagnosticGraph {
        DiagnosticGraph::build(DiagnosticData {
            certificates: vec![CertificateFacts {
                id: "root".to_string(),
                not_before: Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap(),
                not_after: Utc.with_ymd_and_hms(2040, 1, 1, 0, 0, 0).unwrap(),
                self_signed: true,
                trusted: true,
                sunset_date: sunset,
                signature_intact: true,
                ocsp_no_check: false,
                signature_algorithm: None,
            }],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_sunset_is_exclusive() {
        let sunset = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let graph = anchor_graph(Some(sunset));
        let root = graph.certificate(graph.certificate_index("root").unwrap());
        let constraints = ChainConstraints {
            trust_anchor_sunset: Some(LevelConstraint::fail()),
            ..Default::default()
        };

        assert!(!anchor_before_sunset(root, sunset, &constraints).passed);
        assert!(anchor_before_sunset(root, sunset - Duration::seconds(1), &constraints).passed);
        assert_eq!(sunset_bound(root), Some(sunset - Duration::milliseconds(1)));
    }

    #[test]
    fn test_no_sunset_never_binds() {
        let graph = anchor_graph(None);
        let root = graph.certificate(graph.certificate_index("root").unwrap());
        let far = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();

        assert!(anchor_before_sunset(root, far, &ChainConstraints::default()).passed);
        assert!(sunset_bound(root).is_none());
    }
}
