//! Validation time sliding
//!
//! Computes the control time of one anchor path: the latest instant at which
//! every certificate on the path can be shown to have been trusted. The slide
//! starts from the token's best proof of existence and only ever moves
//! earlier.

use crate::block::{Block, Check};
use crate::checks::{format_time, revocation, sunset};
use crate::poe::FrozenPoe;
use crate::token::TokenRef;
use crate::xcv::{is_anchor, AnchorPath};
use ades_core::{ObjectRef, ValidationContext};
use ades_policy::{Conclusion, LevelConstraint, MessageTag, SubIndication, ValidationModel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VtsResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    pub start_time: DateTime<Utc>,
    pub control_time: DateTime<Utc>,
    #[serde(flatten)]
    pub block: Block,
}

impl VtsResult {
    pub fn conclusion(&self) -> &Conclusion {
        &self.block.conclusion
    }
}

fn revocation_issuance(id: &str, passed: bool, sub_indication: SubIndication, control: DateTime<Utc>) -> Check {
    Check::indeterminate(
        MessageTag::CtsDrie,
        Some(LevelConstraint::fail()),
        passed,
        sub_indication,
    )
    .with_id(id.to_string())
    .with_param("controlTime", format_time(control))
}

/// Slide the control time along one anchor path
pub fn slide(
    ctx: &ValidationContext,
    token: TokenRef,
    path: &AnchorPath,
    poe: &FrozenPoe,
) -> VtsResult {
    let graph = ctx.graph();
    let model = ctx.policy().model();
    let start = token.best_poe(graph, poe, false);
    let mut control = start;
    let mut block = Block::new();

    for &idx in &path.certificates {
        let certificate = graph.certificate(idx);

        if is_anchor(model, path, idx, certificate) {
            if let (Some(sunset_date), Some(bound)) =
                (certificate.sunset_date, sunset::sunset_bound(certificate))
            {
                block.apply(
                    Check::indeterminate(
                        MessageTag::CtsIsd,
                        Some(LevelConstraint::inform()),
                        control <= bound,
                        SubIndication::NoCertificateChainFoundNoPoe,
                    )
                    .with_id(certificate.id.clone())
                    .with_param("sunsetDate", format_time(sunset_date)),
                );
                control = control.min(bound);
            }
            // SHELL anchors still slide on their own revocation data
            if model != ValidationModel::Shell {
                continue;
            }
        }

        if !certificate.needs_revocation_check() {
            continue;
        }

        let selected = revocation::latest_acceptable(graph, idx, ctx.current_time())
            .map(|r| graph.revocation(r));
        match selected {
            Some(data) if data.is_revoked() => match data.revocation_date {
                Some(date) => {
                    if date < control {
                        control = date;
                    }
                    control = control.min(data.this_update);
                    block.apply(revocation_issuance(&certificate.id, true, SubIndication::NoPoe, control));
                }
                None => {
                    block.apply(revocation_issuance(&certificate.id, false, SubIndication::NoPoe, control));
                }
            },
            Some(data) => {
                control = control.min(data.this_update);
                block.apply(revocation_issuance(&certificate.id, true, SubIndication::NoPoe, control));
            }
            None => {
                let proven = poe.has_proof_at_or_before(ObjectRef::Certificate(idx), certificate.not_after);
                if proven {
                    control = control.min(certificate.not_after);
                    block.apply(revocation_issuance(&certificate.id, true, SubIndication::NoPoe, control));
                } else if certificate.is_valid_at(control) {
                    block.apply(revocation_issuance(&certificate.id, false, SubIndication::TryLater, control));
                } else {
                    block.apply(revocation_issuance(&certificate.id, false, SubIndication::NoPoe, control));
                }
            }
        }
    }

    block.apply(
        Check::indeterminate(
            MessageTag::CtsSct,
            Some(LevelConstraint::inform()),
            control == start,
            SubIndication::NoPoe,
        )
        .with_param("controlTime", format_time(control)),
    );

    let anchor = path.anchor.map(|anchor| graph.certificate(anchor).id.clone());
    debug!(
        token = token.id(graph),
        anchor = ?anchor,
        start = %format_time(start),
        control = %format_time(control),
        conclusion = %block.conclusion,
        "control time computed"
    );

    VtsResult {
        anchor,
        start_time: start,
        control_time: control,
        block,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poe::{PoeModel, PoeRecord};
    use crate::xcv::anchor_paths;
    use ades_core::{
        CertificateFacts, DiagnosticData, DiagnosticGraph, RevocationFacts, RevocationKind,
        RevocationStatus, SignatureFacts,
    };
    use ades_policy::{Indication, Status, ValidationPolicy};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn cert(id: &str, trusted: bool) -> CertificateFacts {
        CertificateFacts {
            id: id.to_string(),
            not_before: now() - Duration::days(1000),
            not_after: now() + Duration::days(1000),
            self_signed: trusted,
            trusted,
            sunset_date: None,
            signature_intact: true,
            ocsp_no_check: false,
            signature_algorithm: None,
        }
    }

    fn crl(certificate: &str, this_update: DateTime<Utc>) -> RevocationFacts {
        RevocationFacts {
            id: format!("crl-{}", certificate),
            certificate_id: certificate.to_string(),
            kind: RevocationKind::Crl,
            production_date: this_update,
            this_update,
            next_update: Some(this_update + Duration::days(30)),
            status: RevocationStatus::Good,
            revocation_date: None,
            reason: None,
            signature_intact: true,
        }
    }

    fn context(mut root: CertificateFacts, revocations: Vec<RevocationFacts>) -> ValidationContext {
        root.trusted = true;
        let graph = DiagnosticGraph::build(DiagnosticData {
            certificates: vec![cert("leaf", false), root],
            revocations,
            signatures: vec![SignatureFacts {
                id: "sig".to_string(),
                certificate_chain: vec!["leaf".to_string(), "root".to_string()],
                signing_certificate_identified: true,
                signing_certificate_digest_match: true,
                signature_intact: true,
                signature_algorithm: None,
                digest_matchers: vec![],
                claimed_signing_time: None,
                timestamps: vec![],
            }],
            ..Default::default()
        })
        .unwrap();
        ValidationContext::new(graph, ValidationPolicy::etsi_default(), now())
    }

    fn run(ctx: &ValidationContext, poe: PoeModel) -> VtsResult {
        let sig = ctx.graph().signature_index("sig").unwrap();
        let token = TokenRef::Signature(sig);
        let paths = anchor_paths(ctx, token.chain(ctx.graph()), ctx.policy().model());
        slide(ctx, token, &paths[0], &poe.freeze())
    }

    #[test]
    fn test_revocation_this_update_tightens() {
        let issued = now() - Duration::days(3);
        let ctx = context(cert("root", true), vec![crl("leaf", issued)]);
        let result = run(&ctx, PoeModel::new(now()));

        assert_eq!(result.start_time, now());
        assert_eq!(result.control_time, issued);
        assert!(result.conclusion().is_passed());
        assert_eq!(result.block.status_of(MessageTag::CtsSct), Some(Status::Information));
    }

    #[test]
    fn test_sunset_tightens_below_sunset_date() {
        let sunset_date = now() - Duration::days(10);
        let mut root = cert("root", true);
        root.sunset_date = Some(sunset_date);
        let ctx = context(root, vec![crl("leaf", now() - Duration::days(1))]);
        let result = run(&ctx, PoeModel::new(now()));

        assert!(result.control_time < sunset_date);
        assert_eq!(result.block.status_of(MessageTag::CtsIsd), Some(Status::Information));
    }

    #[test]
    fn test_missing_revocation_without_poe() {
        let ctx = context(cert("root", true), vec![]);
        let result = run(&ctx, PoeModel::new(now()));

        assert_eq!(result.conclusion().indication(), Indication::Indeterminate);
        assert_eq!(result.conclusion().sub_indication(), Some(SubIndication::TryLater));
    }

    #[test]
    fn test_missing_revocation_with_certificate_poe() {
        let ctx = context(cert("root", true), vec![]);
        let leaf = ctx.graph().certificate_index("leaf").unwrap();
        let mut poe = PoeModel::new(now());
        poe.add(
            ObjectRef::Certificate(leaf),
            PoeRecord {
                time: now() - Duration::days(20),
                timestamp: "tst".to_string(),
                sunset_warned: false,
            },
        );
        let result = run(&ctx, poe);

        assert!(result.conclusion().is_passed());
        assert_eq!(result.control_time, now());
    }

    #[test]
    fn test_revocation_date_before_start() {
        let mut revoked = crl("leaf", now() - Duration::days(2));
        revoked.status = RevocationStatus::Revoked;
        revoked.revocation_date = Some(now() - Duration::days(5));
        let ctx = context(cert("root", true), vec![revoked]);
        let result = run(&ctx, PoeModel::new(now()));

        assert!(result.conclusion().is_passed());
        assert_eq!(result.control_time, now() - Duration::days(5));
    }
}
