//! Past signature validation
//!
//! Tries to lift a POE-recoverable INDETERMINATE conclusion: the chain must
//! validate as of some control time, the token must be proven to exist at or
//! before it, and the specific reason for the original conclusion must be
//! shown not to apply at that earlier time. A failed check keeps the original
//! indication and sub-indication, except that a best signature time before
//! the signing certificate was issued fails the token as NOT_YET_VALID.

use crate::block::{Block, Check};
use crate::checks::{format_time, revocation};
use crate::pcv::{self, PcvResult};
use crate::poe::FrozenPoe;
use crate::token::TokenRef;
use ades_core::{DiagnosticGraph, ObjectRef, ValidationContext};
use ades_policy::{
    Conclusion, Indication, LevelConstraint, MessageTag, SubIndication, ValidationModel,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsvResult {
    #[serde(flatten)]
    pub block: Block,
    pub pcv: PcvResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_signature_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_time: Option<DateTime<Utc>>,
    /// Outcome after recovery: PASSED, NOT_YET_VALID, or the original outcome
    pub conclusion: Conclusion,
}

/// A check whose failure keeps the conclusion under recovery
fn keeping(tag: MessageTag, passed: bool, current: &Conclusion) -> Check {
    let sub_indication = current
        .sub_indication()
        .unwrap_or(SubIndication::NoPoe);
    match current.indication() {
        Indication::Failed => Check::failed(tag, Some(LevelConstraint::fail()), passed, sub_indication),
        Indication::Passed | Indication::Indeterminate => {
            Check::indeterminate(tag, Some(LevelConstraint::fail()), passed, sub_indication)
        }
    }
}

/// Best signature time is not before the signing certificate was issued
fn issued_before(graph: &DiagnosticGraph, token: TokenRef, best: DateTime<Utc>) -> Check {
    let not_before = token
        .signing_certificate(graph)
        .map(|idx| graph.certificate(idx).not_before);
    let check = Check::failed(
        MessageTag::TsvIbstaidosc,
        Some(LevelConstraint::fail()),
        not_before.map(|time| best >= time).unwrap_or(false),
        SubIndication::NotYetValid,
    )
    .with_param("bestSignatureTime", format_time(best));
    match not_before {
        Some(time) => check.with_param("notBefore", format_time(time)),
        None => check,
    }
}

/// Best signature time is not after the signing certificate expired
fn within_validity(
    graph: &DiagnosticGraph,
    token: TokenRef,
    best: DateTime<Utc>,
    sub_indication: SubIndication,
) -> Check {
    let not_after = token
        .signing_certificate(graph)
        .map(|idx| graph.certificate(idx).not_after);
    let check = Check::indeterminate(
        MessageTag::PsvIbstbsce,
        Some(LevelConstraint::fail()),
        not_after.map(|time| best <= time).unwrap_or(false),
        sub_indication,
    );
    match not_after {
        Some(time) => check.with_param("notAfter", format_time(time)),
        None => check,
    }
}

fn ca_revoked_after(
    ctx: &ValidationContext,
    token: TokenRef,
    best: DateTime<Utc>,
    current: &Conclusion,
) -> Check {
    let graph = ctx.graph();
    // earliest revocation among the CA certificates of the chain
    let revoked_at = token
        .chain(graph)
        .iter()
        .skip(1)
        .filter_map(|idx| revocation::revocation_time(graph, *idx, ctx.current_time()))
        .min();
    let check = keeping(
        MessageTag::PsvIpcriaidbedc,
        revoked_at.map(|time| best <= time).unwrap_or(true),
        current,
    );
    match revoked_at {
        Some(time) => check.with_param("revocationDate", format_time(time)),
        None => check,
    }
}

/// Every algorithm rejected today was still reliable when it was used: the
/// token's own at the best signature time, a certificate's at the best
/// signature time or at a proof of the certificate before the expiry.
fn algorithms_reliable(
    ctx: &ValidationContext,
    token: TokenRef,
    best: DateTime<Utc>,
    poe: &FrozenPoe,
    current: &Conclusion,
) -> Check {
    let graph = ctx.graph();
    let catalogue = &ctx.policy().algorithms;
    let now = ctx.current_time();
    let mut unreliable = Vec::new();

    if let Some(algorithm) = token.signature_algorithm(graph) {
        if !catalogue.is_secure_at(algorithm, now) && !catalogue.is_secure_at(algorithm, best) {
            unreliable.push(token.id(graph).to_string());
        }
    }
    for &idx in token.chain(graph) {
        let certificate = graph.certificate(idx);
        let Some(algorithm) = certificate.signature_algorithm.as_deref() else {
            continue;
        };
        if certificate.self_signed || catalogue.is_secure_at(algorithm, now) {
            continue;
        }
        let proven = catalogue
            .get(algorithm)
            .and_then(|entry| entry.expires)
            .map(|expires| {
                best < expires
                    || poe.exists_at_or_before(
                        ObjectRef::Certificate(idx),
                        expires - Duration::milliseconds(1),
                    )
            })
            .unwrap_or(false);
        if !proven {
            unreliable.push(certificate.id.clone());
        }
    }

    let check = keeping(MessageTag::TsvWacrabst, unreliable.is_empty(), current)
        .with_param("bestSignatureTime", format_time(best));
    if unreliable.is_empty() {
        check
    } else {
        check.with_param("objects", unreliable.join(", "))
    }
}

/// Revocation data of the chain was fresh at the best signature time
fn fresh_at(
    ctx: &ValidationContext,
    token: TokenRef,
    best: DateTime<Utc>,
    current: &Conclusion,
) -> Vec<Check> {
    let graph = ctx.graph();
    let model = ctx.policy().model();
    token
        .chain(graph)
        .iter()
        .filter(|idx| {
            let certificate = graph.certificate(**idx);
            certificate.needs_revocation_check()
                && (!certificate.trusted || model == ValidationModel::Shell)
        })
        .filter_map(|idx| revocation::latest_acceptable(graph, *idx, ctx.current_time()))
        .map(|r| graph.revocation(r))
        .map(|data| {
            keeping(
                MessageTag::BbbXcvRfc,
                revocation::is_fresh(data, best, &ctx.policy().revocation_freshness),
                current,
            )
            .with_id(data.id.clone())
            .with_param("bestSignatureTime", format_time(best))
        })
        .collect()
}

/// A certificate of the chain is on hold per its selected revocation data
fn chain_on_hold(ctx: &ValidationContext, token: TokenRef) -> bool {
    let graph = ctx.graph();
    token.chain(graph).iter().any(|idx| {
        revocation::latest_acceptable(graph, *idx, ctx.current_time())
            .map(|r| graph.revocation(r).is_on_hold())
            .unwrap_or(false)
    })
}

/// Checks showing that the reason behind `sub_indication` no longer holds
/// at the best signature time, in the order they are evaluated
fn reason_lifted(
    ctx: &ValidationContext,
    token: TokenRef,
    sub_indication: SubIndication,
    best: DateTime<Utc>,
    poe: &FrozenPoe,
    current: &Conclusion,
) -> Vec<Check> {
    let graph = ctx.graph();
    match sub_indication {
        SubIndication::NoCertificateChainFoundNoPoe => vec![
            issued_before(graph, token, best),
            within_validity(graph, token, best, SubIndication::OutOfBoundsNoPoe),
        ],
        SubIndication::RevokedNoPoe | SubIndication::RevocationOutOfBoundsNoPoe => vec![
            issued_before(graph, token, best),
            within_validity(graph, token, best, SubIndication::OutOfBoundsNotRevoked),
        ],
        SubIndication::TryLater if chain_on_hold(ctx, token) => vec![
            issued_before(graph, token, best),
            within_validity(graph, token, best, SubIndication::OutOfBoundsNotRevoked),
        ],
        SubIndication::TryLater => std::iter::once(issued_before(graph, token, best))
            .chain(fresh_at(ctx, token, best, current))
            .collect(),
        SubIndication::RevokedCaNoPoe => vec![
            ca_revoked_after(ctx, token, best, current),
            issued_before(graph, token, best),
            within_validity(graph, token, best, SubIndication::OutOfBoundsNotRevoked),
        ],
        SubIndication::OutOfBoundsNoPoe | SubIndication::OutOfBoundsNotRevoked => vec![
            issued_before(graph, token, best),
            within_validity(graph, token, best, sub_indication),
        ],
        SubIndication::CryptoConstraintsFailureNoPoe => vec![
            issued_before(graph, token, best),
            algorithms_reliable(ctx, token, best, poe, current),
        ],
        SubIndication::FormatFailure
        | SubIndication::HashFailure
        | SubIndication::SigCryptoFailure
        | SubIndication::Revoked
        | SubIndication::SigConstraintsFailure
        | SubIndication::ChainConstraintsFailure
        | SubIndication::CertificateChainGeneralFailure
        | SubIndication::CryptoConstraintsFailure
        | SubIndication::Expired
        | SubIndication::NotYetValid
        | SubIndication::PolicyProcessingError
        | SubIndication::SignaturePolicyNotAvailable
        | SubIndication::TimestampOrderFailure
        | SubIndication::NoSigningCertificateFound
        | SubIndication::NoCertificateChainFound
        | SubIndication::NoPoe
        | SubIndication::SignedDataNotFound => vec![keeping(MessageTag::PsvItposvaobct, false, current)],
    }
}

/// Past signature validation of `token` whose current conclusion is
/// `current`, against a frozen POE model
pub fn validate(
    ctx: &ValidationContext,
    token: TokenRef,
    current: &Conclusion,
    poe: &FrozenPoe,
) -> PsvResult {
    let graph = ctx.graph();
    let pcv = pcv::validate(ctx, token, poe);
    let mut block = Block::new();

    let result = |block: Block, pcv: PcvResult, best: Option<DateTime<Utc>>| {
        let mut conclusion = current.clone();
        if block.is_passed() {
            conclusion.set_passed();
            conclusion.errors.clear();
        } else {
            conclusion.adopt_outcome(&block.conclusion);
        }
        conclusion.absorb_all(&block.conclusion);
        PsvResult {
            control_time: pcv.control_time,
            best_signature_time: best,
            block,
            pcv,
            conclusion,
        }
    };

    block.apply(keeping(MessageTag::PsvIpcva, pcv.conclusion().is_passed(), current));
    let Some(control_time) = pcv.control_time.filter(|_| block.is_passed()) else {
        return result(block, pcv, None);
    };

    let sub_indication = current.sub_indication().unwrap_or(SubIndication::NoPoe);
    let exclude_sunset_warned = sub_indication == SubIndication::NoCertificateChainFoundNoPoe;
    let best = token.best_poe(graph, poe, exclude_sunset_warned);
    block.apply(
        keeping(MessageTag::PsvIpsvc, best <= control_time, current)
            .with_param("bestSignatureTime", format_time(best))
            .with_param("controlTime", format_time(control_time)),
    );

    for check in reason_lifted(ctx, token, sub_indication, best, poe, current) {
        if !block.is_passed() {
            break;
        }
        block.apply(check);
    }

    debug!(
        token = token.id(graph),
        from = %current,
        outcome = %block.conclusion,
        best = %format_time(best),
        "past signature validation"
    );
    result(block, pcv, Some(best))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poe::{PoeModel, PoeRecord};
    use ades_core::{
        CertificateFacts, DiagnosticData, RevocationFacts, RevocationKind, RevocationStatus,
        SignatureFacts,
    };
    use ades_policy::{AlgorithmCatalogue, Status, ValidationPolicy};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        now() - Duration::days(days)
    }

    fn cert(id: &str, trusted: bool) -> CertificateFacts {
        CertificateFacts {
            id: id.to_string(),
            not_before: days_ago(1000),
            not_after: now() + Duration::days(1000),
            self_signed: trusted,
            trusted,
            sunset_date: None,
            signature_intact: true,
            ocsp_no_check: false,
            signature_algorithm: None,
        }
    }

    fn crl(this_update: DateTime<Utc>) -> RevocationFacts {
        RevocationFacts {
            id: "crl-leaf".to_string(),
            certificate_id: "leaf".to_string(),
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

    fn context(
        leaf: CertificateFacts,
        revocation: RevocationFacts,
        algorithm: Option<&str>,
        policy: ValidationPolicy,
    ) -> ValidationContext {
        let graph = DiagnosticGraph::build(DiagnosticData {
            certificates: vec![leaf, cert("root", true)],
            revocations: vec![revocation],
            signatures: vec![SignatureFacts {
                id: "sig".to_string(),
                certificate_chain: vec!["leaf".to_string(), "root".to_string()],
                signing_certificate_identified: true,
                signing_certificate_digest_match: true,
                signature_intact: true,
                signature_algorithm: algorithm.map(str::to_string),
                digest_matchers: vec![],
                claimed_signing_time: None,
                timestamps: vec![],
            }],
            ..Default::default()
        })
        .unwrap();
        ValidationContext::new(graph, policy, now())
    }

    /// PSV of the signature with its existence proven at `proven`
    fn run(ctx: &ValidationContext, current: &Conclusion, proven: DateTime<Utc>) -> PsvResult {
        let sig = ctx.graph().signature_index("sig").unwrap();
        let mut poe = PoeModel::new(now());
        poe.add(
            ObjectRef::Signature(sig),
            PoeRecord {
                time: proven,
                timestamp: "tst".to_string(),
                sunset_warned: false,
            },
        );
        validate(ctx, TokenRef::Signature(sig), current, &poe.freeze())
    }

    #[test]
    fn test_best_time_before_issuance_fails_not_yet_valid() {
        let mut leaf = cert("leaf", false);
        leaf.not_before = days_ago(50);
        let mut revoked = crl(days_ago(2));
        revoked.status = RevocationStatus::Revoked;
        revoked.revocation_date = Some(days_ago(30));
        let ctx = context(leaf, revoked, None, ValidationPolicy::etsi_default());
        let current = Conclusion::indeterminate(SubIndication::RevokedNoPoe);
        let result = run(&ctx, &current, days_ago(60));

        assert_eq!(result.block.status_of(MessageTag::PsvIpsvc), Some(Status::Ok));
        assert_eq!(result.block.status_of(MessageTag::TsvIbstaidosc), Some(Status::NotOk));
        assert_eq!(result.conclusion.indication(), Indication::Failed);
        assert_eq!(result.conclusion.sub_indication(), Some(SubIndication::NotYetValid));
    }

    #[test]
    fn test_expired_signing_certificate_recovers_within_validity() {
        let mut leaf = cert("leaf", false);
        leaf.not_after = days_ago(10);
        let ctx = context(leaf, crl(days_ago(15)), None, ValidationPolicy::etsi_default());
        let current = Conclusion::indeterminate(SubIndication::OutOfBoundsNotRevoked);
        let result = run(&ctx, &current, days_ago(20));

        assert_eq!(result.block.status_of(MessageTag::TsvIbstaidosc), Some(Status::Ok));
        assert_eq!(result.block.status_of(MessageTag::PsvIbstbsce), Some(Status::Ok));
        assert!(result.conclusion.is_passed());
    }

    #[test]
    fn test_best_time_after_expiry_keeps_out_of_bounds() {
        let mut leaf = cert("leaf", false);
        leaf.not_after = days_ago(10);
        let ctx = context(leaf, crl(days_ago(15)), None, ValidationPolicy::etsi_default());
        let current = Conclusion::indeterminate(SubIndication::OutOfBoundsNotRevoked);
        let result = run(&ctx, &current, days_ago(5));

        assert!(!result.conclusion.is_passed());
        assert_eq!(result.conclusion.sub_indication(), Some(SubIndication::OutOfBoundsNotRevoked));
    }

    fn sha1_expired(days: i64) -> ValidationPolicy {
        let mut policy = ValidationPolicy::etsi_default();
        policy.algorithms = AlgorithmCatalogue::new().with("RSA-SHA1", Some(days_ago(days)));
        policy
    }

    #[test]
    fn test_algorithm_proven_before_expiry_recovers() {
        let ctx = context(cert("leaf", false), crl(days_ago(1)), Some("RSA-SHA1"), sha1_expired(100));
        let current = Conclusion::indeterminate(SubIndication::CryptoConstraintsFailureNoPoe);
        let result = run(&ctx, &current, days_ago(200));

        assert_eq!(result.block.status_of(MessageTag::TsvWacrabst), Some(Status::Ok));
        assert!(result.conclusion.is_passed());
    }

    #[test]
    fn test_algorithm_proven_after_expiry_stays_indeterminate() {
        let ctx = context(cert("leaf", false), crl(days_ago(1)), Some("RSA-SHA1"), sha1_expired(100));
        let current = Conclusion::indeterminate(SubIndication::CryptoConstraintsFailureNoPoe);
        let result = run(&ctx, &current, days_ago(50));

        assert_eq!(result.block.status_of(MessageTag::TsvWacrabst), Some(Status::NotOk));
        assert_eq!(result.conclusion.indication(), Indication::Indeterminate);
        assert_eq!(
            result.conclusion.sub_indication(),
            Some(SubIndication::CryptoConstraintsFailureNoPoe)
        );
    }

    #[test]
    fn test_stale_revocation_fresh_at_best_time() {
        let mut stale = crl(days_ago(10));
        stale.next_update = Some(days_ago(3));
        let ctx = context(cert("leaf", false), stale, None, ValidationPolicy::etsi_default());
        let current = Conclusion::indeterminate(SubIndication::TryLater);
        let result = run(&ctx, &current, days_ago(12));

        assert_eq!(result.block.status_of(MessageTag::BbbXcvRfc), Some(Status::Ok));
        assert!(result.conclusion.is_passed());
    }

    #[test]
    fn test_failing_checks_keep_current_outcome() {
        let current = Conclusion::indeterminate(SubIndication::RevokedCaNoPoe);
        let check = keeping(MessageTag::PsvIpsvc, false, &current);
        let mut block = Block::new();
        block.apply(check);

        assert_eq!(block.conclusion.indication(), Indication::Indeterminate);
        assert_eq!(block.conclusion.sub_indication(), Some(SubIndication::RevokedCaNoPoe));
    }

    #[test]
    fn test_failed_stays_failed() {
        let current = Conclusion::failed(SubIndication::HashFailure);
        let mut block = Block::new();
        block.apply(keeping(MessageTag::PsvItposvaobct, false, &current));

        assert_eq!(block.conclusion.indication(), Indication::Failed);
    }
}
