//! X.509 certificate chain validation
//!
//! Candidate trust-anchor paths are enumerated up front from the token's
//! chain and the validation model, then each path is validated on its own:
//!
//! ```text
//! CHAIN   leaf → … → first anchor                  (one path)
//! HYBRID  leaf → … → anchor₁, leaf → … → anchor₂ … (one path per anchor)
//! SHELL   leaf → … → root, trust flags do not stop the walk
//! ```
//!
//! A chain with no trusted certificate is walked whole, without anchor,
//! unless the prospective chain check rejects it outright.
//!
//! The first passing path in chain order is selected. When none passes, the
//! reported cause is the failure with the highest precedence (signature and
//! validity range, then revocation, then sunset), ties broken by walk order.

use crate::block::Block;
use crate::checks::{chain, format_time, revocation, sunset};
use crate::token::TokenRef;
use ades_core::{CertIdx, Certificate, ValidationContext};
use ades_policy::{
    CertificateConstraints, ChainConstraints, Conclusion, MessageTag, Status, SubContext, SubIndication, ValidationModel,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateRole {
    SigningCertificate,
    CaCertificate,
    TrustAnchor,
}

/// A candidate path from the signing certificate to a trust anchor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorPath {
    /// Certificates walked, leaf first
    pub certificates: Vec<CertIdx>,
    pub anchor: Option<CertIdx>,
}

impl AnchorPath {
    /// The whole chain with no certificate acting as trust anchor
    pub fn unanchored(chain: &[CertIdx]) -> Self {
        Self {
            certificates: chain.to_vec(),
            anchor: None,
        }
    }
}

/// Validation of one certificate on one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubXcv {
    pub certificate: String,
    pub role: CertificateRole,
    #[serde(flatten)]
    pub block: Block,
    #[serde(skip)]
    rank: Option<u8>,
}

/// Validation of one anchor path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    pub sub_xcv: Vec<SubXcv>,
    pub conclusion: Conclusion,
    /// The anchor failed its sunset check but the level let it through
    #[serde(default)]
    pub sunset_warned: bool,
    #[serde(skip)]
    failure: Option<(u8, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XcvResult {
    pub model: ValidationModel,
    pub validation_time: DateTime<Utc>,
    #[serde(flatten)]
    pub block: Block,
    pub paths: Vec<PathOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_anchor: Option<String>,
    /// Chain was accepted only because a sunset failure was downgraded
    #[serde(default)]
    pub sunset_warned: bool,
}

impl XcvResult {
    pub fn conclusion(&self) -> &Conclusion {
        &self.block.conclusion
    }
}

/// Candidate anchor paths for a chain under a validation model
pub fn anchor_paths(
    ctx: &ValidationContext,
    chain: &[CertIdx],
    model: ValidationModel,
) -> Vec<AnchorPath> {
    let graph = ctx.graph();
    let anchors: Vec<usize> = chain
        .iter()
        .enumerate()
        .filter(|(_, idx)| graph.certificate(**idx).trusted)
        .map(|(position, _)| position)
        .collect();

    let prefix = |position: usize| AnchorPath {
        certificates: chain[..=position].to_vec(),
        anchor: Some(chain[position]),
    };

    match model {
        ValidationModel::Chain => anchors.first().map(|p| vec![prefix(*p)]).unwrap_or_default(),
        ValidationModel::Hybrid => anchors.iter().map(|p| prefix(*p)).collect(),
        ValidationModel::Shell => anchors
            .first()
            .map(|p| {
                vec![AnchorPath {
                    certificates: chain.to_vec(),
                    anchor: Some(chain[*p]),
                }]
            })
            .unwrap_or_default(),
    }
}

/// Whether a certificate acts as trust anchor on a path
pub(crate) fn is_anchor(
    model: ValidationModel,
    path: &AnchorPath,
    idx: CertIdx,
    certificate: &Certificate,
) -> bool {
    match (model, path.anchor) {
        (_, None) => false,
        (ValidationModel::Shell, Some(_)) => certificate.trusted,
        (ValidationModel::Chain | ValidationModel::Hybrid, Some(anchor)) => idx == anchor,
    }
}

fn precedence(tag: MessageTag) -> u8 {
    match tag {
        MessageTag::BbbXcvIcsi | MessageTag::BbbXcvIctivrsc => 0,
        MessageTag::BbbXcvIrdpfc
        | MessageTag::BbbXcvIardpfc
        | MessageTag::BbbXcvRfc
        | MessageTag::BbbXcvIscr
        | MessageTag::BbbXcvIscoh => 1,
        _ => 2,
    }
}

/// Record the prospective chain check and decide which paths to walk.
///
/// Returns `None` when the chain is rejected, leaving the cause in `block`.
/// Without any anchored path the whole chain is walked unanchored.
pub(crate) fn admit_paths(
    block: &mut Block,
    paths: &[AnchorPath],
    chain: &[CertIdx],
    constraints: &ChainConstraints,
) -> Option<Vec<AnchorPath>> {
    let anchored = paths.iter().any(|p| p.anchor.is_some());
    let status = block.apply(chain::prospective_chain(anchored, constraints));
    if status == Some(Status::NotOk) {
        return None;
    }
    if !paths.is_empty() {
        return Some(paths.to_vec());
    }
    if chain.is_empty() {
        block.conclusion.set_indeterminate(SubIndication::NoCertificateChainFound);
        return None;
    }
    Some(vec![AnchorPath::unanchored(chain)])
}

/// Validate the token's chain at `time` over every candidate anchor path
pub fn validate_chain(ctx: &ValidationContext, token: TokenRef, time: DateTime<Utc>) -> XcvResult {
    let model = ctx.policy().model();
    let paths = anchor_paths(ctx, token.chain(ctx.graph()), model);
    validate_with(ctx, token, &paths, time, &ctx.policy().basic(token.context()).chain)
}

/// Chain validation as of a past control time. The signing certificate's
/// validity range is not checked here: past signature validation judges it
/// against the best signature time instead.
pub fn validate_paths_as_of(
    ctx: &ValidationContext,
    token: TokenRef,
    paths: &[AnchorPath],
    control_time: DateTime<Utc>,
) -> XcvResult {
    let mut constraints = ctx.policy().basic(token.context()).chain.clone();
    constraints.signing_certificate.validity_range = None;
    validate_with(ctx, token, paths, control_time, &constraints)
}

fn validate_with(
    ctx: &ValidationContext,
    token: TokenRef,
    paths: &[AnchorPath],
    time: DateTime<Utc>,
    constraints: &ChainConstraints,
) -> XcvResult {
    let model = ctx.policy().model();
    let mut block = Block::new();

    let Some(paths) = admit_paths(&mut block, paths, token.chain(ctx.graph()), constraints) else {
        debug!(token = token.id(ctx.graph()), "no trust anchor in chain");
        return XcvResult {
            model,
            validation_time: time,
            block,
            paths: Vec::new(),
            selected_anchor: None,
            sunset_warned: false,
        };
    };

    let outcomes: Vec<PathOutcome> = paths
        .iter()
        .map(|path| validate_path(ctx, token, path, time, constraints))
        .collect();
    let selected = outcomes.iter().position(|o| o.conclusion.is_passed());

    // anchors that could not be used need a later one to validate
    for (position, outcome) in outcomes.iter().enumerate() {
        let anchor_failed_sunset = outcome.sub_xcv.iter().any(|sub| {
            sub.role == CertificateRole::TrustAnchor
                && sub.block.status_of(MessageTag::BbbXcvIvtbctsd) == Some(Status::NotOk)
        });
        if let (true, ValidationModel::Hybrid, Some(anchor)) = (anchor_failed_sunset, model, &outcome.anchor) {
            let later_found = selected.map(|s| s > position).unwrap_or(false);
            block.apply(sunset::other_trust_anchor(anchor, later_found, constraints));
        }
    }

    let deciding = selected.unwrap_or_else(|| {
        outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.failure.map(|(rank, walk)| (rank, i, walk)))
            .min()
            .map(|(_, i, _)| i)
            .unwrap_or(0)
    });
    for sub in &outcomes[deciding].sub_xcv {
        block.apply(chain::certificate_conclusive(&sub.certificate, &sub.block.conclusion));
    }

    let decided = &outcomes[deciding].conclusion;
    let mut conclusion = block.conclusion.clone();
    conclusion.adopt_outcome(decided);
    if decided.is_passed() {
        conclusion.absorb_notes(decided);
    } else {
        conclusion.absorb_all(decided);
    }
    block.conclusion = conclusion;

    let selected_anchor = selected.and_then(|s| outcomes[s].anchor.clone());
    let sunset_warned = selected.map(|s| outcomes[s].sunset_warned).unwrap_or(false);
    debug!(
        token = token.id(ctx.graph()),
        time = %format_time(time),
        paths = outcomes.len(),
        anchor = ?selected_anchor,
        conclusion = %block.conclusion,
        "chain validated"
    );

    XcvResult {
        model,
        validation_time: time,
        block,
        paths: outcomes,
        selected_anchor,
        sunset_warned,
    }
}

fn validate_path(
    ctx: &ValidationContext,
    token: TokenRef,
    path: &AnchorPath,
    time: DateTime<Utc>,
    constraints: &ChainConstraints,
) -> PathOutcome {
    let graph = ctx.graph();
    let model = ctx.policy().model();
    let mut sub_xcv = Vec::with_capacity(path.certificates.len());
    let mut sunset_warned = false;

    for (position, &idx) in path.certificates.iter().enumerate() {
        let certificate = graph.certificate(idx);
        let sub_context = if position == 0 {
            SubContext::SigningCert
        } else {
            SubContext::CaCertificate
        };
        let cert_constraints = constraints.certificate(sub_context);
        let mut block = Block::new();

        let role = if is_anchor(model, path, idx, certificate) {
            let before_sunset = certificate.is_before_sunset(time);
            let status = block.apply(sunset::anchor_before_sunset(certificate, time, constraints));
            if !before_sunset {
                match status {
                    Some(Status::NotOk) => warn!(
                        anchor = %certificate.id,
                        token = token.id(graph),
                        "trust anchor used after its sunset date"
                    ),
                    Some(_) => sunset_warned = true,
                    None => {}
                }
            }
            if model == ValidationModel::Shell {
                validate_certificate(ctx, idx, time, sub_context, cert_constraints, &mut block);
            }
            CertificateRole::TrustAnchor
        } else {
            validate_certificate(ctx, idx, time, sub_context, cert_constraints, &mut block);
            match sub_context {
                SubContext::SigningCert => CertificateRole::SigningCertificate,
                SubContext::CaCertificate => CertificateRole::CaCertificate,
            }
        };

        let rank = block
            .constraints
            .iter()
            .find(|c| c.status == Status::NotOk)
            .map(|c| precedence(c.name));
        sub_xcv.push(SubXcv {
            certificate: certificate.id.clone(),
            role,
            block,
            rank,
        });
    }

    let failure = sub_xcv
        .iter()
        .enumerate()
        .filter_map(|(walk, sub)| sub.rank.map(|rank| (rank, walk)))
        .min();

    let mut conclusion = Conclusion::passed();
    for sub in &sub_xcv {
        conclusion.absorb_all(&sub.block.conclusion);
    }
    if let Some((_, walk)) = failure {
        conclusion.adopt_outcome(&sub_xcv[walk].block.conclusion);
    }

    PathOutcome {
        anchor: path.anchor.map(|anchor| graph.certificate(anchor).id.clone()),
        sub_xcv,
        conclusion,
        sunset_warned,
        failure,
    }
}

/// Checks for a certificate that is not acting as trust anchor, or for any
/// trusted certificate under SHELL, in order: signature, validity range,
/// algorithm, then revocation unless exempt
fn validate_certificate(
    ctx: &ValidationContext,
    idx: CertIdx,
    time: DateTime<Utc>,
    sub_context: SubContext,
    constraints: &CertificateConstraints,
    block: &mut Block,
) {
    let graph = ctx.graph();
    let certificate = graph.certificate(idx);
    let selected = revocation::latest_acceptable(graph, idx, ctx.current_time())
        .map(|r| graph.revocation(r));
    let revoked = selected.map(|r| r.is_revoked()).unwrap_or(false);

    block.apply(chain::certificate_signature(certificate, constraints));
    block.apply(chain::validity_range(certificate, time, revoked, constraints));
    if let Some(check) = chain::certificate_algorithm(certificate, time, &ctx.policy().algorithms, constraints) {
        block.apply(check);
    }

    if !certificate.needs_revocation_check() {
        return;
    }

    block.apply(revocation::revocation_data_available(certificate, constraints));
    block.apply(revocation::acceptable_revocation(certificate, selected, constraints));
    if let Some(data) = selected {
        block.apply(revocation::freshness(
            data,
            time,
            &ctx.policy().revocation_freshness,
            constraints,
        ));
        block.apply(revocation::not_revoked(data, time, sub_context, constraints));
        block.apply(revocation::not_on_hold(data, constraints));
    }
}
