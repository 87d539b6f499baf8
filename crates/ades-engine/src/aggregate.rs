//! Conclusion aggregation
//!
//! Basic validation ranks the building blocks identification, cryptographic
//! verification, chain validation, then signature acceptance: the first
//! block that did not pass decides. Long-term and archival validation start
//! from the previous conclusion and only try past signature validation when
//! that conclusion is POE-recoverable.

use crate::bbb::BasicBuildingBlocks;
use crate::poe::FrozenPoe;
use crate::psv::{self, PsvResult};
use crate::token::TokenRef;
use ades_core::ValidationContext;
use ades_policy::{Conclusion, Indication};
use tracing::debug;

/// Basic validation conclusion from the building blocks, in precedence order
pub fn basic_conclusion(
    isc: &Conclusion,
    cv: &Conclusion,
    xcv: &Conclusion,
    sav: Option<&Conclusion>,
) -> Conclusion {
    let blocks: Vec<&Conclusion> = [Some(isc), Some(cv), Some(xcv), sav]
        .into_iter()
        .flatten()
        .collect();

    let mut conclusion = Conclusion::passed();
    if let Some(first) = blocks.iter().find(|c| !c.is_passed()) {
        conclusion.adopt_outcome(first);
    }
    for block in &blocks {
        conclusion.absorb_all(block);
    }
    conclusion
}

/// Recover `prior` through past signature validation when possible.
///
/// Returns the new conclusion together with the PSV run, if one happened.
pub fn past_validation(
    ctx: &ValidationContext,
    token: TokenRef,
    bbb: &BasicBuildingBlocks,
    prior: &Conclusion,
    poe: &FrozenPoe,
) -> (Conclusion, Option<PsvResult>) {
    match prior.indication() {
        Indication::Passed | Indication::Failed => return (prior.clone(), None),
        Indication::Indeterminate => {}
    }
    // structural problems cannot be fixed by proofs of existence
    let cv_recoverable = bbb.cv.is_passed() || bbb.cv.conclusion.is_poe_recoverable();
    if !bbb.isc.is_passed() || !cv_recoverable || !prior.is_poe_recoverable() {
        debug!(token = %bbb.id, conclusion = %prior, "not recoverable");
        return (prior.clone(), None);
    }

    let mut psv = psv::validate(ctx, token, prior, poe);
    if !psv.conclusion.is_passed() {
        return (psv.conclusion.clone(), Some(psv));
    }

    // an expired algorithm was lifted, the chain may still need its own
    let chain_outcome = bbb.xcv.conclusion();
    if !bbb.cv.is_passed() && !chain_outcome.is_passed() {
        if !chain_outcome.is_poe_recoverable() {
            return (chain_outcome.clone(), Some(psv));
        }
        psv = psv::validate(ctx, token, chain_outcome, poe);
        if !psv.conclusion.is_passed() {
            return (psv.conclusion.clone(), Some(psv));
        }
    }

    // only an expired algorithm can leave CV recoverable, and PSV lifted it
    let mut cv = Conclusion::passed();
    cv.absorb_notes(&bbb.cv.conclusion);
    let mut chain = Conclusion::passed();
    chain.absorb_notes(bbb.xcv.conclusion());
    chain.absorb_notes(&psv.block.conclusion);
    let conclusion = basic_conclusion(
        &bbb.isc.conclusion,
        &cv,
        &chain,
        bbb.sav.as_ref().map(|sav| &sav.conclusion),
    );
    (conclusion, Some(psv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ades_policy::{Message, MessageTag, SubIndication};

    #[test]
    fn test_precedence_identification_first() {
        let isc = Conclusion::indeterminate(SubIndication::NoSigningCertificateFound);
        let cv = Conclusion::failed(SubIndication::HashFailure);
        let xcv = Conclusion::indeterminate(SubIndication::RevokedNoPoe);

        let conclusion = basic_conclusion(&isc, &cv, &xcv, None);
        assert_eq!(conclusion.indication(), Indication::Indeterminate);
        assert_eq!(conclusion.sub_indication(), Some(SubIndication::NoSigningCertificateFound));
    }

    #[test]
    fn test_chain_outranks_acceptance() {
        let passed = Conclusion::passed();
        let xcv = Conclusion::indeterminate(SubIndication::RevokedNoPoe);
        let sav = Conclusion::indeterminate(SubIndication::SigConstraintsFailure);

        let conclusion = basic_conclusion(&passed, &passed, &xcv, Some(&sav));
        assert_eq!(conclusion.sub_indication(), Some(SubIndication::RevokedNoPoe));

        let conclusion = basic_conclusion(&passed, &passed, &passed, Some(&sav));
        assert_eq!(conclusion.sub_indication(), Some(SubIndication::SigConstraintsFailure));
    }

    #[test]
    fn test_warnings_merge_without_changing_indication() {
        let mut cv = Conclusion::passed();
        cv.warnings.push(Message::answer(MessageTag::BbbCvDmenmnd));
        let mut xcv = Conclusion::passed();
        xcv.infos.push(Message::answer(MessageTag::CtsSct));

        let conclusion = basic_conclusion(&Conclusion::passed(), &cv, &xcv, None);
        assert!(conclusion.is_passed());
        assert_eq!(conclusion.warnings.len(), 1);
        assert_eq!(conclusion.infos.len(), 1);
    }
}
