//! Basic building blocks
//!
//! One bundle per signature and per timestamp: identification of the
//! signing certificate, cryptographic verification, chain validation and,
//! for signatures, signature acceptance. All of them run at the current
//! validation time.

use crate::aggregate;
use crate::block::Block;
use crate::checks::{acceptance, crypto, identification};
use crate::token::{TokenKind, TokenRef};
use crate::xcv::{self, XcvResult};
use ades_core::{TstIdx, ValidationContext};
use ades_policy::Conclusion;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBuildingBlocks {
    pub id: String,
    pub kind: TokenKind,
    pub isc: Block,
    pub cv: Block,
    pub xcv: XcvResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sav: Option<Block>,
    pub conclusion: Conclusion,
}

/// A timestamp of the signature under validation together with its
/// building blocks
#[derive(Debug, Clone)]
pub struct TimestampValidation {
    pub index: TstIdx,
    pub bbb: BasicBuildingBlocks,
}

fn identification(ctx: &ValidationContext, token: TokenRef) -> Block {
    let graph = ctx.graph();
    let constraints = &ctx.policy().basic(token.context()).identification;
    let mut block = Block::new();

    match token {
        TokenRef::Signature(idx) => {
            let signature = graph.signature(idx);
            block.apply(identification::signing_certificate_identified(
                signature.signing_certificate_identified,
                constraints,
            ));
            block.apply(identification::signing_certificate_digest_match(
                signature.signing_certificate_digest_match,
                constraints,
            ));
        }
        // a timestamp names its signer through its chain only
        TokenRef::Timestamp(idx) => {
            block.apply(identification::signing_certificate_identified(
                !graph.timestamp(idx).chain.is_empty(),
                constraints,
            ));
        }
    }
    block
}

fn cryptographic(ctx: &ValidationContext, token: TokenRef) -> Block {
    let graph = ctx.graph();
    let constraints = &ctx.policy().basic(token.context()).cryptographic;
    let algorithms = &ctx.policy().algorithms;
    let mut block = Block::new();

    match token {
        TokenRef::Signature(idx) => {
            let signature = graph.signature(idx);
            if signature.digest_matchers.is_empty() {
                block.apply(crypto::no_reference_data(constraints));
            }
            for matcher in &signature.digest_matchers {
                block.apply(crypto::reference_data_found(matcher, constraints));
                block.apply(crypto::reference_data_intact(matcher, constraints));
                block.apply(crypto::reference_name_match(matcher, constraints));
            }
            block.apply(crypto::signature_intact(signature.signature_intact, constraints));
            if let Some(algorithm) = &signature.signature_algorithm {
                block.apply(crypto::signature_algorithm(algorithm, ctx.current_time(), algorithms, constraints));
            }
        }
        TokenRef::Timestamp(idx) => {
            let timestamp = graph.timestamp(idx);
            block.apply(crypto::message_imprint_found(timestamp.message_imprint_found, constraints));
            block.apply(crypto::message_imprint_intact(timestamp.message_imprint_intact, constraints));
            block.apply(crypto::signature_intact(timestamp.signature_intact, constraints));
            if let Some(algorithm) = &timestamp.signature_algorithm {
                block.apply(crypto::signature_algorithm(algorithm, ctx.current_time(), algorithms, constraints));
            }
        }
    }
    block
}

fn acceptance(ctx: &ValidationContext, token: TokenRef) -> Option<Block> {
    let TokenRef::Signature(idx) = token else {
        return None;
    };
    let constraints = &ctx.policy().basic(token.context()).acceptance;
    let mut block = Block::new();
    block.apply(acceptance::signing_time_present(
        ctx.graph().signature(idx).claimed_signing_time,
        constraints,
    ));
    Some(block)
}

/// Basic validation of a signature or timestamp at the current time
pub fn validate_basic(ctx: &ValidationContext, token: TokenRef) -> BasicBuildingBlocks {
    let isc = identification(ctx, token);
    let cv = cryptographic(ctx, token);
    let xcv = xcv::validate_chain(ctx, token, ctx.current_time());
    let sav = acceptance(ctx, token);

    let conclusion = aggregate::basic_conclusion(
        &isc.conclusion,
        &cv.conclusion,
        xcv.conclusion(),
        sav.as_ref().map(|b| &b.conclusion),
    );
    let id = token.id(ctx.graph()).to_string();
    debug!(token = %id, conclusion = %conclusion, "basic building blocks");

    BasicBuildingBlocks {
        id,
        kind: token.kind(),
        isc,
        cv,
        xcv,
        sav,
        conclusion,
    }
}

/// Basic validation of every timestamp related to a signature, in arena
/// order
pub fn validate_timestamps(ctx: &ValidationContext, timestamps: &[TstIdx]) -> Vec<TimestampValidation> {
    timestamps
        .iter()
        .map(|&index| TimestampValidation {
            index,
            bbb: validate_basic(ctx, TokenRef::Timestamp(index)),
        })
        .collect()
}
