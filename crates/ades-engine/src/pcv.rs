//! Past certificate validation
//!
//! Slides the control time independently along every candidate anchor path,
//! keeps the most permissive passing path and re-validates the chain as of
//! its control time. A chain without any trust anchor is slid as one
//! unanchored path when the policy lets it through.

use crate::block::{Block, Check};
use crate::checks::format_time;
use crate::poe::FrozenPoe;
use crate::token::TokenRef;
use crate::vts::{self, VtsResult};
use crate::xcv::{self, XcvResult};
use ades_core::ValidationContext;
use ades_policy::{Conclusion, LevelConstraint, MessageTag, SubIndication};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcvResult {
    #[serde(flatten)]
    pub block: Block,
    pub vts: Vec<VtsResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_time: Option<DateTime<Utc>>,
    /// Chain validation as of the control time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xcv: Option<XcvResult>,
}

impl PcvResult {
    pub fn conclusion(&self) -> &Conclusion {
        &self.block.conclusion
    }
}

pub fn validate(ctx: &ValidationContext, token: TokenRef, poe: &FrozenPoe) -> PcvResult {
    let graph = ctx.graph();
    let constraints = &ctx.policy().basic(token.context()).chain;
    let chain = token.chain(graph);
    let candidates = xcv::anchor_paths(ctx, chain, ctx.policy().model());
    let mut block = Block::new();

    let Some(paths) = xcv::admit_paths(&mut block, &candidates, chain, constraints) else {
        return PcvResult {
            block,
            vts: Vec::new(),
            selected_anchor: None,
            control_time: None,
            xcv: None,
        };
    };

    let slides: Vec<VtsResult> = paths.iter().map(|path| vts::slide(ctx, token, path, poe)).collect();

    // latest passing control time wins, first path on ties
    let best = slides
        .iter()
        .enumerate()
        .filter(|(_, s)| s.conclusion().is_passed())
        .fold(None::<(usize, DateTime<Utc>)>, |best, (i, s)| match best {
            Some((_, time)) if time >= s.control_time => best,
            _ => Some((i, s.control_time)),
        })
        .map(|(i, _)| i);

    for (i, slide) in slides.iter().enumerate() {
        if Some(i) != best {
            let check = Check::indeterminate(
                MessageTag::PcvTafrb,
                Some(LevelConstraint::warn()),
                false,
                SubIndication::NoPoe,
            )
            .with_param("controlTime", format_time(slide.control_time));
            block.apply(match &slide.anchor {
                Some(anchor) => check.with_id(anchor.clone()),
                None => check,
            });
        }
    }

    let failure = slides
        .first()
        .and_then(|s| s.conclusion().sub_indication())
        .unwrap_or(SubIndication::NoPoe);
    block.apply(Check::indeterminate(
        MessageTag::PcvIvtsc,
        Some(LevelConstraint::fail()),
        best.is_some(),
        failure,
    ));

    let Some(best) = best else {
        debug!(token = token.id(graph), "no anchor path yields a control time");
        return PcvResult {
            block,
            vts: slides,
            selected_anchor: None,
            control_time: None,
            xcv: None,
        };
    };

    let control_time = slides[best].control_time;
    let xcv = xcv::validate_paths_as_of(ctx, token, &paths[best..=best], control_time);
    if !xcv.conclusion().is_passed() {
        let mut conclusion = block.conclusion.clone();
        conclusion.adopt_outcome(xcv.conclusion());
        conclusion.absorb_all(xcv.conclusion());
        block.conclusion = conclusion;
    }

    debug!(
        token = token.id(graph),
        anchor = ?slides[best].anchor,
        control = %format_time(control_time),
        conclusion = %block.conclusion,
        "past certificate validation"
    );

    PcvResult {
        selected_anchor: slides[best].anchor.clone(),
        control_time: Some(control_time),
        xcv: Some(xcv),
        vts: slides,
        block,
    }
}
