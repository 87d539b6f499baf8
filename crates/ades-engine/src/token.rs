//! Signed tokens: signatures and timestamps seen through one interface

use crate::poe::PoeModel;
use ades_core::{CertIdx, DiagnosticGraph, ObjectRef, SigIdx, TstIdx};
use ades_policy::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Signature,
    Timestamp,
}

/// A signature or a timestamp token in the diagnostic graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenRef {
    Signature(SigIdx),
    Timestamp(TstIdx),
}

impl TokenRef {
    pub fn kind(&self) -> TokenKind {
        match self {
            TokenRef::Signature(_) => TokenKind::Signature,
            TokenRef::Timestamp(_) => TokenKind::Timestamp,
        }
    }

    /// Which policy section governs this token
    pub fn context(&self) -> Context {
        match self {
            TokenRef::Signature(_) => Context::Signature,
            TokenRef::Timestamp(_) => Context::Timestamp,
        }
    }

    pub fn object(&self) -> ObjectRef {
        match *self {
            TokenRef::Signature(idx) => ObjectRef::Signature(idx),
            TokenRef::Timestamp(idx) => ObjectRef::Timestamp(idx),
        }
    }

    pub fn id<'g>(&self, graph: &'g DiagnosticGraph) -> &'g str {
        graph.object_id(self.object())
    }

    /// Signer chain, leaf first
    pub fn chain<'g>(&self, graph: &'g DiagnosticGraph) -> &'g [CertIdx] {
        match *self {
            TokenRef::Signature(idx) => &graph.signature(idx).chain,
            TokenRef::Timestamp(idx) => &graph.timestamp(idx).chain,
        }
    }

    pub fn signing_certificate(&self, graph: &DiagnosticGraph) -> Option<CertIdx> {
        self.chain(graph).first().copied()
    }

    pub fn signature_algorithm<'g>(&self, graph: &'g DiagnosticGraph) -> Option<&'g str> {
        match *self {
            TokenRef::Signature(idx) => graph.signature(idx).signature_algorithm.as_deref(),
            TokenRef::Timestamp(idx) => graph.timestamp(idx).signature_algorithm.as_deref(),
        }
    }

    /// Time at which the token is known to exist without outside proof.
    /// A timestamp token proves itself at its production time.
    pub fn intrinsic_time(&self, graph: &DiagnosticGraph) -> Option<DateTime<Utc>> {
        match *self {
            TokenRef::Signature(_) => None,
            TokenRef::Timestamp(idx) => Some(graph.timestamp(idx).production_time),
        }
    }

    /// Earliest proven existence of the token.
    ///
    /// With `exclude_sunset_warned`, proofs from timestamps whose chain was
    /// only accepted under a WARN-level sunset are disregarded.
    pub fn best_poe(
        &self,
        graph: &DiagnosticGraph,
        poe: &PoeModel,
        exclude_sunset_warned: bool,
    ) -> DateTime<Utc> {
        let proven = if exclude_sunset_warned {
            poe.lowest_excluding_sunset_warned(self.object())
        } else {
            poe.lowest(self.object())
        };
        match self.intrinsic_time(graph) {
            Some(intrinsic) if intrinsic < proven => intrinsic,
            _ => proven,
        }
    }
}
