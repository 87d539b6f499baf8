//! AdES Core: diagnostic fact graph and validation context
//!
//! Facts arrive as [`DiagnosticData`] (plain serde structs with string ids)
//! and are turned into an immutable [`DiagnosticGraph`] addressed by typed
//! indices. Broken references, repeated certificates inside a chain and
//! timestamp coverage cycles are rejected here with an [`AdesError`], before
//! any conclusion is produced.

pub mod context;
pub mod data_model;
pub mod error;
pub mod graph;

pub use context::ValidationContext;
pub use data_model::{
    CertificateFacts, CoveredObject, DiagnosticData, DigestMatcherFacts, ObjectCategory,
    RevocationFacts, RevocationKind, RevocationStatus, SignatureFacts, TimestampFacts,
    TimestampKind,
};
pub use error::{AdesError, Result};
pub use graph::{
    CertIdx, Certificate, DiagnosticGraph, ObjectRef, RevIdx, Revocation, SigIdx, Signature,
    Timestamp, TstIdx,
};
