//! AdES Policy: constraint levels, evaluation and conclusions
//!
//! This crate holds everything that is decided by configuration rather than
//! by the diagnostic facts: which checks run and at which level, how a check
//! outcome maps to a status and message, and the conclusion types that
//! validation produces.
//!
//! # Example
//!
//! ```
//! use ades_policy::{evaluate, LevelConstraint, MessageTag, Status, ValidationPolicy};
//!
//! let policy = ValidationPolicy::etsi_default();
//! let level = policy.signature.chain.trust_anchor_sunset.unwrap_or(LevelConstraint::fail());
//!
//! let evaluation = evaluate(MessageTag::BbbXcvIvtbctsd, false, &level);
//! assert_eq!(evaluation.status, Status::NotOk);
//! ```

pub mod constraints;
pub mod level;
pub mod messages;
pub mod policy;
pub mod verdict;

pub use constraints::{evaluate, Constraint, Evaluation, Finding, Severity};
pub use level::{Level, LevelConstraint, Status};
pub use messages::{Message, MessageTag, Param};
pub use policy::{
    AcceptanceConstraints, AlgorithmCatalogue, AlgorithmExpiry, BasicConstraints, CertificateConstraints, ChainConstraints, Context,
    CryptographicConstraints, IdentificationConstraints, PolicyError, RevocationFreshness,
    SubContext, ValidationModel, ValidationPolicy,
};
pub use verdict::{Conclusion, Indication, SubIndication};
