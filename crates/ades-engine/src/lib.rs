//! AdES Engine: building blocks, past validation and reports
//!
//! Each signature runs through four stages:
//!
//! ```text
//! basic.signature.v1 → basic.timestamp.v1 → ltv.v1 → adv.v1
//! ```
//!
//! Basic validation produces the building blocks of the signature and of
//! every related timestamp. Long-term validation builds proofs of existence
//! from the validated timestamps (archive timestamps excluded) and tries past
//! signature validation on a recoverable outcome; archival data validation
//! repeats that with archive timestamps included.
//!
//! ```no_run
//! use ades_core::{DiagnosticGraph, ValidationContext};
//! use ades_engine::{SimpleReport, ValidationOrchestrator};
//! use ades_policy::ValidationPolicy;
//!
//! # fn main() -> ades_core::Result<()> {
//! let graph = DiagnosticGraph::from_json(r#"{"signatures": [], "certificates": []}"#)?;
//! let ctx = ValidationContext::new(graph, ValidationPolicy::etsi_default(), chrono::Utc::now());
//! let report = ValidationOrchestrator::default().validate(&ctx)?;
//! let simple = SimpleReport::from(&report);
//! println!("{}", simple.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod bbb;
pub mod block;
pub mod checks;
pub mod orchestrator;
pub mod pcv;
pub mod poe;
pub mod psv;
pub mod report;
pub mod runner;
pub mod stage;
pub mod token;
pub mod vts;
pub mod xcv;

pub use bbb::{BasicBuildingBlocks, TimestampValidation};
pub use block::{Block, Check};
pub use orchestrator::ValidationOrchestrator;
pub use pcv::PcvResult;
pub use poe::{FrozenPoe, PoeEntry, PoeModel, PoeRecord, PoeScope};
pub use psv::PsvResult;
pub use report::{DetailedReport, SignatureReport, SimpleReport, SimpleSignature};
pub use runner::{StageRecord, StageRunner};
pub use stage::{Stage, StageConclusion, StageError, StageOutput, SignatureState, TimestampRecovery};
pub use token::{TokenKind, TokenRef};
pub use vts::VtsResult;
pub use xcv::{AnchorPath, CertificateRole, PathOutcome, SubXcv, XcvResult};
