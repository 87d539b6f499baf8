//! Unified Error Model
//!
//! Only structural problems are errors. Policy outcomes are always
//! conclusions.
use ades_policy::PolicyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdesError {
    #[error("GRAPH/duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("GRAPH/{from} references missing {kind} {id}")]
    MissingReference {
        kind: &'static str,
        id: String,
        from: String,
    },

    #[error("GRAPH/chain of {owner} repeats certificate {certificate}")]
    ChainCycle { owner: String, certificate: String },

    #[error("GRAPH/timestamp coverage cycle through {0}")]
    CoverageCycle(String),

    #[error("PARSE/{0}")]
    Parse(String),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("SERIALIZE/{0}")]
    Serialize(String),

    #[error("STAGE/{0}")]
    Stage(String),

    #[error("TASK/{0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, AdesError>;
