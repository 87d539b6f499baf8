//! Indications, sub-indications and conclusions
//!
//! A [`Conclusion`] carries a sub-indication exactly when its indication is
//! not PASSED. The constructors and setters are the only way to change the
//! outcome, which keeps that invariant intact.

use crate::messages::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level validation outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Indication {
    Passed,
    Indeterminate,
    Failed,
}

/// Reason attached to a non-PASSED indication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubIndication {
    FormatFailure,
    HashFailure,
    SigCryptoFailure,
    Revoked,
    SigConstraintsFailure,
    ChainConstraintsFailure,
    CertificateChainGeneralFailure,
    CryptoConstraintsFailure,
    Expired,
    NotYetValid,
    PolicyProcessingError,
    SignaturePolicyNotAvailable,
    TimestampOrderFailure,
    NoSigningCertificateFound,
    NoCertificateChainFound,
    RevokedNoPoe,
    RevokedCaNoPoe,
    OutOfBoundsNoPoe,
    OutOfBoundsNotRevoked,
    RevocationOutOfBoundsNoPoe,
    CryptoConstraintsFailureNoPoe,
    NoPoe,
    TryLater,
    SignedDataNotFound,
    NoCertificateChainFoundNoPoe,
}

impl SubIndication {
    /// Sub-indications that past signature validation may overturn given
    /// sufficient proof of existence
    pub fn is_poe_recoverable(&self) -> bool {
        match self {
            SubIndication::RevokedNoPoe
            | SubIndication::RevokedCaNoPoe
            | SubIndication::OutOfBoundsNoPoe
            | SubIndication::OutOfBoundsNotRevoked
            | SubIndication::RevocationOutOfBoundsNoPoe
            | SubIndication::NoCertificateChainFoundNoPoe
            | SubIndication::CryptoConstraintsFailureNoPoe
            | SubIndication::TryLater => true,
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
            | SubIndication::SignedDataNotFound => false,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SubIndication::FormatFailure => "FORMAT_FAILURE",
            SubIndication::HashFailure => "HASH_FAILURE",
            SubIndication::SigCryptoFailure => "SIG_CRYPTO_FAILURE",
            SubIndication::Revoked => "REVOKED",
            SubIndication::SigConstraintsFailure => "SIG_CONSTRAINTS_FAILURE",
            SubIndication::ChainConstraintsFailure => "CHAIN_CONSTRAINTS_FAILURE",
            SubIndication::CertificateChainGeneralFailure => "CERTIFICATE_CHAIN_GENERAL_FAILURE",
            SubIndication::CryptoConstraintsFailure => "CRYPTO_CONSTRAINTS_FAILURE",
            SubIndication::Expired => "EXPIRED",
            SubIndication::NotYetValid => "NOT_YET_VALID",
            SubIndication::PolicyProcessingError => "POLICY_PROCESSING_ERROR",
            SubIndication::SignaturePolicyNotAvailable => "SIGNATURE_POLICY_NOT_AVAILABLE",
            SubIndication::TimestampOrderFailure => "TIMESTAMP_ORDER_FAILURE",
            SubIndication::NoSigningCertificateFound => "NO_SIGNING_CERTIFICATE_FOUND",
            SubIndication::NoCertificateChainFound => "NO_CERTIFICATE_CHAIN_FOUND",
            SubIndication::RevokedNoPoe => "REVOKED_NO_POE",
            SubIndication::RevokedCaNoPoe => "REVOKED_CA_NO_POE",
            SubIndication::OutOfBoundsNoPoe => "OUT_OF_BOUNDS_NO_POE",
            SubIndication::OutOfBoundsNotRevoked => "OUT_OF_BOUNDS_NOT_REVOKED",
            SubIndication::RevocationOutOfBoundsNoPoe => "REVOCATION_OUT_OF_BOUNDS_NO_POE",
            SubIndication::CryptoConstraintsFailureNoPoe => "CRYPTO_CONSTRAINTS_FAILURE_NO_POE",
            SubIndication::NoPoe => "NO_POE",
            SubIndication::TryLater => "TRY_LATER",
            SubIndication::SignedDataNotFound => "SIGNED_DATA_NOT_FOUND",
            SubIndication::NoCertificateChainFoundNoPoe => "NO_CERTIFICATE_CHAIN_FOUND_NO_POE",
        }
    }
}

/// Outcome of a block, a stage or a whole validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConclusionRecord")]
pub struct Conclusion {
    indication: Indication,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub_indication: Option<SubIndication>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Message>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Message>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub infos: Vec<Message>,
}

impl Conclusion {
    pub fn passed() -> Self {
        Self {
            indication: Indication::Passed,
            sub_indication: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            infos: Vec::new(),
        }
    }

    pub fn indeterminate(sub_indication: SubIndication) -> Self {
        let mut conclusion = Self::passed();
        conclusion.set_indeterminate(sub_indication);
        conclusion
    }

    pub fn failed(sub_indication: SubIndication) -> Self {
        let mut conclusion = Self::passed();
        conclusion.set_failed(sub_indication);
        conclusion
    }

    pub fn indication(&self) -> Indication {
        self.indication
    }

    pub fn sub_indication(&self) -> Option<SubIndication> {
        self.sub_indication
    }

    pub fn is_passed(&self) -> bool {
        self.indication == Indication::Passed
    }

    pub fn set_passed(&mut self) {
        self.indication = Indication::Passed;
        self.sub_indication = None;
    }

    pub fn set_indeterminate(&mut self, sub_indication: SubIndication) {
        self.indication = Indication::Indeterminate;
        self.sub_indication = Some(sub_indication);
    }

    pub fn set_failed(&mut self, sub_indication: SubIndication) {
        self.indication = Indication::Failed;
        self.sub_indication = Some(sub_indication);
    }

    /// Copy indication and sub-indication from another conclusion,
    /// leaving this conclusion's messages untouched
    pub fn adopt_outcome(&mut self, other: &Conclusion) {
        self.indication = other.indication;
        self.sub_indication = other.sub_indication;
    }

    /// Indeterminate with a sub-indication that proof of existence can lift
    pub fn is_poe_recoverable(&self) -> bool {
        self.indication == Indication::Indeterminate
            && self
                .sub_indication
                .map(|sub| sub.is_poe_recoverable())
                .unwrap_or(false)
    }

    /// Append the warnings and infos of another conclusion
    pub fn absorb_notes(&mut self, other: &Conclusion) {
        self.warnings.extend(other.warnings.iter().cloned());
        self.infos.extend(other.infos.iter().cloned());
    }

    /// Append every message list of another conclusion
    pub fn absorb_all(&mut self, other: &Conclusion) {
        self.errors.extend(other.errors.iter().cloned());
        self.absorb_notes(other);
    }
}

/// Serialized shape of a [`Conclusion`], checked before it becomes one
#[derive(Deserialize)]
struct ConclusionRecord {
    indication: Indication,
    #[serde(default)]
    sub_indication: Option<SubIndication>,
    #[serde(default)]
    errors: Vec<Message>,
    #[serde(default)]
    warnings: Vec<Message>,
    #[serde(default)]
    infos: Vec<Message>,
}

impl TryFrom<ConclusionRecord> for Conclusion {
    type Error = String;

    fn try_from(record: ConclusionRecord) -> Result<Self, Self::Error> {
        let mut conclusion = match (record.indication, record.sub_indication) {
            (Indication::Passed, None) => Conclusion::passed(),
            (Indication::Indeterminate, Some(sub)) => Conclusion::indeterminate(sub),
            (Indication::Failed, Some(sub)) => Conclusion::failed(sub),
            (Indication::Passed, Some(sub)) => {
                return Err(format!("PASSED conclusion cannot carry sub-indication {}", sub))
            }
            (indication, None) => return Err(format!("{} conclusion needs a sub-indication", indication)),
        };
        conclusion.errors = record.errors;
        conclusion.warnings = record.warnings;
        conclusion.infos = record.infos;
        Ok(conclusion)
    }
}

impl Default for Conclusion {
    fn default() -> Self {
        Self::passed()
    }
}

impl fmt::Display for Indication {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Indication::Passed => write!(f, "PASSED"),
            Indication::Indeterminate => write!(f, "INDETERMINATE"),
            Indication::Failed => write!(f, "FAILED"),
        }
    }
}

impl fmt::Display for SubIndication {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.indication)?;
        if let Some(sub) = self.sub_indication {
            write!(f, "/{}", sub)?;
        }
        if !self.errors.is_empty() || !self.warnings.is_empty() {
            write!(
                f,
                " ({} errors, {} warnings)",
                self.errors.len(),
                self.warnings.len()
            )?;
        }
        Ok(())
    }
}
