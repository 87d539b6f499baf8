//! Diagnostic facts
//!
//! Raw, already-extracted facts about signatures, certificates, revocation
//! data and timestamps. Objects refer to each other by string id; the
//! [`DiagnosticGraph`](crate::graph::DiagnosticGraph) resolves those ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the validation core consumes for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagnosticData {
    pub signatures: Vec<SignatureFacts>,
    pub certificates: Vec<CertificateFacts>,
    pub revocations: Vec<RevocationFacts>,
    pub timestamps: Vec<TimestampFacts>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateFacts {
    pub id: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    #[serde(default)]
    pub self_signed: bool,
    /// Listed as a trust anchor
    #[serde(default)]
    pub trusted: bool,
    /// Instant from which the certificate can no longer be used as an anchor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset_date: Option<DateTime<Utc>>,
    /// The issuer's signature on this certificate verifies
    #[serde(default = "default_true")]
    pub signature_intact: bool,
    /// Carries id-pkix-ocsp-nocheck, revocation checking does not apply
    #[serde(default)]
    pub ocsp_no_check: bool,
    /// Algorithm of the issuer's signature, e.g. `RSA-SHA256`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevocationKind {
    Crl,
    Ocsp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevocationStatus {
    Good,
    Revoked,
    OnHold,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationFacts {
    pub id: String,
    pub certificate_id: String,
    pub kind: RevocationKind,
    pub production_date: DateTime<Utc>,
    pub this_update: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_update: Option<DateTime<Utc>>,
    pub status: RevocationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default = "default_true")]
    pub signature_intact: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimestampKind {
    Content,
    Signature,
    ValidationData,
    Archive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectCategory {
    Signature,
    Certificate,
    Revocation,
    Timestamp,
}

/// Reference to an object covered by a timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoveredObject {
    pub category: ObjectCategory,
    pub id: String,
}

impl CoveredObject {
    pub fn new(category: ObjectCategory, id: impl Into<String>) -> Self {
        Self {
            category,
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampFacts {
    pub id: String,
    pub kind: TimestampKind,
    pub production_time: DateTime<Utc>,
    /// TSA certificate chain, leaf first
    #[serde(default)]
    pub certificate_chain: Vec<String>,
    #[serde(default)]
    pub covered_objects: Vec<CoveredObject>,
    #[serde(default = "default_true")]
    pub message_imprint_found: bool,
    #[serde(default = "default_true")]
    pub message_imprint_intact: bool,
    #[serde(default = "default_true")]
    pub signature_intact: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
}

/// Result of matching one signed reference against its digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestMatcherFacts {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub data_found: bool,
    pub data_intact: bool,
    #[serde(default = "default_true")]
    pub name_match: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureFacts {
    pub id: String,
    /// Signer certificate chain, leaf first
    #[serde(default)]
    pub certificate_chain: Vec<String>,
    #[serde(default = "default_true")]
    pub signing_certificate_identified: bool,
    #[serde(default = "default_true")]
    pub signing_certificate_digest_match: bool,
    #[serde(default = "default_true")]
    pub signature_intact: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
    #[serde(default)]
    pub digest_matchers: Vec<DigestMatcherFacts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_signing_time: Option<DateTime<Utc>>,
    /// Timestamps found in the signature, in any order
    #[serde(default)]
    pub timestamps: Vec<String>,
}

fn default_true() -> bool {
    true
}
