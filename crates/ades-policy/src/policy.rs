//! Validation policy
//!
//! A tree of optional [`LevelConstraint`] values, one per check. `None`
//! means the check is not requested; it is skipped and leaves no entry in
//! the report.

use crate::level::LevelConstraint;
use chrono::{DateTime, Duration, TimeZone, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Policy documents shipped with the crate. Each one is an overlay applied on
/// top of [`ValidationPolicy::etsi_default`].
static BUNDLED: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut bundled = HashMap::new();
    bundled.insert("etsi-default", include_str!("../policies/etsi-default.yaml"));
    bundled.insert("relaxed", include_str!("../policies/relaxed.yaml"));
    bundled
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("POLICY/parse: {0}")]
    Parse(String),

    #[error("POLICY/unknown: {0}")]
    Unknown(String),

    #[error("POLICY/invalid: {0}")]
    Invalid(String),
}

/// How far up the chain certificate validation walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationModel {
    /// Every certificate up to the root, trust flags do not stop the walk
    Shell,
    /// Stop at the first trust anchor
    Chain,
    /// Like CHAIN, but fall through to later anchors when one is unusable
    #[default]
    Hybrid,
}

/// Kind of token whose constraints apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Context {
    Signature,
    Timestamp,
}

/// Position of a certificate inside a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubContext {
    SigningCert,
    CaCertificate,
}

fn overlay(base: Option<LevelConstraint>, top: Option<LevelConstraint>) -> Option<LevelConstraint> {
    top.or(base)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdentificationConstraints {
    pub signing_certificate_identified: Option<LevelConstraint>,
    pub signing_certificate_digest_match: Option<LevelConstraint>,
}

impl IdentificationConstraints {
    pub fn merge(&self, top: &Self) -> Self {
        Self {
            signing_certificate_identified: overlay(
                self.signing_certificate_identified,
                top.signing_certificate_identified,
            ),
            signing_certificate_digest_match: overlay(
                self.signing_certificate_digest_match,
                top.signing_certificate_digest_match,
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CryptographicConstraints {
    pub reference_data_found: Option<LevelConstraint>,
    pub reference_data_intact: Option<LevelConstraint>,
    pub reference_name_match: Option<LevelConstraint>,
    pub signature_intact: Option<LevelConstraint>,
    /// The token's signature algorithm is acceptable at validation time
    pub signature_algorithm: Option<LevelConstraint>,
}

impl CryptographicConstraints {
    pub fn merge(&self, top: &Self) -> Self {
        Self {
            reference_data_found: overlay(self.reference_data_found, top.reference_data_found),
            reference_data_intact: overlay(self.reference_data_intact, top.reference_data_intact),
            reference_name_match: overlay(self.reference_name_match, top.reference_name_match),
            signature_intact: overlay(self.signature_intact, top.signature_intact),
            signature_algorithm: overlay(self.signature_algorithm, top.signature_algorithm),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AcceptanceConstraints {
    pub signing_time: Option<LevelConstraint>,
}

impl AcceptanceConstraints {
    pub fn merge(&self, top: &Self) -> Self {
        Self {
            signing_time: overlay(self.signing_time, top.signing_time),
        }
    }
}

/// Per-certificate checks run by certificate chain validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CertificateConstraints {
    pub signature: Option<LevelConstraint>,
    pub validity_range: Option<LevelConstraint>,
    pub revocation_data_available: Option<LevelConstraint>,
    pub acceptable_revocation_data: Option<LevelConstraint>,
    pub revocation_freshness: Option<LevelConstraint>,
    pub not_revoked: Option<LevelConstraint>,
    pub not_on_hold: Option<LevelConstraint>,
    /// The issuer's signature algorithm is acceptable at validation time
    pub signature_algorithm: Option<LevelConstraint>,
}

impl CertificateConstraints {
    /// Every check at FAIL level
    pub fn strict() -> Self {
        Self {
            signature: Some(LevelConstraint::fail()),
            validity_range: Some(LevelConstraint::fail()),
            revocation_data_available: Some(LevelConstraint::fail()),
            acceptable_revocation_data: Some(LevelConstraint::fail()),
            revocation_freshness: Some(LevelConstraint::fail()),
            not_revoked: Some(LevelConstraint::fail()),
            not_on_hold: Some(LevelConstraint::fail()),
            signature_algorithm: Some(LevelConstraint::fail()),
        }
    }

    pub fn merge(&self, top: &Self) -> Self {
        Self {
            signature: overlay(self.signature, top.signature),
            validity_range: overlay(self.validity_range, top.validity_range),
            revocation_data_available: overlay(
                self.revocation_data_available,
                top.revocation_data_available,
            ),
            acceptable_revocation_data: overlay(
                self.acceptable_revocation_data,
                top.acceptable_revocation_data,
            ),
            revocation_freshness: overlay(self.revocation_freshness, top.revocation_freshness),
            not_revoked: overlay(self.not_revoked, top.not_revoked),
            not_on_hold: overlay(self.not_on_hold, top.not_on_hold),
            signature_algorithm: overlay(self.signature_algorithm, top.signature_algorithm),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChainConstraints {
    /// A chain to some trust anchor can be built
    pub prospective_chain: Option<LevelConstraint>,
    /// Trust anchor is used before its sunset date
    pub trust_anchor_sunset: Option<LevelConstraint>,
    /// Another trust anchor validates when an earlier one could not be used
    pub other_trust_anchor: Option<LevelConstraint>,
    pub signing_certificate: CertificateConstraints,
    pub ca_certificate: CertificateConstraints,
}

impl ChainConstraints {
    pub fn certificate(&self, sub_context: SubContext) -> &CertificateConstraints {
        match sub_context {
            SubContext::SigningCert => &self.signing_certificate,
            SubContext::CaCertificate => &self.ca_certificate,
        }
    }

    pub fn merge(&self, top: &Self) -> Self {
        Self {
            prospective_chain: overlay(self.prospective_chain, top.prospective_chain),
            trust_anchor_sunset: overlay(self.trust_anchor_sunset, top.trust_anchor_sunset),
            other_trust_anchor: overlay(self.other_trust_anchor, top.other_trust_anchor),
            signing_certificate: self.signing_certificate.merge(&top.signing_certificate),
            ca_certificate: self.ca_certificate.merge(&top.ca_certificate),
        }
    }
}

/// All basic building block constraints for one token context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BasicConstraints {
    pub identification: IdentificationConstraints,
    pub cryptographic: CryptographicConstraints,
    pub acceptance: AcceptanceConstraints,
    pub chain: ChainConstraints,
}

impl BasicConstraints {
    pub fn merge(&self, top: &Self) -> Self {
        Self {
            identification: self.identification.merge(&top.identification),
            cryptographic: self.cryptographic.merge(&top.cryptographic),
            acceptance: self.acceptance.merge(&top.acceptance),
            chain: self.chain.merge(&top.chain),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RevocationFreshness {
    /// Maximum age of revocation data at validation time. When unset the
    /// revocation's own next-update bound applies.
    pub max_age_seconds: Option<i64>,
}

impl RevocationFreshness {
    /// The maximum age as a duration. `None` when unset or not representable.
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age_seconds
            .filter(|seconds| *seconds >= 0)
            .and_then(Duration::try_seconds)
    }

    fn validate(&self) -> Result<(), PolicyError> {
        match self.max_age_seconds {
            Some(seconds) if self.max_age().is_none() => Err(PolicyError::Invalid(format!(
                "revocationFreshness.maxAgeSeconds out of range: {}",
                seconds
            ))),
            _ => Ok(()),
        }
    }
}

/// Acceptance window of one algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlgorithmExpiry {
    /// First instant at which the algorithm is no longer considered secure.
    /// Unset means it never expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

/// Acceptable algorithms by name. An algorithm that is not listed is never
/// acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlgorithmCatalogue(BTreeMap<String, AlgorithmExpiry>);

impl AlgorithmCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, expires: Option<DateTime<Utc>>) -> Self {
        self.0.insert(name.into(), AlgorithmExpiry { expires });
        self
    }

    pub fn get(&self, name: &str) -> Option<&AlgorithmExpiry> {
        self.0.get(name)
    }

    pub fn is_listed(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Listed and not yet expired at `time`
    pub fn is_secure_at(&self, name: &str, time: DateTime<Utc>) -> bool {
        match self.0.get(name) {
            Some(entry) => entry.expires.map(|expires| time < expires).unwrap_or(true),
            None => false,
        }
    }

    /// Entries of `top` replace same-named entries
    pub fn merge(&self, top: &Self) -> Self {
        let mut merged = self.0.clone();
        merged.extend(top.0.iter().map(|(name, expiry)| (name.clone(), *expiry)));
        Self(merged)
    }
}

/// Complete validation policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationPolicy {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ValidationModel>,
    #[serde(default)]
    pub revocation_freshness: RevocationFreshness,
    #[serde(default)]
    pub algorithms: AlgorithmCatalogue,
    #[serde(default)]
    pub signature: BasicConstraints,
    #[serde(default)]
    pub timestamp: BasicConstraints,
}

impl ValidationPolicy {
    /// Every mandated check at FAIL level, reference name mismatch as a warning
    pub fn etsi_default() -> Self {
        let chain = ChainConstraints {
            prospective_chain: Some(LevelConstraint::fail()),
            trust_anchor_sunset: Some(LevelConstraint::fail()),
            other_trust_anchor: Some(LevelConstraint::fail()),
            signing_certificate: CertificateConstraints::strict(),
            ca_certificate: CertificateConstraints::strict(),
        };

        let sha1_retired = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).single();
        let md5_retired = Utc.with_ymd_and_hms(2004, 8, 1, 0, 0, 0).single();
        let algorithms = AlgorithmCatalogue::new()
            .with("RSA-MD5", md5_retired)
            .with("RSA-SHA1", sha1_retired)
            .with("ECDSA-SHA1", sha1_retired)
            .with("RSA-SHA256", None)
            .with("RSA-SHA384", None)
            .with("RSA-SHA512", None)
            .with("RSASSA-PSS-SHA256", None)
            .with("ECDSA-SHA256", None)
            .with("ECDSA-SHA384", None)
            .with("ECDSA-SHA512", None)
            .with("ED25519", None);

        Self {
            name: "etsi-default".to_string(),
            model: Some(ValidationModel::Hybrid),
            revocation_freshness: RevocationFreshness::default(),
            algorithms,
            signature: BasicConstraints {
                identification: IdentificationConstraints {
                    signing_certificate_identified: Some(LevelConstraint::fail()),
                    signing_certificate_digest_match: Some(LevelConstraint::fail()),
                },
                cryptographic: CryptographicConstraints {
                    reference_data_found: Some(LevelConstraint::fail()),
                    reference_data_intact: Some(LevelConstraint::fail()),
                    reference_name_match: Some(LevelConstraint::warn()),
                    signature_intact: Some(LevelConstraint::fail()),
                    signature_algorithm: Some(LevelConstraint::fail()),
                },
                acceptance: AcceptanceConstraints {
                    signing_time: Some(LevelConstraint::fail()),
                },
                chain: chain.clone(),
            },
            timestamp: BasicConstraints {
                identification: IdentificationConstraints {
                    signing_certificate_identified: Some(LevelConstraint::fail()),
                    signing_certificate_digest_match: None,
                },
                cryptographic: CryptographicConstraints {
                    reference_data_found: Some(LevelConstraint::fail()),
                    reference_data_intact: Some(LevelConstraint::fail()),
                    reference_name_match: None,
                    signature_intact: Some(LevelConstraint::fail()),
                    signature_algorithm: Some(LevelConstraint::fail()),
                },
                acceptance: AcceptanceConstraints::default(),
                chain,
            },
        }
    }

    /// Load a bundled policy by name
    pub fn for_name(name: &str) -> Result<Self, PolicyError> {
        let source = BUNDLED
            .get(name)
            .ok_or_else(|| PolicyError::Unknown(name.to_string()))?;
        Self::etsi_default().with_overlay(source)
    }

    /// Load a complete policy from YAML. Missing checks are not requested.
    pub fn from_yaml(yaml: &str) -> Result<Self, PolicyError> {
        let policy: Self = serde_yaml::from_str(yaml).map_err(|e| PolicyError::Parse(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load a complete policy from JSON
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let policy: Self = serde_json::from_str(json).map_err(|e| PolicyError::Parse(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Reject values that parse but cannot be applied
    pub fn validate(&self) -> Result<(), PolicyError> {
        self.revocation_freshness.validate()
    }

    /// Apply a partial YAML policy on top of this one
    pub fn with_overlay(&self, yaml: &str) -> Result<Self, PolicyError> {
        let top = Self::from_yaml(yaml)?;
        Ok(self.merge(&top))
    }

    /// Overlay another policy: its present values win
    pub fn merge(&self, top: &Self) -> Self {
        Self {
            name: if top.name.is_empty() {
                self.name.clone()
            } else {
                top.name.clone()
            },
            model: top.model.or(self.model),
            revocation_freshness: RevocationFreshness {
                max_age_seconds: top
                    .revocation_freshness
                    .max_age_seconds
                    .or(self.revocation_freshness.max_age_seconds),
            },
            algorithms: self.algorithms.merge(&top.algorithms),
            signature: self.signature.merge(&top.signature),
            timestamp: self.timestamp.merge(&top.timestamp),
        }
    }

    pub fn model(&self) -> ValidationModel {
        self.model.unwrap_or_default()
    }

    pub fn with_model(mut self, model: ValidationModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn basic(&self, context: Context) -> &BasicConstraints {
        match context {
            Context::Signature => &self.signature,
            Context::Timestamp => &self.timestamp,
        }
    }

    pub fn basic_mut(&mut self, context: Context) -> &mut BasicConstraints {
        match context {
            Context::Signature => &mut self.signature,
            Context::Timestamp => &mut self.timestamp,
        }
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::etsi_default()
    }
}
