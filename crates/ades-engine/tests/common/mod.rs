//! Fixture builder shared by the engine integration tests.
//!
//! The base fixture is one signature over a three-certificate chain
//! (leaf → ca → root) plus a timestamping unit certificate issued by the
//! same root. Every non-root certificate has fresh GOOD revocation data.

#![allow(dead_code)]

use ades_core::{
    CertificateFacts, CoveredObject, DiagnosticData, DiagnosticGraph, DigestMatcherFacts,
    ObjectCategory, RevocationFacts, RevocationKind, RevocationStatus, SignatureFacts,
    TimestampFacts, TimestampKind, ValidationContext,
};
use ades_policy::ValidationPolicy;
use chrono::{DateTime, Duration, TimeZone, Utc};

/// Signature algorithm of every fixture object
pub const ALGORITHM: &str = "RSA-SHA256";

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

fn certificate(id: &str, self_signed: bool) -> CertificateFacts {
    CertificateFacts {
        id: id.to_string(),
        not_before: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        not_after: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        self_signed,
        trusted: self_signed,
        sunset_date: None,
        signature_intact: true,
        ocsp_no_check: false,
        signature_algorithm: Some(ALGORITHM.to_string()),
    }
}

fn crl(certificate: &str) -> RevocationFacts {
    RevocationFacts {
        id: format!("crl-{}", certificate),
        certificate_id: certificate.to_string(),
        kind: RevocationKind::Crl,
        production_date: days_ago(1),
        this_update: days_ago(1),
        next_update: Some(now() + Duration::days(6)),
        status: RevocationStatus::Good,
        revocation_date: None,
        reason: None,
        signature_intact: true,
    }
}

fn signature(id: &str) -> SignatureFacts {
    SignatureFacts {
        id: id.to_string(),
        certificate_chain: vec!["leaf".to_string(), "ca".to_string(), "root".to_string()],
        signing_certificate_identified: true,
        signing_certificate_digest_match: true,
        signature_intact: true,
        signature_algorithm: Some(ALGORITHM.to_string()),
        digest_matchers: vec![DigestMatcherFacts {
            kind: "REFERENCE".to_string(),
            name: Some("document".to_string()),
            data_found: true,
            data_intact: true,
            name_match: true,
        }],
        claimed_signing_time: Some(days_ago(365)),
        timestamps: Vec::new(),
    }
}

pub struct Fixture {
    pub data: DiagnosticData,
}

impl Fixture {
    /// leaf → ca → root, root sunset one year after the validation time
    pub fn three_certificate_chain() -> Self {
        let mut root = certificate("root", true);
        root.not_before = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap();
        root.not_after = Utc.with_ymd_and_hms(2035, 1, 1, 0, 0, 0).unwrap();
        root.sunset_date = Some(now() + Duration::days(365));

        Self {
            data: DiagnosticData {
                certificates: vec![
                    certificate("leaf", false),
                    certificate("ca", false),
                    root,
                    certificate("tsa", false),
                ],
                revocations: vec![crl("leaf"), crl("ca"), crl("tsa")],
                signatures: vec![signature("sig-1")],
                timestamps: Vec::new(),
            },
        }
    }

    pub fn certificate_mut(&mut self, id: &str) -> &mut CertificateFacts {
        self.data
            .certificates
            .iter_mut()
            .find(|c| c.id == id)
            .unwrap()
    }

    pub fn revocation_mut(&mut self, id: &str) -> &mut RevocationFacts {
        self.data
            .revocations
            .iter_mut()
            .find(|r| r.id == id)
            .unwrap()
    }

    pub fn signature_mut(&mut self, id: &str) -> &mut SignatureFacts {
        self.data.signatures.iter_mut().find(|s| s.id == id).unwrap()
    }

    pub fn with_root_sunset(mut self, sunset: Option<DateTime<Utc>>) -> Self {
        self.certificate_mut("root").sunset_date = sunset;
        self
    }

    /// Mark a certificate as trust anchor
    pub fn with_trusted(mut self, id: &str, sunset: Option<DateTime<Utc>>) -> Self {
        let certificate = self.certificate_mut(id);
        certificate.trusted = true;
        certificate.sunset_date = sunset;
        self
    }

    /// Turn the certificate's revocation data into a revocation at `at`
    pub fn with_revoked(mut self, certificate: &str, at: DateTime<Utc>) -> Self {
        let revocation = self.revocation_mut(&format!("crl-{}", certificate));
        revocation.status = RevocationStatus::Revoked;
        revocation.revocation_date = Some(at);
        revocation.reason = Some("keyCompromise".to_string());
        self
    }

    pub fn with_signature(mut self, id: &str) -> Self {
        self.data.signatures.push(signature(id));
        self
    }

    /// Timestamp issued through tsa → root covering `signature`
    pub fn with_timestamp(
        mut self,
        id: &str,
        kind: TimestampKind,
        production_time: DateTime<Utc>,
        signature: &str,
    ) -> Self {
        self.data.timestamps.push(TimestampFacts {
            id: id.to_string(),
            kind,
            production_time,
            certificate_chain: vec!["tsa".to_string(), "root".to_string()],
            covered_objects: vec![CoveredObject::new(ObjectCategory::Signature, signature)],
            message_imprint_found: true,
            message_imprint_intact: true,
            signature_intact: true,
            signature_algorithm: Some(ALGORITHM.to_string()),
        });
        self.signature_mut(signature).timestamps.push(id.to_string());
        self
    }

    pub fn timestamp_mut(&mut self, id: &str) -> &mut TimestampFacts {
        self.data.timestamps.iter_mut().find(|t| t.id == id).unwrap()
    }

    pub fn graph(self) -> DiagnosticGraph {
        DiagnosticGraph::build(self.data).unwrap()
    }

    pub fn context(self, policy: ValidationPolicy) -> ValidationContext {
        ValidationContext::new(self.graph(), policy, now())
    }
}

/// Default policy with the given YAML overlay
pub fn policy_with(overlay: &str) -> ValidationPolicy {
    ValidationPolicy::etsi_default().with_overlay(overlay).unwrap()
}

/// Installs a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
