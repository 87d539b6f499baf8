//! Immutable diagnostic graph
//!
//! An arena of flat vectors addressed by typed indices. String ids from
//! [`DiagnosticData`] are resolved once in [`DiagnosticGraph::build`], which
//! also rejects structurally broken input before any validation starts.

use crate::data_model::{
    CertificateFacts, CoveredObject, DiagnosticData, DigestMatcherFacts, ObjectCategory,
    RevocationFacts, RevocationKind, RevocationStatus, SignatureFacts, TimestampFacts,
    TimestampKind,
};
use crate::error::{AdesError, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

macro_rules! arena_index {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            pub fn index(&self) -> usize {
                self.0
            }
        }
    };
}

arena_index!(CertIdx);
arena_index!(RevIdx);
arena_index!(TstIdx);
arena_index!(SigIdx);

/// Any object that can receive a proof of existence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectRef {
    Signature(SigIdx),
    Certificate(CertIdx),
    Revocation(RevIdx),
    Timestamp(TstIdx),
}

#[derive(Debug, Clone)]
pub struct Certificate {
    pub id: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub self_signed: bool,
    pub trusted: bool,
    pub sunset_date: Option<DateTime<Utc>>,
    pub signature_intact: bool,
    pub ocsp_no_check: bool,
    pub signature_algorithm: Option<String>,
    revocations: Vec<RevIdx>,
}

impl Certificate {
    /// Revocation data about this certificate, in input order
    pub fn revocations(&self) -> &[RevIdx] {
        &self.revocations
    }

    pub fn is_valid_at(&self, time: DateTime<Utc>) -> bool {
        self.not_before <= time && time <= self.not_after
    }

    /// Whether revocation checking applies to this certificate at all
    pub fn needs_revocation_check(&self) -> bool {
        !self.self_signed && !self.ocsp_no_check
    }

    /// A trust anchor is usable strictly before its sunset date
    pub fn is_before_sunset(&self, time: DateTime<Utc>) -> bool {
        self.sunset_date.map(|sunset| time < sunset).unwrap_or(true)
    }
}

#[derive(Debug, Clone)]
pub struct Revocation {
    pub id: String,
    pub certificate: CertIdx,
    pub kind: RevocationKind,
    pub production_date: DateTime<Utc>,
    pub this_update: DateTime<Utc>,
    pub next_update: Option<DateTime<Utc>>,
    pub status: RevocationStatus,
    pub revocation_date: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub signature_intact: bool,
}

impl Revocation {
    /// Revoked strictly before `time`. A revoked status without a date
    /// counts as revoked at any time.
    pub fn is_revoked_before(&self, time: DateTime<Utc>) -> bool {
        self.status == RevocationStatus::Revoked
            && self.revocation_date.map(|date| date < time).unwrap_or(true)
    }

    pub fn is_revoked(&self) -> bool {
        self.status == RevocationStatus::Revoked
    }

    pub fn is_on_hold(&self) -> bool {
        self.status == RevocationStatus::OnHold
    }
}

#[derive(Debug, Clone)]
pub struct Timestamp {
    pub id: String,
    pub kind: TimestampKind,
    pub production_time: DateTime<Utc>,
    pub chain: Vec<CertIdx>,
    pub covers: Vec<ObjectRef>,
    pub message_imprint_found: bool,
    pub message_imprint_intact: bool,
    pub signature_intact: bool,
    pub signature_algorithm: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Signature {
    pub id: String,
    pub chain: Vec<CertIdx>,
    pub signing_certificate_identified: bool,
    pub signing_certificate_digest_match: bool,
    pub signature_intact: bool,
    pub signature_algorithm: Option<String>,
    pub digest_matchers: Vec<DigestMatcherFacts>,
    pub claimed_signing_time: Option<DateTime<Utc>>,
    pub timestamps: Vec<TstIdx>,
}

#[derive(Debug, Clone, Default)]
pub struct DiagnosticGraph {
    certificates: Vec<Certificate>,
    revocations: Vec<Revocation>,
    timestamps: Vec<Timestamp>,
    signatures: Vec<Signature>,
}

fn index_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a String>,
) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::new();
    for (position, id) in ids.enumerate() {
        if index.insert(id.clone(), position).is_some() {
            return Err(AdesError::DuplicateId {
                kind,
                id: id.clone(),
            });
        }
    }
    Ok(index)
}

fn lookup(
    index: &HashMap<String, usize>,
    kind: &'static str,
    id: &str,
    from: &str,
) -> Result<usize> {
    index
        .get(id)
        .copied()
        .ok_or_else(|| AdesError::MissingReference {
            kind,
            id: id.to_string(),
            from: from.to_string(),
        })
}

struct Resolver {
    certificates: HashMap<String, usize>,
    revocations: HashMap<String, usize>,
    timestamps: HashMap<String, usize>,
    signatures: HashMap<String, usize>,
}

impl Resolver {
    fn chain(&self, owner: &str, ids: &[String]) -> Result<Vec<CertIdx>> {
        let mut seen = HashSet::new();
        let mut chain = Vec::with_capacity(ids.len());
        for id in ids {
            let idx = CertIdx(lookup(&self.certificates, "certificate", id, owner)?);
            if !seen.insert(idx) {
                return Err(AdesError::ChainCycle {
                    owner: owner.to_string(),
                    certificate: id.clone(),
                });
            }
            chain.push(idx);
        }
        Ok(chain)
    }

    fn covered(&self, owner: &str, object: &CoveredObject) -> Result<ObjectRef> {
        let id = object.id.as_str();
        Ok(match object.category {
            ObjectCategory::Signature => {
                ObjectRef::Signature(SigIdx(lookup(&self.signatures, "signature", id, owner)?))
            }
            ObjectCategory::Certificate => ObjectRef::Certificate(CertIdx(lookup(
                &self.certificates,
                "certificate",
                id,
                owner,
            )?)),
            ObjectCategory::Revocation => ObjectRef::Revocation(RevIdx(lookup(
                &self.revocations,
                "revocation",
                id,
                owner,
            )?)),
            ObjectCategory::Timestamp => {
                ObjectRef::Timestamp(TstIdx(lookup(&self.timestamps, "timestamp", id, owner)?))
            }
        })
    }
}

impl DiagnosticGraph {
    /// Resolve all references and validate the graph structure
    pub fn build(data: DiagnosticData) -> Result<Self> {
        let resolver = Resolver {
            certificates: index_ids("certificate", data.certificates.iter().map(|c| &c.id))?,
            revocations: index_ids("revocation", data.revocations.iter().map(|r| &r.id))?,
            timestamps: index_ids("timestamp", data.timestamps.iter().map(|t| &t.id))?,
            signatures: index_ids("signature", data.signatures.iter().map(|s| &s.id))?,
        };

        let mut certificates: Vec<Certificate> =
            data.certificates.into_iter().map(certificate_node).collect();

        let mut revocations = Vec::with_capacity(data.revocations.len());
        for (position, facts) in data.revocations.into_iter().enumerate() {
            let owner = CertIdx(lookup(
                &resolver.certificates,
                "certificate",
                &facts.certificate_id,
                &facts.id,
            )?);
            certificates[owner.0].revocations.push(RevIdx(position));
            revocations.push(revocation_node(facts, owner));
        }

        let timestamps = data
            .timestamps
            .into_iter()
            .map(|facts| timestamp_node(&resolver, facts))
            .collect::<Result<Vec<_>>>()?;

        let signatures = data
            .signatures
            .into_iter()
            .map(|facts| signature_node(&resolver, facts))
            .collect::<Result<Vec<_>>>()?;

        let graph = Self {
            certificates,
            revocations,
            timestamps,
            signatures,
        };
        graph.check_coverage_acyclic()?;

        debug!(
            signatures = graph.signatures.len(),
            certificates = graph.certificates.len(),
            revocations = graph.revocations.len(),
            timestamps = graph.timestamps.len(),
            "diagnostic graph built"
        );
        Ok(graph)
    }

    /// Parse [`DiagnosticData`] from JSON and build the graph
    pub fn from_json(json: &str) -> Result<Self> {
        let data: DiagnosticData =
            serde_json::from_str(json).map_err(|e| AdesError::Parse(e.to_string()))?;
        Self::build(data)
    }

    fn check_coverage_acyclic(&self) -> Result<()> {
        // 0 = unvisited, 1 = on the current path, 2 = done
        let mut state = vec![0u8; self.timestamps.len()];
        for start in 0..self.timestamps.len() {
            self.visit_coverage(TstIdx(start), &mut state)?;
        }
        Ok(())
    }

    fn visit_coverage(&self, tst: TstIdx, state: &mut [u8]) -> Result<()> {
        match state[tst.0] {
            1 => return Err(AdesError::CoverageCycle(self.timestamps[tst.0].id.clone())),
            2 => return Ok(()),
            _ => {}
        }
        state[tst.0] = 1;
        for covered in &self.timestamps[tst.0].covers {
            if let ObjectRef::Timestamp(inner) = covered {
                self.visit_coverage(*inner, state)?;
            }
        }
        state[tst.0] = 2;
        Ok(())
    }

    pub fn certificate(&self, idx: CertIdx) -> &Certificate {
        &self.certificates[idx.0]
    }

    pub fn revocation(&self, idx: RevIdx) -> &Revocation {
        &self.revocations[idx.0]
    }

    pub fn timestamp(&self, idx: TstIdx) -> &Timestamp {
        &self.timestamps[idx.0]
    }

    pub fn signature(&self, idx: SigIdx) -> &Signature {
        &self.signatures[idx.0]
    }

    pub fn signatures(&self) -> impl Iterator<Item = (SigIdx, &Signature)> {
        self.signatures.iter().enumerate().map(|(i, s)| (SigIdx(i), s))
    }

    pub fn timestamps(&self) -> impl Iterator<Item = (TstIdx, &Timestamp)> {
        self.timestamps.iter().enumerate().map(|(i, t)| (TstIdx(i), t))
    }

    pub fn certificate_index(&self, id: &str) -> Option<CertIdx> {
        self.certificates.iter().position(|c| c.id == id).map(CertIdx)
    }

    pub fn timestamp_index(&self, id: &str) -> Option<TstIdx> {
        self.timestamps.iter().position(|t| t.id == id).map(TstIdx)
    }

    pub fn signature_index(&self, id: &str) -> Option<SigIdx> {
        self.signatures.iter().position(|s| s.id == id).map(SigIdx)
    }

    /// Id of any referenced object
    pub fn object_id(&self, object: ObjectRef) -> &str {
        match object {
            ObjectRef::Signature(idx) => &self.signature(idx).id,
            ObjectRef::Certificate(idx) => &self.certificate(idx).id,
            ObjectRef::Revocation(idx) => &self.revocation(idx).id,
            ObjectRef::Timestamp(idx) => &self.timestamp(idx).id,
        }
    }

    /// Timestamps of a signature plus every timestamp they cover,
    /// transitively, in arena order
    pub fn related_timestamps(&self, sig: SigIdx) -> Vec<TstIdx> {
        let mut found = BTreeSet::new();
        let mut pending: Vec<TstIdx> = self.signature(sig).timestamps.clone();
        while let Some(tst) = pending.pop() {
            if !found.insert(tst) {
                continue;
            }
            for covered in &self.timestamp(tst).covers {
                if let ObjectRef::Timestamp(inner) = covered {
                    pending.push(*inner);
                }
            }
        }
        found.into_iter().collect()
    }
}

fn certificate_node(facts: CertificateFacts) -> Certificate {
    Certificate {
        id: facts.id,
        not_before: facts.not_before,
        not_after: facts.not_after,
        self_signed: facts.self_signed,
        trusted: facts.trusted,
        sunset_date: facts.sunset_date,
        signature_intact: facts.signature_intact,
        ocsp_no_check: facts.ocsp_no_check,
        signature_algorithm: facts.signature_algorithm,
        revocations: Vec::new(),
    }
}

fn revocation_node(facts: RevocationFacts, certificate: CertIdx) -> Revocation {
    Revocation {
        id: facts.id,
        certificate,
        kind: facts.kind,
        production_date: facts.production_date,
        this_update: facts.this_update,
        next_update: facts.next_update,
        status: facts.status,
        revocation_date: facts.revocation_date,
        reason: facts.reason,
        signature_intact: facts.signature_intact,
    }
}

fn timestamp_node(resolver: &Resolver, facts: TimestampFacts) -> Result<Timestamp> {
    let chain = resolver.chain(&facts.id, &facts.certificate_chain)?;
    let covers = facts
        .covered_objects
        .iter()
        .map(|object| resolver.covered(&facts.id, object))
        .collect::<Result<Vec<_>>>()?;

    Ok(Timestamp {
        id: facts.id,
        kind: facts.kind,
        production_time: facts.production_time,
        chain,
        covers,
        message_imprint_found: facts.message_imprint_found,
        message_imprint_intact: facts.message_imprint_intact,
        signature_intact: facts.signature_intact,
        signature_algorithm: facts.signature_algorithm,
    })
}

fn signature_node(resolver: &Resolver, facts: SignatureFacts) -> Result<Signature> {
    let chain = resolver.chain(&facts.id, &facts.certificate_chain)?;
    let timestamps = facts
        .timestamps
        .iter()
        .map(|id| lookup(&resolver.timestamps, "timestamp", id, &facts.id).map(TstIdx))
        .collect::<Result<Vec<_>>>()?;

    Ok(Signature {
        id: facts.id,
        chain,
        signing_certificate_identified: facts.signing_certificate_identified,
        signing_certificate_digest_match: facts.signing_certificate_digest_match,
        signature_intact: facts.signature_intact,
        signature_algorithm: facts.signature_algorithm,
        digest_matchers: facts.digest_matchers,
        claimed_signing_time: facts.claimed_signing_time,
        timestamps,
    })
}
