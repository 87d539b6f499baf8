//! Proof of existence
//!
//! Every object maps to an ordered set of proven times. Only timestamps that
//! validated contribute, and an object's POE is the minimum of its records,
//! defaulting to the current validation time when nothing covers it.
//!
//! Building happens in two passes over a signature's timestamps:
//!
//! 1. ascending production time, every timestamp whose basic validation
//!    PASSED proves its covered objects, transitively through covered
//!    timestamps;
//! 2. newest to oldest, a timestamp left INDETERMINATE with a recoverable
//!    sub-indication contributes once past signature validation accepts it
//!    against the POE gathered so far.
//!
//! The model is frozen before past certificate or signature validation reads
//! it.

use crate::bbb::TimestampValidation;
use crate::psv::{self, PsvResult};
use crate::token::TokenRef;
use ades_core::{DiagnosticGraph, ObjectRef, TimestampKind, TstIdx, ValidationContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::Deref;
use tracing::{debug, warn};

/// Which timestamps may contribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoeScope {
    /// Everything except archive timestamps
    LongTerm,
    /// All timestamps
    Archival,
}

impl PoeScope {
    pub fn includes(&self, kind: TimestampKind) -> bool {
        match self {
            PoeScope::LongTerm => kind != TimestampKind::Archive,
            PoeScope::Archival => true,
        }
    }
}

/// One proven time for an object
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoeRecord {
    pub time: DateTime<Utc>,
    /// Timestamp providing the proof
    pub timestamp: String,
    /// The providing timestamp's chain was accepted only under a downgraded
    /// sunset check
    pub sunset_warned: bool,
}

#[derive(Debug, Clone)]
pub struct PoeModel {
    current_time: DateTime<Utc>,
    records: BTreeMap<ObjectRef, BTreeSet<PoeRecord>>,
}

impl PoeModel {
    pub fn new(current_time: DateTime<Utc>) -> Self {
        Self {
            current_time,
            records: BTreeMap::new(),
        }
    }

    pub fn current_time(&self) -> DateTime<Utc> {
        self.current_time
    }

    pub fn add(&mut self, object: ObjectRef, record: PoeRecord) {
        self.records.entry(object).or_default().insert(record);
    }

    /// Earliest proven time, or the current time when nothing proves it
    pub fn lowest(&self, object: ObjectRef) -> DateTime<Utc> {
        self.lowest_matching(object, |_| true)
    }

    /// Earliest proven time ignoring proofs from sunset-warned timestamps
    pub fn lowest_excluding_sunset_warned(&self, object: ObjectRef) -> DateTime<Utc> {
        self.lowest_matching(object, |record| !record.sunset_warned)
    }

    fn lowest_matching(&self, object: ObjectRef, keep: impl Fn(&PoeRecord) -> bool) -> DateTime<Utc> {
        self.records
            .get(&object)
            .and_then(|records| records.iter().find(|r| keep(r)))
            .map(|record| record.time.min(self.current_time))
            .unwrap_or(self.current_time)
    }

    /// POE at or before `time`, counting the current-time default
    pub fn exists_at_or_before(&self, object: ObjectRef, time: DateTime<Utc>) -> bool {
        self.lowest(object) <= time
    }

    /// A timestamp actually proves the object at or before `time`
    pub fn has_proof_at_or_before(&self, object: ObjectRef, time: DateTime<Utc>) -> bool {
        self.records
            .get(&object)
            .and_then(|records| records.iter().next())
            .map(|record| record.time <= time)
            .unwrap_or(false)
    }

    /// Earliest proof per proven object, in arena order
    pub fn entries(&self, graph: &DiagnosticGraph) -> Vec<PoeEntry> {
        self.records
            .iter()
            .filter_map(|(object, records)| {
                records.iter().next().map(|record| PoeEntry {
                    object: graph.object_id(*object).to_string(),
                    time: record.time,
                    timestamp: record.timestamp.clone(),
                })
            })
            .collect()
    }

    pub fn freeze(self) -> FrozenPoe {
        FrozenPoe(self)
    }
}

/// Read-only view handed to past validation
#[derive(Debug, Clone)]
pub struct FrozenPoe(PoeModel);

impl Deref for FrozenPoe {
    type Target = PoeModel;

    fn deref(&self) -> &PoeModel {
        &self.0
    }
}

/// Earliest proof of one object as shown in reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoeEntry {
    pub object: String,
    pub time: DateTime<Utc>,
    pub timestamp: String,
}

/// Result of building the POE model for one stage
#[derive(Debug, Clone)]
pub struct PoeBuild {
    pub poe: FrozenPoe,
    /// Timestamps whose proofs were used, in contribution order
    pub contributors: Vec<TstIdx>,
    /// Past signature validation of recovered timestamps, by position in the
    /// input slice
    pub recovered: Vec<(usize, PsvResult)>,
}

/// Add a timestamp's production time to everything it covers
fn contribute(graph: &DiagnosticGraph, model: &mut PoeModel, tst: TstIdx, sunset_warned: bool) {
    let timestamp = graph.timestamp(tst);
    let record = PoeRecord {
        time: timestamp.production_time,
        timestamp: timestamp.id.clone(),
        sunset_warned,
    };

    let mut visited = HashSet::new();
    let mut pending: Vec<ObjectRef> = timestamp.covers.clone();
    while let Some(object) = pending.pop() {
        if !visited.insert(object) {
            continue;
        }
        model.add(object, record.clone());
        if let ObjectRef::Timestamp(inner) = object {
            pending.extend(graph.timestamp(inner).covers.iter().copied());
        }
    }
}

/// Build the POE model from validated timestamps
pub fn build(
    ctx: &ValidationContext,
    timestamps: &[TimestampValidation],
    scope: PoeScope,
) -> PoeBuild {
    let graph = ctx.graph();
    let mut model = PoeModel::new(ctx.current_time());
    let mut contributors = Vec::new();
    let mut recovered = Vec::new();

    let mut in_scope: Vec<usize> = (0..timestamps.len())
        .filter(|&i| scope.includes(graph.timestamp(timestamps[i].index).kind))
        .collect();
    in_scope.sort_by_key(|&i| (graph.timestamp(timestamps[i].index).production_time, timestamps[i].index));

    for &i in &in_scope {
        let validation = &timestamps[i];
        if validation.bbb.conclusion.is_passed() {
            contribute(graph, &mut model, validation.index, validation.bbb.xcv.sunset_warned);
            contributors.push(validation.index);
        }
    }

    for &i in in_scope.iter().rev() {
        let validation = &timestamps[i];
        let conclusion = &validation.bbb.conclusion;
        if conclusion.is_passed() {
            continue;
        }
        if !conclusion.is_poe_recoverable() {
            warn!(
                timestamp = %validation.bbb.id,
                conclusion = %conclusion,
                "timestamp cannot provide proof of existence"
            );
            continue;
        }

        let snapshot = model.clone().freeze();
        let result = psv::validate(ctx, TokenRef::Timestamp(validation.index), conclusion, &snapshot);
        if result.conclusion.is_passed() {
            debug!(timestamp = %validation.bbb.id, "timestamp recovered by past validation");
            contribute(graph, &mut model, validation.index, validation.bbb.xcv.sunset_warned);
            contributors.push(validation.index);
        }
        recovered.push((i, result));
    }

    debug!(
        scope = ?scope,
        contributors = contributors.len(),
        "proof of existence built"
    );

    PoeBuild {
        poe: model.freeze(),
        contributors,
        recovered,
    }
}
