//! Integration tests for building the diagnostic graph from JSON input.

use ades_core::{AdesError, DiagnosticGraph, ObjectRef, TimestampKind};

const BASE: &str = r#"{
  "certificates": [
    {"id": "leaf", "notBefore": "2020-01-01T00:00:00Z", "notAfter": "2030-01-01T00:00:00Z"},
    {"id": "root", "notBefore": "2015-01-01T00:00:00Z", "notAfter": "2035-01-01T00:00:00Z",
     "selfSigned": true, "trusted": true, "sunsetDate": "2034-01-01T00:00:00Z"}
  ],
  "revocations": [
    {"id": "crl-leaf", "certificateId": "leaf", "kind": "CRL",
     "productionDate": "2024-05-01T00:00:00Z", "thisUpdate": "2024-05-01T00:00:00Z",
     "nextUpdate": "2024-06-01T00:00:00Z", "status": "GOOD"}
  ],
  "timestamps": [
    {"id": "sig-tst", "kind": "SIGNATURE", "productionTime": "2024-01-01T00:00:00Z",
     "certificateChain": ["leaf", "root"],
     "coveredObjects": [{"category": "SIGNATURE", "id": "sig-1"}]},
    {"id": "arc-tst", "kind": "ARCHIVE", "productionTime": "2024-03-01T00:00:00Z",
     "certificateChain": ["leaf", "root"],
     "coveredObjects": [
        {"category": "TIMESTAMP", "id": "sig-tst"},
        {"category": "REVOCATION", "id": "crl-leaf"}
     ]}
  ],
  "signatures": [
    {"id": "sig-1", "certificateChain": ["leaf", "root"],
     "claimedSigningTime": "2023-12-31T00:00:00Z",
     "digestMatchers": [{"kind": "REFERENCE", "dataFound": true, "dataIntact": true}],
     "timestamps": ["arc-tst"]}
  ]
}"#;

// =============================================================================
// Well-formed input
// =============================================================================

#[test]
fn test_build_from_json() {
    let graph = DiagnosticGraph::from_json(BASE).unwrap();

    let (sig_idx, signature) = graph.signatures().next().unwrap();
    assert_eq!(signature.id, "sig-1");
    assert_eq!(signature.chain.len(), 2);
    assert!(signature.signing_certificate_identified);

    let root = graph.certificate(signature.chain[1]);
    assert!(root.trusted);
    assert!(root.sunset_date.is_some());

    // the archive timestamp pulls in the signature timestamp it covers
    let related = graph.related_timestamps(sig_idx);
    assert_eq!(related.len(), 2);
    let kinds: Vec<TimestampKind> = related.iter().map(|t| graph.timestamp(*t).kind).collect();
    assert!(kinds.contains(&TimestampKind::Signature));
    assert!(kinds.contains(&TimestampKind::Archive));
}

#[test]
fn test_covered_objects_are_resolved() {
    let graph = DiagnosticGraph::from_json(BASE).unwrap();
    let archive = graph.timestamp_index("arc-tst").unwrap();
    let covers = &graph.timestamp(archive).covers;

    assert!(matches!(covers[0], ObjectRef::Timestamp(_)));
    assert!(matches!(covers[1], ObjectRef::Revocation(_)));
    assert_eq!(graph.object_id(covers[1]), "crl-leaf");
}

// =============================================================================
// Structural errors
// =============================================================================

#[test]
fn test_missing_certificate_reference() {
    let json = BASE.replace(r#""certificateChain": ["leaf", "root"],
     "claimedSigningTime""#, r#""certificateChain": ["leaf", "ghost"],
     "claimedSigningTime""#);
    let err = DiagnosticGraph::from_json(&json).unwrap_err();
    match err {
        AdesError::MissingReference { kind, id, from } => {
            assert_eq!(kind, "certificate");
            assert_eq!(id, "ghost");
            assert_eq!(from, "sig-1");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_missing_timestamp_reference() {
    let json = BASE.replace(r#""timestamps": ["arc-tst"]"#, r#""timestamps": ["nope"]"#);
    let err = DiagnosticGraph::from_json(&json).unwrap_err();
    assert!(matches!(err, AdesError::MissingReference { kind: "timestamp", .. }));
}

#[test]
fn test_chain_cycle() {
    let json = BASE.replace(
        r#""certificateChain": ["leaf", "root"],
     "claimedSigningTime""#,
        r#""certificateChain": ["leaf", "root", "leaf"],
     "claimedSigningTime""#,
    );
    let err = DiagnosticGraph::from_json(&json).unwrap_err();
    assert!(matches!(err, AdesError::ChainCycle { .. }));
    assert_eq!(err.to_string(), "GRAPH/chain of sig-1 repeats certificate leaf");
}

#[test]
fn test_malformed_json() {
    let err = DiagnosticGraph::from_json("{ not json").unwrap_err();
    assert!(matches!(err, AdesError::Parse(_)));
}
