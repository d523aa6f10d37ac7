//! Integration tests for the resolved-file analyzer against fixtures.

use std::path::PathBuf;

use swiftcheck::detect::manifest::{audit_diagnostics, audit_file};
use swiftcheck::detect::Severity;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata/resolved")
        .join(name)
}

#[test]
fn test_empty_resolved_file() {
    let audit = audit_file(fixture("empty.json"));
    assert_eq!(audit.total, 0);
    assert_eq!(audit.flagged, 0);
    assert!(audit_diagnostics(&audit, true).is_empty());
}

#[test]
fn test_clean_resolved_file() {
    let audit = audit_file(fixture("clean.json"));
    assert_eq!(audit.total, 2);
    assert_eq!(audit.flagged, 0);
    assert!(audit_diagnostics(&audit, true).is_empty());
}

#[test]
fn test_branchy_resolved_file() {
    let audit = audit_file(fixture("branchy.json"));
    assert_eq!(audit.total, 3);
    assert_eq!(audit.flagged, 2);
    assert!(audit
        .flagged_identities
        .contains(&"swift-composable-architecture".to_string()));
    assert!(audit
        .flagged_identities
        .contains(&"swift-snapshot-testing".to_string()));

    let result = audit_diagnostics(&audit, true);
    let warnings = result.count(Severity::Warning);
    let infos = result.count(Severity::Info);
    assert_eq!(warnings, 1);
    assert_eq!(infos, 2);

    let aggregate = result
        .diagnostics
        .iter()
        .find(|d| d.severity == Severity::Warning)
        .unwrap();
    assert!(aggregate.message.contains("2 of 3"));
    assert!(aggregate.suggestion.is_some());
}

#[test]
fn test_missing_fixture_degrades_to_zero() {
    let audit = audit_file(fixture("does-not-exist.json"));
    assert_eq!(audit.total, 0);
    assert_eq!(audit.flagged, 0);
}
