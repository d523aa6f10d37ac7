//! Analysis of SwiftPM `Package.resolved` pin lists.
//!
//! A pin resolved against a moving branch (or a bare revision with no
//! version) is flagged as a reproducibility anti-pattern. Malformed or
//! missing files degrade to a zero result; "no pins found" and "file
//! absent" are deliberately indistinguishable to callers of the audit
//! functions.

use globset::Glob;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use walkdir::WalkDir;

use super::{Category, Diagnostic, ScanResult, Severity};

/// Fixed candidate locations for the resolved file, relative to the package
/// root. The third is a glob for the Xcode workspace layout.
pub const RESOLVED_CANDIDATES: &[&str] = &["Package.resolved", ".package.resolved"];
pub const RESOLVED_GLOB: &str = "*.xcodeproj/project.xcworkspace/xcshareddata/swiftpm/Package.resolved";

/// How a single dependency is pinned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinState {
    /// Pinned to a moving branch reference.
    Branch(String),
    /// Pinned to a bare revision with no version.
    RevisionOnly,
    /// Pinned to an immutable version.
    Versioned,
}

/// One entry from a resolved file's pin list.
#[derive(Debug, Clone)]
pub struct DependencyPin {
    pub identity: String,
    pub state: PinState,
}

impl DependencyPin {
    /// Whether this pin is a reproducibility anti-pattern.
    pub fn is_flagged(&self) -> bool {
        !matches!(self.state, PinState::Versioned)
    }

    /// The identity as shown in flagged lists.
    pub fn flagged_label(&self) -> String {
        match &self.state {
            PinState::RevisionOnly => format!("{} (revision-only)", self.identity),
            _ => self.identity.clone(),
        }
    }
}

/// Aggregate audit result over one or more resolved files.
#[derive(Debug, Clone, Default)]
pub struct PinAudit {
    pub total: usize,
    pub flagged: usize,
    /// Flagged identities in pin order. Duplicates allowed; display paths
    /// de-duplicate with a set.
    pub flagged_identities: Vec<String>,
}

impl PinAudit {
    pub fn merge(&mut self, other: PinAudit) {
        self.total += other.total;
        self.flagged += other.flagged;
        self.flagged_identities.extend(other.flagged_identities);
    }

    /// Unique flagged identities, in stable sorted order.
    pub fn unique_flagged(&self) -> BTreeSet<String> {
        self.flagged_identities.iter().cloned().collect()
    }
}

// Wire shape of Package.resolved (format version 2).
#[derive(Debug, Deserialize)]
struct ResolvedFile {
    #[serde(default)]
    pins: Vec<ResolvedPin>,
}

#[derive(Debug, Deserialize)]
struct ResolvedPin {
    #[serde(default)]
    identity: String,
    #[serde(default)]
    state: ResolvedPinState,
}

#[derive(Debug, Default, Deserialize)]
struct ResolvedPinState {
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    revision: Option<String>,
    #[serde(default)]
    version: Option<serde_json::Value>,
}

fn classify(pin: ResolvedPin) -> DependencyPin {
    let state = if let Some(branch) = pin.state.branch {
        PinState::Branch(branch)
    } else if pin.state.revision.is_some() && pin.state.version.is_none() {
        PinState::RevisionOnly
    } else {
        PinState::Versioned
    };
    DependencyPin {
        identity: pin.identity,
        state,
    }
}

/// Parse resolved-file JSON into pins. Malformed input yields no pins.
pub fn parse_pins(text: &str) -> Vec<DependencyPin> {
    let parsed: ResolvedFile = match serde_json::from_str(text) {
        Ok(p) => p,
        Err(_) => return Vec::new(),
    };
    parsed.pins.into_iter().map(classify).collect()
}

/// Audit resolved-file JSON text.
pub fn audit_text(text: &str) -> PinAudit {
    let mut audit = PinAudit::default();
    for pin in parse_pins(text) {
        audit.total += 1;
        if pin.is_flagged() {
            audit.flagged += 1;
            audit.flagged_identities.push(pin.flagged_label());
        }
    }
    audit
}

/// Audit a resolved file on disk. Unreadable files yield a zero result.
pub fn audit_file<P: AsRef<Path>>(path: P) -> PinAudit {
    match std::fs::read_to_string(path.as_ref()) {
        Ok(text) => audit_text(&text),
        Err(_) => PinAudit::default(),
    }
}

/// Probe every candidate location under a package root and sum the results.
pub fn audit_package_root<P: AsRef<Path>>(root: P) -> PinAudit {
    let root = root.as_ref();
    let mut audit = PinAudit::default();

    for candidate in RESOLVED_CANDIDATES {
        audit.merge(audit_file(root.join(candidate)));
    }
    for path in glob_candidates(root) {
        audit.merge(audit_file(path));
    }

    audit
}

/// Whether any candidate resolved file exists at all. The audit itself
/// treats absence as zero pins; command-level error reporting needs the
/// distinction.
pub fn resolved_file_present<P: AsRef<Path>>(root: P) -> bool {
    let root = root.as_ref();
    RESOLVED_CANDIDATES.iter().any(|c| root.join(c).exists())
        || !glob_candidates(root).is_empty()
}

fn glob_candidates(root: &Path) -> Vec<std::path::PathBuf> {
    let matcher = match Glob::new(RESOLVED_GLOB) {
        Ok(g) => g.compile_matcher(),
        Err(_) => return Vec::new(),
    };

    WalkDir::new(root)
        .max_depth(5)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let rel = e.path().strip_prefix(root).ok()?;
            if matcher.is_match(rel) {
                Some(e.path().to_path_buf())
            } else {
                None
            }
        })
        .collect()
}

/// Turn an audit into diagnostics: one aggregate warning when anything is
/// flagged, plus one informational entry per unique flagged identity.
pub fn audit_diagnostics(audit: &PinAudit, flag_branches: bool) -> ScanResult {
    let mut result = ScanResult::new();
    result.scanned = 1;

    if !flag_branches || audit.flagged == 0 {
        return result;
    }

    result.push(
        Diagnostic::new(
            Severity::Warning,
            Category::Dependency,
            format!(
                "{} of {} dependencies pinned to a moving reference",
                audit.flagged, audit.total
            ),
        )
        .suggest("pin dependencies to exact versions for reproducible builds"),
    );

    for identity in audit.unique_flagged() {
        result.push(Diagnostic::new(
            Severity::Info,
            Category::Dependency,
            format!("dependency {} is not version-pinned", identity),
        ));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EMPTY: &str = r#"{"pins": [], "version": 2}"#;

    fn resolved(pins: &str) -> String {
        format!(r#"{{"pins": [{}], "version": 2}}"#, pins)
    }

    fn branch_pin(identity: &str, branch: &str) -> String {
        format!(
            r#"{{"identity": "{}", "kind": "remoteSourceControl", "state": {{"branch": "{}", "revision": "abc123"}}}}"#,
            identity, branch
        )
    }

    fn version_pin(identity: &str, version: &str) -> String {
        format!(
            r#"{{"identity": "{}", "kind": "remoteSourceControl", "state": {{"revision": "abc123", "version": "{}"}}}}"#,
            identity, version
        )
    }

    fn revision_pin(identity: &str) -> String {
        format!(
            r#"{{"identity": "{}", "kind": "remoteSourceControl", "state": {{"revision": "abc123"}}}}"#,
            identity
        )
    }

    #[test]
    fn test_zero_pins_zero_flags() {
        let audit = audit_text(EMPTY);
        assert_eq!(audit.total, 0);
        assert_eq!(audit.flagged, 0);

        let result = audit_diagnostics(&audit, true);
        assert!(result.is_empty());
    }

    #[test]
    fn test_single_branch_pin_flagged_once() {
        let audit = audit_text(&resolved(&branch_pin("swift-snapshot-testing", "main")));
        assert_eq!(audit.total, 1);
        assert_eq!(audit.flagged, 1);
        assert_eq!(audit.flagged_identities, vec!["swift-snapshot-testing"]);
    }

    #[test]
    fn test_version_pin_not_flagged() {
        let audit = audit_text(&resolved(&version_pin("swift-collections", "1.1.0")));
        assert_eq!(audit.total, 1);
        assert_eq!(audit.flagged, 0);
    }

    #[test]
    fn test_revision_only_pin_flagged_with_marker() {
        let audit = audit_text(&resolved(&revision_pin("swift-syntax")));
        assert_eq!(audit.flagged, 1);
        assert_eq!(audit.flagged_identities, vec!["swift-syntax (revision-only)"]);
    }

    #[test]
    fn test_malformed_json_is_zero_result() {
        let audit = audit_text("not json at all {");
        assert_eq!(audit.total, 0);
        assert_eq!(audit.flagged, 0);
    }

    #[test]
    fn test_missing_file_is_zero_result() {
        let audit = audit_file("/nonexistent/Package.resolved");
        assert_eq!(audit.total, 0);
    }

    #[test]
    fn test_three_pins_two_branches_diagnostics() {
        let pins = [
            branch_pin("dep-a", "main"),
            branch_pin("dep-b", "develop"),
            version_pin("dep-c", "2.0.1"),
        ]
        .join(", ");
        let audit = audit_text(&resolved(&pins));
        assert_eq!(audit.total, 3);
        assert_eq!(audit.flagged, 2);

        let result = audit_diagnostics(&audit, true);
        let warnings: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect();
        let infos: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Info)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("2 of 3"));
        assert_eq!(infos.len(), 2);
    }

    #[test]
    fn test_flagging_disabled() {
        let audit = audit_text(&resolved(&branch_pin("dep-a", "main")));
        let result = audit_diagnostics(&audit, false);
        assert!(result.is_empty());
    }

    #[test]
    fn test_duplicate_identities_deduplicated_for_display() {
        let pins = [branch_pin("dep-a", "main"), branch_pin("dep-a", "main")].join(", ");
        let audit = audit_text(&resolved(&pins));
        assert_eq!(audit.flagged, 2);
        assert_eq!(audit.flagged_identities.len(), 2);
        assert_eq!(audit.unique_flagged().len(), 1);

        let result = audit_diagnostics(&audit, true);
        let infos = result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Info)
            .count();
        assert_eq!(infos, 1);
    }

    #[test]
    fn test_candidate_paths_summed() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("Package.resolved"),
            resolved(&branch_pin("dep-a", "main")),
        )
        .unwrap();

        let workspace = temp
            .path()
            .join("App.xcodeproj/project.xcworkspace/xcshareddata/swiftpm");
        std::fs::create_dir_all(&workspace).unwrap();
        std::fs::write(
            workspace.join("Package.resolved"),
            resolved(&version_pin("dep-b", "1.0.0")),
        )
        .unwrap();

        let audit = audit_package_root(temp.path());
        assert_eq!(audit.total, 2);
        assert_eq!(audit.flagged, 1);
        assert!(resolved_file_present(temp.path()));
    }

    #[test]
    fn test_resolved_file_absent() {
        let temp = TempDir::new().unwrap();
        assert!(!resolved_file_present(temp.path()));
        let audit = audit_package_root(temp.path());
        assert_eq!(audit.total, 0);
    }
}
