//! Evaluation of the pattern rule tables over source text.

use std::collections::HashSet;
use std::path::Path;

use crate::rules::{PatternRule, RuleSet};

use super::{Diagnostic, ScanResult, Severity};

/// Scan files against every table in the rule set.
///
/// Tables are not mutually exclusive: a file can match rules across several
/// tables, and no table short-circuits on first match. Multiple matches of
/// the same diagnostic rule within one file collapse to a single diagnostic
/// at the first matching line. The positive table intentionally does not
/// collapse; every match is reported.
pub fn scan_rules<P: AsRef<Path>>(files: &[P], rules: &RuleSet) -> ScanResult {
    let mut result = ScanResult::new();

    for file in files {
        let path = file.as_ref();
        let file_str = path.to_string_lossy().to_string();
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                // Unreadable source degrades to a single diagnostic; the
                // remaining files still get scanned.
                result.push(
                    Diagnostic::new(
                        Severity::Warning,
                        super::Category::Unknown,
                        format!("could not read {}: {}", file_str, e),
                    )
                    .suggest("check file permissions and encoding"),
                );
                continue;
            }
        };

        scan_text(&content, &file_str, rules, &mut result);
        result.scanned += 1;
    }

    result
}

/// Evaluate all four tables against one file's full text.
pub fn scan_text(content: &str, file: &str, rules: &RuleSet, result: &mut ScanResult) {
    let lines: Vec<&str> = content.lines().collect();

    apply_table(&rules.deprecated, content, &lines, file, true, result);
    apply_table(&rules.anti_patterns, content, &lines, file, true, result);
    apply_table(&rules.sheet, content, &lines, file, true, result);
    apply_table(&rules.positive, content, &lines, file, false, result);
}

fn apply_table(
    table: &[PatternRule],
    content: &str,
    lines: &[&str],
    file: &str,
    dedup: bool,
    result: &mut ScanResult,
) {
    let mut seen: HashSet<usize> = HashSet::new();

    for (rule_idx, rule) in table.iter().enumerate() {
        // Context-gated rules only apply when the marker appears in the file.
        if let Some(marker) = &rule.context {
            if !content.contains(marker.as_str()) {
                continue;
            }
        }

        for (line_idx, line) in lines.iter().enumerate() {
            if !rule.regex.is_match(line) {
                continue;
            }
            if dedup && !seen.insert(rule_idx) {
                continue;
            }

            let mut diag = Diagnostic::new(rule.severity, rule.category, rule.message.clone())
                .at(file, line_idx + 1);
            if let Some(reference) = &rule.reference {
                diag = diag.suggest(reference.clone());
            }
            result.push(diag);

            if dedup {
                // One diagnostic per (rule, file); skip the rest of the file.
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Category;
    use crate::rules::{RuleFileSpec, RuleSpec};
    use tempfile::TempDir;

    fn spec(pattern: &str, message: &str) -> RuleSpec {
        RuleSpec {
            pattern: pattern.to_string(),
            message: message.to_string(),
            reference: None,
            severity: None,
            category: None,
            context: None,
        }
    }

    #[test]
    fn test_deprecated_match_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("View.swift");
        std::fs::write(&path, "struct A: View {\n  var x = NavigationView()\n}\n").unwrap();

        let result = scan_rules(&[&path], RuleSet::builtin());
        let hit = result
            .diagnostics
            .iter()
            .find(|d| d.message.contains("NavigationView"))
            .expect("should flag NavigationView");
        assert_eq!(hit.severity, Severity::Error);
        assert_eq!(hit.location.as_ref().unwrap().line, 2);
    }

    #[test]
    fn test_diagnostic_rules_dedup_per_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("V.swift");
        std::fs::write(&path, "print(\"a\")\nprint(\"b\")\nprint(\"c\")\n").unwrap();

        let result = scan_rules(&[&path], RuleSet::builtin());
        let hits: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| d.message.contains("print()"))
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].location.as_ref().unwrap().line, 1);
    }

    #[test]
    fn test_positive_matches_not_deduplicated() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("V.swift");
        std::fs::write(
            &path,
            "Text(\"a\").accessibilityLabel(\"a\")\nText(\"b\").accessibilityLabel(\"b\")\n",
        )
        .unwrap();

        let result = scan_rules(&[&path], RuleSet::builtin());
        let praises: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| d.message.contains("accessibility label"))
            .collect();
        assert_eq!(praises.len(), 2);
        assert!(praises.iter().all(|d| d.severity == Severity::Info));
    }

    #[test]
    fn test_context_gated_rule_skipped_without_marker() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("V.swift");
        // The detents pattern appears but the file never uses .sheet(
        std::fs::write(&path, ".presentationDetents([])\n").unwrap();

        let result = scan_rules(&[&path], RuleSet::builtin());
        assert!(!result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("detents")));
    }

    #[test]
    fn test_context_gated_rule_fires_with_marker() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("V.swift");
        std::fs::write(
            &path,
            ".sheet(isPresented: $show) { Detail() }\n.presentationDetents([])\n",
        )
        .unwrap();

        let result = scan_rules(&[&path], RuleSet::builtin());
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("detents")));
    }

    #[test]
    fn test_tables_evaluated_independently() {
        let mut file_spec = RuleFileSpec::default();
        file_spec.deprecated.push(spec("legacyCall", "legacy API"));
        file_spec.anti_patterns.push(spec("legacyCall", "discouraged"));
        let rules = RuleSet::from_spec(file_spec);

        let mut result = ScanResult::new();
        scan_text("legacyCall()\n", "a.swift", &rules, &mut result);
        // Both tables report, no short-circuit across tables
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_unreadable_file_degrades_gracefully() {
        let result = scan_rules(&[Path::new("/nonexistent/nope.swift")], RuleSet::builtin());
        assert_eq!(result.len(), 1);
        assert_eq!(result.diagnostics[0].severity, Severity::Warning);
        assert_eq!(result.diagnostics[0].category, Category::Unknown);
        assert_eq!(result.scanned, 0);
    }
}
