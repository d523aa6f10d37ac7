//! Composition complexity analysis for view and reducer builder blocks.
//!
//! Works on blocks extracted heuristically by the scanner. Three checks:
//! nested `Group` detection, implicit composition counting, and reducer
//! builder complexity scoring. The thresholds here were derived from
//! observed anti-pattern corpora; they are the contract of this module and
//! must not be re-tuned casually.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

use crate::scan::{self, Block};

use super::{Category, Diagnostic, ScanResult, Severity};

/// Trigger for a SwiftUI view body block.
pub const VIEW_BODY_TRIGGER: &str = "var body: some View";
/// Trigger for a reducer builder block.
pub const REDUCER_BODY_TRIGGER: &str = "var body: some ReducerOf";
/// The grouping construct tracked by nesting detection.
pub const GROUP_TOKEN: &str = "Group {";

/// Component factory calls recognized by the component-line classifier.
/// Shared between view bodies and reducer builders.
const COMPONENT_PREFIXES: &[&str] = &[
    "Text(",
    "Image(",
    "Button(",
    "Label(",
    "Spacer(",
    "Divider(",
    "HStack(",
    "VStack(",
    "ZStack(",
    "LazyVStack(",
    "LazyHStack(",
    "ScrollView(",
    "List(",
    "ForEach(",
    "Scope(",
    "Reduce(",
    "Reduce {",
    "BindingReducer(",
    "EmptyReducer(",
];

/// First tokens that mark a conditional/branch line.
static CONDITIONAL_KEYWORDS: phf::Set<&'static str> = phf::phf_set! {
    "if", "guard", "switch", "else", "case",
};

lazy_static! {
    /// CamelCase component call in the two recognized suffix families.
    static ref COMPONENT_SUFFIX: Regex =
        Regex::new(r"^[A-Z][A-Za-z0-9]*(View|Screen)\(").unwrap();
}

/// Complexity measurements for one scanned block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositionReport {
    pub nesting_level: usize,
    pub implicit_count: usize,
    pub conditional_branches: usize,
    pub reducer_components: usize,
    pub complexity_score: usize,
}

/// Classify a line as a component call.
fn is_component_line(line: &str) -> bool {
    let t = line.trim_start();
    COMPONENT_PREFIXES.iter().any(|p| t.starts_with(p)) || COMPONENT_SUFFIX.is_match(t)
}

/// Classify a line as a conditional branch: a leading conditional keyword
/// (leading close-braces ignored, so `} else {` counts) or a ternary marker.
fn is_conditional_line(line: &str) -> bool {
    let t = line.trim_start_matches(|c: char| c == '}' || c.is_whitespace());
    let first = t
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or("");
    CONDITIONAL_KEYWORDS.contains(first) || line.contains(" ? ")
}

/// Measure a view body block: `Group` nesting and implicit composition.
///
/// The nesting counter increments on each `Group {` occurrence and
/// decrements once per closing brace while the stack is non-empty, so
/// braces belonging to sibling constructs can close a group early. That
/// imprecision is part of the heuristic.
pub fn analyze_view_block(block: &Block) -> CompositionReport {
    let mut report = CompositionReport::default();
    let mut depth: usize = 0;

    for line in &block.lines {
        if scan::is_skippable(line) {
            continue;
        }

        let opens = line.matches(GROUP_TOKEN).count();
        for _ in 0..opens {
            depth += 1;
            report.nesting_level = report.nesting_level.max(depth);
        }

        // Lines already wrapped in a Group (or the Group line itself) are
        // explicitly grouped and do not count as implicit composition.
        if depth == 0 && is_component_line(line) {
            report.implicit_count += 1;
        }

        let closes = scan::closing_braces(line);
        for _ in 0..closes {
            if depth == 0 {
                break;
            }
            depth -= 1;
        }
    }

    report
}

/// Measure a reducer builder block: branch count and component count,
/// combined into `branches + 2 * components`.
pub fn analyze_reducer_block(block: &Block) -> CompositionReport {
    let mut report = CompositionReport::default();

    for line in &block.lines {
        if scan::is_skippable(line) {
            continue;
        }
        if is_conditional_line(line) {
            report.conditional_branches += 1;
        } else if is_component_line(line) {
            report.reducer_components += 1;
        }
    }

    report.complexity_score = report.conditional_branches + 2 * report.reducer_components;
    report
}

/// Run composition analysis over one file's text.
pub fn scan_composition(content: &str, file: &str) -> ScanResult {
    let mut result = ScanResult::new();
    let lines: Vec<&str> = content.lines().collect();

    for trigger_idx in scan::find_triggers(&lines, VIEW_BODY_TRIGGER) {
        let block = scan::extract_block(&lines, trigger_idx);
        let report = analyze_view_block(&block);
        push_view_diagnostics(&report, file, trigger_idx + 1, &mut result);
    }

    for trigger_idx in scan::find_triggers(&lines, REDUCER_BODY_TRIGGER) {
        let block = scan::extract_block(&lines, trigger_idx);
        let report = analyze_reducer_block(&block);
        push_reducer_diagnostics(&report, file, trigger_idx + 1, &mut result);
    }

    result
}

/// Convenience wrapper: read and analyze a file from disk.
pub fn scan_composition_file<P: AsRef<Path>>(path: P) -> anyhow::Result<ScanResult> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let file = path.as_ref().to_string_lossy().to_string();
    Ok(scan_composition(&content, &file))
}

fn push_view_diagnostics(
    report: &CompositionReport,
    file: &str,
    line: usize,
    result: &mut ScanResult,
) {
    // Nesting > 1 is always an error, independent of any other score.
    if report.nesting_level > 1 {
        result.push(
            Diagnostic::new(
                Severity::Error,
                Category::Performance,
                format!(
                    "nested Group depth {} causes exponential type-checker blow-up",
                    report.nesting_level
                ),
            )
            .at(file, line)
            .suggest("flatten the groups or extract subviews"),
        );
    }

    if report.implicit_count >= 5 {
        result.push(
            Diagnostic::new(
                Severity::Error,
                Category::Performance,
                format!(
                    "excessive implicit composition: {} ungrouped component calls",
                    report.implicit_count
                ),
            )
            .at(file, line)
            .suggest("wrap related views in Group or extract subviews"),
        );
    } else if report.implicit_count >= 3 {
        result.push(
            Diagnostic::new(
                Severity::Warning,
                Category::Performance,
                format!(
                    "implicit composition of {} ungrouped component calls",
                    report.implicit_count
                ),
            )
            .at(file, line)
            .suggest("consider grouping related views"),
        );
    }
}

fn push_reducer_diagnostics(
    report: &CompositionReport,
    file: &str,
    line: usize,
    result: &mut ScanResult,
) {
    let score = report.complexity_score;
    if score >= 20 {
        result.push(
            Diagnostic::new(
                Severity::Error,
                Category::Performance,
                format!("builder complexity {} will cause a definite explosion", score),
            )
            .at(file, line)
            .suggest("split the reducer into child reducers"),
        );
    } else if score >= 15 {
        result.push(
            Diagnostic::new(
                Severity::Warning,
                Category::Performance,
                format!("builder complexity {} is a high compile-time risk", score),
            )
            .at(file, line)
            .suggest("split the reducer into child reducers"),
        );
    } else if score >= 8 {
        result.push(
            Diagnostic::new(
                Severity::Warning,
                Category::Performance,
                format!("builder complexity {} may cause a compile slowdown", score),
            )
            .at(file, line)
            .suggest("watch this builder as it grows"),
        );
    }

    // Component count tiers fire in addition to the score tiers.
    if report.reducer_components >= 8 {
        result.push(
            Diagnostic::new(
                Severity::Error,
                Category::Performance,
                format!(
                    "{} reducer components in one builder",
                    report.reducer_components
                ),
            )
            .at(file, line)
            .suggest("compose child reducers with Scope"),
        );
    } else if report.reducer_components >= 5 {
        result.push(
            Diagnostic::new(
                Severity::Warning,
                Category::Performance,
                format!(
                    "{} reducer components in one builder",
                    report.reducer_components
                ),
            )
            .at(file, line)
            .suggest("compose child reducers with Scope"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(lines: &[&str]) -> Block {
        Block {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            start_line: 2,
        }
    }

    #[test]
    fn test_component_line_classifier() {
        assert!(is_component_line("    Text(\"hello\")"));
        assert!(is_component_line("ForEach(items) { item in"));
        assert!(is_component_line("ProfileView(user: user)"));
        assert!(is_component_line("SettingsScreen()"));
        assert!(is_component_line("Scope(state: \\.child, action: \\.child) {"));
        assert!(!is_component_line("let x = 1"));
        assert!(!is_component_line("profileView(user: user)")); // lowercase
        assert!(!is_component_line("ProfileCell(user: user)")); // wrong suffix family
    }

    #[test]
    fn test_conditional_line_classifier() {
        assert!(is_conditional_line("if showDetail {"));
        assert!(is_conditional_line("    guard let user else { return }"));
        assert!(is_conditional_line("} else {"));
        assert!(is_conditional_line("switch action {"));
        assert!(is_conditional_line("let title = isOn ? \"on\" : \"off\""));
        assert!(!is_conditional_line("Text(\"if\")"));
        assert!(!is_conditional_line("Reduce { state, action in"));
    }

    #[test]
    fn test_nested_groups_reported_as_error() {
        // Second Group opens before the first one's matching close.
        let b = block(&[
            "Group {",
            "    Group {",
            "        Text(\"a\")",
            "    }",
            "}",
            "}",
        ]);
        let report = analyze_view_block(&b);
        assert_eq!(report.nesting_level, 2);

        let mut result = ScanResult::new();
        push_view_diagnostics(&report, "V.swift", 1, &mut result);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error && d.message.contains("nested Group")));
    }

    #[test]
    fn test_sequential_groups_do_not_nest() {
        let b = block(&[
            "Group {",
            "    Text(\"a\")",
            "}",
            "Group {",
            "    Text(\"b\")",
            "}",
            "}",
        ]);
        let report = analyze_view_block(&b);
        assert_eq!(report.nesting_level, 1);
    }

    #[test]
    fn test_grouped_components_not_counted_as_implicit() {
        let b = block(&[
            "Group {",
            "    Text(\"a\")",
            "    Text(\"b\")",
            "}",
            "Text(\"c\")",
            "}",
        ]);
        let report = analyze_view_block(&b);
        assert_eq!(report.implicit_count, 1);
    }

    #[test]
    fn test_four_components_warn_five_error() {
        let four = block(&[
            "Text(\"a\")",
            "Text(\"b\")",
            "Image(systemName: \"x\")",
            "Spacer()",
            "}",
        ]);
        let report = analyze_view_block(&four);
        assert_eq!(report.implicit_count, 4);

        let mut result = ScanResult::new();
        push_view_diagnostics(&report, "V.swift", 1, &mut result);
        assert_eq!(result.len(), 1);
        assert_eq!(result.diagnostics[0].severity, Severity::Warning);

        let five = block(&[
            "Text(\"a\")",
            "Text(\"b\")",
            "Image(systemName: \"x\")",
            "Spacer()",
            "Divider()",
            "}",
        ]);
        let report = analyze_view_block(&five);
        assert_eq!(report.implicit_count, 5);

        let mut result = ScanResult::new();
        push_view_diagnostics(&report, "V.swift", 1, &mut result);
        assert_eq!(result.len(), 1);
        assert_eq!(result.diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn test_two_components_silent() {
        let b = block(&["Text(\"a\")", "Spacer()", "}"]);
        let report = analyze_view_block(&b);
        assert_eq!(report.implicit_count, 2);

        let mut result = ScanResult::new();
        push_view_diagnostics(&report, "V.swift", 1, &mut result);
        assert!(result.is_empty());
    }

    #[test]
    fn test_builder_score_deterministic() {
        // 3 conditional lines + 4 component lines: score = 3 + 2*4 = 11
        let b = block(&[
            "if state.isLoading {",
            "guard canRetry else { return .none }",
            "} else {",
            "Scope(state: \\.a, action: \\.a) {",
            "Scope(state: \\.b, action: \\.b) {",
            "Reduce { state, action in",
            "BindingReducer()",
            "}",
        ]);
        let report = analyze_reducer_block(&b);
        assert_eq!(report.conditional_branches, 3);
        assert_eq!(report.reducer_components, 4);
        assert_eq!(report.complexity_score, 11);

        let mut result = ScanResult::new();
        push_reducer_diagnostics(&report, "R.swift", 1, &mut result);
        assert_eq!(result.len(), 1);
        assert_eq!(result.diagnostics[0].severity, Severity::Warning);
        assert!(result.diagnostics[0].message.contains("slowdown"));
    }

    #[test]
    fn test_score_tiers() {
        let cases: &[(usize, usize, Option<Severity>)] = &[
            (7, 0, None),                       // score 7: silent
            (8, 0, Some(Severity::Warning)),    // score 8: slowdown
            (14, 0, Some(Severity::Warning)),   // score 14: slowdown
            (15, 0, Some(Severity::Warning)),   // score 15: high risk
            (19, 0, Some(Severity::Warning)),   // score 19: high risk
            (20, 0, Some(Severity::Error)),     // score 20: explosion
        ];
        for &(branches, components, expected) in cases {
            let report = CompositionReport {
                nesting_level: 0,
                implicit_count: 0,
                conditional_branches: branches,
                reducer_components: components,
                complexity_score: branches + 2 * components,
            };
            let mut result = ScanResult::new();
            push_reducer_diagnostics(&report, "R.swift", 1, &mut result);
            match expected {
                None => assert!(result.is_empty(), "score {} should be silent", branches),
                Some(sev) => {
                    assert_eq!(result.len(), 1, "score {}", branches);
                    assert_eq!(result.diagnostics[0].severity, sev, "score {}", branches);
                }
            }
        }
    }

    #[test]
    fn test_component_count_tiers_fire_in_addition() {
        // 8 components: score 16 (high risk warning) AND component error
        let report = CompositionReport {
            nesting_level: 0,
            implicit_count: 0,
            conditional_branches: 0,
            reducer_components: 8,
            complexity_score: 16,
        };
        let mut result = ScanResult::new();
        push_reducer_diagnostics(&report, "R.swift", 1, &mut result);
        assert_eq!(result.len(), 2);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning && d.message.contains("high")));
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error && d.message.contains("reducer components")));
    }

    #[test]
    fn test_scan_composition_end_to_end() {
        let source = r#"
struct HeavyView: View {
    var body: some View {
        Text("a")
        Text("b")
        Image(systemName: "x")
        Spacer()
        Divider()
    }
}
"#;
        let result = scan_composition(source, "HeavyView.swift");
        assert_eq!(result.len(), 1);
        assert_eq!(result.diagnostics[0].severity, Severity::Error);
        assert!(result.diagnostics[0].message.contains("excessive"));
        // Location points at the trigger line
        assert_eq!(result.diagnostics[0].location.as_ref().unwrap().line, 3);
    }
}
