//! Declarative pattern rule tables.
//!
//! Detection is driven by four fixed tables:
//! - deprecated: patterns that must never appear, always error severity
//! - anti-pattern: discouraged patterns, each with its own severity and a
//!   rationale reference
//! - positive: patterns whose presence is reported as informational praise
//! - sheet: context-gated patterns, only evaluated when the file contains
//!   the rule's context marker
//!
//! The built-in tables are constructed once at startup and never mutated.
//! A YAML file in the same shape can replace them, so tests and users can
//! substitute a minimal rule set. A rule whose pattern fails to compile is
//! dropped at construction time; there are no partial matches on a
//! malformed rule.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

use crate::detect::{Category, Severity};

/// A compiled detection rule.
#[derive(Debug)]
pub struct PatternRule {
    pub regex: Regex,
    pub message: String,
    pub reference: Option<String>,
    pub severity: Severity,
    pub category: Category,
    /// Literal marker that must appear somewhere in the file for this rule
    /// to be evaluated at all.
    pub context: Option<String>,
}

/// The four rule tables driving source detection.
#[derive(Debug, Default)]
pub struct RuleSet {
    pub deprecated: Vec<PatternRule>,
    pub anti_patterns: Vec<PatternRule>,
    pub positive: Vec<PatternRule>,
    pub sheet: Vec<PatternRule>,
}

/// Raw rule as written in a YAML override file.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
    pub pattern: String,
    pub message: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub context: Option<String>,
}

/// Raw rule file shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleFileSpec {
    #[serde(default)]
    pub deprecated: Vec<RuleSpec>,
    #[serde(default)]
    pub anti_patterns: Vec<RuleSpec>,
    #[serde(default)]
    pub positive: Vec<RuleSpec>,
    #[serde(default)]
    pub sheet: Vec<RuleSpec>,
}

impl RuleSet {
    /// The built-in tables.
    pub fn builtin() -> &'static RuleSet {
        &BUILTIN
    }

    /// Load a rule set from a YAML file, replacing the built-in tables.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<RuleSet> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let spec: RuleFileSpec = serde_yaml::from_str(&content)?;
        Ok(RuleSet::from_spec(spec))
    }

    /// Build a rule set from raw specs, dropping rules that fail to compile.
    pub fn from_spec(spec: RuleFileSpec) -> RuleSet {
        RuleSet {
            // Deprecated patterns are always errors regardless of what the
            // file says.
            deprecated: compile(spec.deprecated, Severity::Error, Category::Compilation, true),
            anti_patterns: compile(spec.anti_patterns, Severity::Warning, Category::Compilation, false),
            positive: compile(spec.positive, Severity::Info, Category::Compilation, false),
            sheet: compile(spec.sheet, Severity::Warning, Category::Compilation, false),
        }
    }

    pub fn rule_count(&self) -> usize {
        self.deprecated.len() + self.anti_patterns.len() + self.positive.len() + self.sheet.len()
    }
}

fn compile(
    specs: Vec<RuleSpec>,
    default_severity: Severity,
    default_category: Category,
    force_severity: bool,
) -> Vec<PatternRule> {
    specs
        .into_iter()
        .filter_map(|s| {
            let regex = Regex::new(&s.pattern).ok()?;
            let severity = if force_severity {
                default_severity
            } else {
                s.severity.unwrap_or(default_severity)
            };
            Some(PatternRule {
                regex,
                message: s.message,
                reference: s.reference,
                severity,
                category: s.category.unwrap_or(default_category),
                context: s.context,
            })
        })
        .collect()
}

fn rule(
    pattern: &str,
    message: &str,
    reference: Option<&str>,
    severity: Severity,
    category: Category,
    context: Option<&str>,
) -> Option<PatternRule> {
    let regex = Regex::new(pattern).ok()?;
    Some(PatternRule {
        regex,
        message: message.to_string(),
        reference: reference.map(|r| r.to_string()),
        severity,
        category,
        context: context.map(|c| c.to_string()),
    })
}

static BUILTIN: Lazy<RuleSet> = Lazy::new(|| RuleSet {
    deprecated: [
        rule(
            r"\bNavigationView\b",
            "NavigationView is deprecated",
            Some("use NavigationStack (iOS 16+)"),
            Severity::Error,
            Category::Compilation,
            None,
        ),
        rule(
            r"\.animation\(\s*\.[A-Za-z]+(\(\))?\s*\)",
            "value-less .animation(_:) is deprecated",
            Some("use .animation(_:value:) to scope the animation"),
            Severity::Error,
            Category::Compilation,
            None,
        ),
        rule(
            r"UIApplication\.shared\.keyWindow",
            "UIApplication.shared.keyWindow is deprecated",
            Some("resolve the key window through the connected scenes"),
            Severity::Error,
            Category::Compilation,
            None,
        ),
        rule(
            r"UIScreen\.main\b",
            "UIScreen.main is deprecated",
            Some("read geometry from the view's environment instead"),
            Severity::Error,
            Category::Compilation,
            None,
        ),
    ]
    .into_iter()
    .flatten()
    .collect(),
    anti_patterns: [
        rule(
            r"AnyView\(",
            "AnyView erases the view type and defeats SwiftUI diffing",
            Some("return concrete types or use @ViewBuilder"),
            Severity::Warning,
            Category::Performance,
            None,
        ),
        rule(
            r"@ObservedObject\s+var\s+\w+\s*=",
            "@ObservedObject constructed inline is recreated on every render",
            Some("own the object with @StateObject or inject it"),
            Severity::Error,
            Category::Performance,
            None,
        ),
        rule(
            r"DispatchQueue\.main\.async",
            "DispatchQueue.main.async in SwiftUI code",
            Some("prefer @MainActor isolation or a .task modifier"),
            Severity::Warning,
            Category::Compilation,
            None,
        ),
        rule(
            r"GeometryReader\s*\{",
            "GeometryReader greedily takes the full proposed size",
            Some("consider containerRelativeFrame or fixed frames"),
            Severity::Warning,
            Category::Performance,
            None,
        ),
        rule(
            r"\bprint\(",
            "print() left in source",
            Some("use Logger from os.log"),
            Severity::Warning,
            Category::Compilation,
            None,
        ),
    ]
    .into_iter()
    .flatten()
    .collect(),
    positive: [
        rule(
            r"\.accessibilityLabel\(",
            "accessibility label present",
            None,
            Severity::Info,
            Category::Compilation,
            None,
        ),
        rule(
            r"@MainActor\b",
            "main-actor isolation declared",
            None,
            Severity::Info,
            Category::Compilation,
            None,
        ),
        rule(
            r"\.task\s*[({]",
            "structured concurrency via .task",
            None,
            Severity::Info,
            Category::Compilation,
            None,
        ),
        rule(
            r"Lazy[VH]Stack\(",
            "lazy stack keeps large lists cheap",
            None,
            Severity::Info,
            Category::Performance,
            None,
        ),
    ]
    .into_iter()
    .flatten()
    .collect(),
    sheet: [
        rule(
            r"\.sheet\(isPresented:\s*\.constant\(",
            "sheet bound to .constant can never be dismissed",
            Some("bind isPresented to mutable state"),
            Severity::Error,
            Category::Compilation,
            Some(".sheet("),
        ),
        rule(
            r"\.sheet\(item:\s*\.constant\(",
            "sheet item bound to .constant can never be dismissed",
            Some("bind item to mutable optional state"),
            Severity::Error,
            Category::Compilation,
            Some(".sheet("),
        ),
        rule(
            r"\.presentationDetents\(\s*\[\s*\]\s*\)",
            "empty presentation detents fall back to the default height",
            Some("pass at least one detent"),
            Severity::Warning,
            Category::Compilation,
            Some(".sheet("),
        ),
    ]
    .into_iter()
    .flatten()
    .collect(),
});
