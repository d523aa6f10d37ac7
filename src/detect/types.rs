//! Core types for diagnostics.

use serde::{Deserialize, Serialize};

/// Severity levels for diagnostics.
///
/// Ordered from least to most severe so `worst_severity` can use `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Map an external diagnostic code to a severity.
    ///
    /// Total: unrecognized codes map to `Info` rather than failing, so
    /// arbitrary toolchain output never aborts a scan.
    pub fn from_code(code: &str) -> Severity {
        match code.to_lowercase().as_str() {
            "error" | "err" => Severity::Error,
            "warning" | "warn" => Severity::Warning,
            "fatal" | "fatal error" | "critical" => Severity::Critical,
            "note" | "info" | "remark" => Severity::Info,
            _ => Severity::Info,
        }
    }

    /// Whether this severity should fail a strict-errors run.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Error | Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Problem domain a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Configuration,
    Dependency,
    Compilation,
    Performance,
    Unknown,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Configuration => write!(f, "configuration"),
            Category::Dependency => write!(f, "dependency"),
            Category::Compilation => write!(f, "compilation"),
            Category::Performance => write!(f, "performance"),
            Category::Unknown => write!(f, "unknown"),
        }
    }
}

/// Source position a diagnostic points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
}

/// A single finding. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, category: Category, message: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            location: None,
            suggestion: None,
        }
    }

    /// Attach a file/line location.
    pub fn at(mut self, file: impl Into<String>, line: usize) -> Self {
        self.location = Some(Location {
            file: file.into(),
            line,
        });
        self
    }

    /// Attach a one-line remediation suggestion.
    pub fn suggest(mut self, text: impl Into<String>) -> Self {
        self.suggestion = Some(text.into());
        self
    }
}

/// Accumulated findings from one or more checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    pub diagnostics: Vec<Diagnostic>,
    /// Number of files scanned
    pub scanned: usize,
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge another result into this one, preserving order.
    pub fn merge(&mut self, other: ScanResult) {
        self.diagnostics.extend(other.diagnostics);
        self.scanned += other.scanned;
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Check if any error- or critical-severity diagnostics are present.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_blocking())
    }

    /// Number of diagnostics at a given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// The most severe level present, if any.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.diagnostics.iter().map(|d| d.severity).max()
    }
}
