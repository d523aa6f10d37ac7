//! Post-processing of swift toolchain output into diagnostics.
//!
//! The toolchain's verbose output is scanned line by line for compiler
//! diagnostic lines, which become structured [`Diagnostic`]s. The same
//! module hosts the macro-validation probe analysis: given the combined
//! outputs of the two comparative builds, it decides whether a failure is
//! specifically caused by macro validation.

use lazy_static::lazy_static;
use regex::Regex;

use crate::detect::{Category, Diagnostic, ScanResult, Severity};

/// Only the head of each comparative build log is scanned for markers.
pub const MARKER_SCAN_LINES: usize = 50;

/// Literal marker substrings indicating macro involvement in a build log.
pub const MACRO_MARKERS: [&str; 4] = [
    "external macro implementation",
    "macro expansion",
    "compiler plugin",
    "swift-syntax",
];

lazy_static! {
    /// `path:line:col: code: message` (the column is optional).
    static ref LOCATED_DIAG: Regex = Regex::new(
        r"^(?P<file>[^:\s][^:]*):(?P<line>\d+):(?:\d+:)?\s*(?P<code>[A-Za-z ]+):\s*(?P<msg>.+)$"
    )
    .unwrap();

    /// `code: message` with no location, e.g. `error: terminated(1)`.
    static ref BARE_DIAG: Regex =
        Regex::new(r"^(?P<code>error|warning|note|remark|fatal error):\s*(?P<msg>.+)$").unwrap();
}

/// Infer the problem domain from a diagnostic message.
pub fn categorize(message: &str) -> Category {
    let lower = message.to_lowercase();

    if lower.contains("package.swift")
        || lower.contains("manifest")
        || lower.contains("configuration")
        || lower.contains("invalid target")
    {
        Category::Configuration
    } else if lower.contains("dependency")
        || lower.contains("dependencies")
        || lower.contains("could not resolve")
        || lower.contains("version solving")
        || lower.contains("package resolution")
    {
        Category::Dependency
    } else if lower.contains("type-check")
        || lower.contains("expression too complex")
        || lower.contains("unable to type-check")
        || lower.contains("reasonable time")
    {
        Category::Performance
    } else {
        Category::Unknown
    }
}

/// Parse captured toolchain output into diagnostics.
///
/// Lines that are not diagnostic-shaped are ignored; a compiler code with no
/// better category hint lands in `Compilation`.
pub fn parse_build_output(text: &str) -> ScanResult {
    let mut result = ScanResult::new();

    for line in text.lines() {
        let line = line.trim_end();

        if let Some(caps) = LOCATED_DIAG.captures(line) {
            let code = caps.name("code").map(|m| m.as_str()).unwrap_or("");
            // Only accept recognized diagnostic codes; "10:30: note" shapes
            // in arbitrary text would otherwise produce junk.
            if !is_diag_code(code) {
                continue;
            }
            let message = caps.name("msg").map(|m| m.as_str()).unwrap_or("");
            let file = caps.name("file").map(|m| m.as_str()).unwrap_or("");
            let line_no = caps
                .name("line")
                .and_then(|m| m.as_str().parse::<usize>().ok())
                .unwrap_or(0);

            result.push(
                Diagnostic::new(Severity::from_code(code), category_for(message), message)
                    .at(file, line_no),
            );
        } else if let Some(caps) = BARE_DIAG.captures(line) {
            let code = caps.name("code").map(|m| m.as_str()).unwrap_or("");
            let message = caps.name("msg").map(|m| m.as_str()).unwrap_or("");
            result.push(Diagnostic::new(
                Severity::from_code(code),
                category_for(message),
                message,
            ));
        }
    }

    result
}

fn is_diag_code(code: &str) -> bool {
    matches!(
        code.trim().to_lowercase().as_str(),
        "error" | "warning" | "note" | "remark" | "fatal error"
    )
}

fn category_for(message: &str) -> Category {
    match categorize(message) {
        // Compiler diagnostics with no stronger hint are compilation issues.
        Category::Unknown => Category::Compilation,
        c => c,
    }
}

/// Collect the macro markers present in the first [`MARKER_SCAN_LINES`]
/// lines of a build log.
pub fn scan_macro_markers(output: &str) -> Vec<&'static str> {
    let head: Vec<&str> = output.lines().take(MARKER_SCAN_LINES).collect();
    MACRO_MARKERS
        .iter()
        .copied()
        .filter(|marker| head.iter().any(|line| line.contains(marker)))
        .collect()
}

/// Compare the two probe builds and report a verdict.
///
/// Markers in the base build but not in the validation-skipping build mean
/// the failure is specifically caused by macro validation. Markers in both
/// mean macros are involved but validation is not the cause.
pub fn macro_validation_verdict(base: &str, skipped: &str) -> ScanResult {
    let mut result = ScanResult::new();
    let base_markers = scan_macro_markers(base);
    let skipped_markers = scan_macro_markers(skipped);

    if base_markers.is_empty() {
        result.push(Diagnostic::new(
            Severity::Info,
            Category::Compilation,
            "no macro involvement detected in the build output",
        ));
        return result;
    }

    if skipped_markers.is_empty() {
        result.push(
            Diagnostic::new(
                Severity::Error,
                Category::Compilation,
                format!(
                    "build failure caused by macro validation (markers: {})",
                    base_markers.join(", ")
                ),
            )
            .suggest("trust the macro packages, or build with -Xswiftc -skipMacroValidation"),
        );
    } else {
        result.push(
            Diagnostic::new(
                Severity::Warning,
                Category::Compilation,
                format!(
                    "macros are involved but skipping validation does not help (markers: {})",
                    base_markers.join(", ")
                ),
            )
            .suggest("inspect the macro packages themselves"),
        );
    }

    result
}
