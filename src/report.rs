//! Output formatting for swiftcheck results.
//!
//! Supports four output shapes:
//! - Pretty: annotated terminal output with severity glyphs
//! - JSON: structured output for programmatic consumption
//! - Summary: one screen of counts and a pass/fail line
//! - Detailed: pretty output grouped by category

use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::detect::{Diagnostic, ScanResult, Severity};

/// Output format selector shared by all commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
    Summary,
    Detailed,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(OutputFormat::Pretty),
            "json" => Ok(OutputFormat::Json),
            "summary" => Ok(OutputFormat::Summary),
            "detailed" => Ok(OutputFormat::Detailed),
            _ => Err(format!(
                "unknown format {:?}, must be 'pretty', 'json', 'summary', or 'detailed'",
                s
            )),
        }
    }
}

/// Top-level JSON report structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub command: String,
    pub scanned: usize,
    pub counts: SeverityCounts,
    pub diagnostics: Vec<Diagnostic>,
}

/// Per-severity totals.
#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub info: usize,
    pub warning: usize,
    pub error: usize,
    pub critical: usize,
}

impl SeverityCounts {
    pub fn of(result: &ScanResult) -> Self {
        Self {
            info: result.count(Severity::Info),
            warning: result.count(Severity::Warning),
            error: result.count(Severity::Error),
            critical: result.count(Severity::Critical),
        }
    }
}

/// Build the JSON report value for a result.
pub fn json_report(command: &str, result: &ScanResult) -> JsonReport {
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        command: command.to_string(),
        scanned: result.scanned,
        counts: SeverityCounts::of(result),
        diagnostics: result.diagnostics.clone(),
    }
}

/// Write the JSON report to stdout.
pub fn write_json(command: &str, result: &ScanResult) -> anyhow::Result<()> {
    let report = json_report(command, result);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Dispatch to the chosen format.
pub fn write(format: OutputFormat, command: &str, result: &ScanResult) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => write_json(command, result),
        OutputFormat::Summary => {
            write_summary(command, result);
            Ok(())
        }
        OutputFormat::Detailed => {
            write_detailed(command, result);
            Ok(())
        }
        OutputFormat::Pretty => {
            write_pretty(command, result);
            Ok(())
        }
    }
}

fn glyph(severity: Severity) -> ColoredString {
    match severity {
        Severity::Critical => "‼".red().bold(),
        Severity::Error => "✖".red(),
        Severity::Warning => "⚠".yellow(),
        Severity::Info => "ℹ".blue(),
    }
}

fn write_header(command: &str) {
    println!();
    print!("  {}", "swiftcheck".cyan().bold());
    println!(" v{}  {}", env!("CARGO_PKG_VERSION"), command.dimmed());
    println!();
}

fn write_diagnostic(diagnostic: &Diagnostic) {
    print!("  {} ", glyph(diagnostic.severity));
    print!("{:<12}", diagnostic.category.to_string().dimmed());
    if let Some(location) = &diagnostic.location {
        print!("{}", location.file.blue());
        if location.line > 0 {
            print!("{}", format!(":{}", location.line).dimmed());
        }
        println!();
        println!("       {}", diagnostic.message);
    } else {
        println!("{}", diagnostic.message);
    }
    if let Some(suggestion) = &diagnostic.suggestion {
        println!("       {}", format!("hint: {}", suggestion).dimmed());
    }
}

/// Write the full annotated report.
pub fn write_pretty(command: &str, result: &ScanResult) {
    write_header(command);

    if result.is_empty() {
        println!("  {}", "no issues found".green());
    } else {
        for diagnostic in &result.diagnostics {
            write_diagnostic(diagnostic);
        }
    }

    println!();
    write_status_line(result);
    println!();
}

/// Write only the counts and the status line.
pub fn write_summary(command: &str, result: &ScanResult) {
    write_header(command);

    let counts = SeverityCounts::of(result);
    println!("  critical  {}", counts.critical);
    println!("  error     {}", counts.error);
    println!("  warning   {}", counts.warning);
    println!("  info      {}", counts.info);
    println!();
    write_status_line(result);
    println!();
}

/// Write the annotated report grouped by category.
pub fn write_detailed(command: &str, result: &ScanResult) {
    write_header(command);

    if result.is_empty() {
        println!("  {}", "no issues found".green());
    } else {
        let mut by_category: BTreeMap<String, Vec<&Diagnostic>> = BTreeMap::new();
        for diagnostic in &result.diagnostics {
            by_category
                .entry(diagnostic.category.to_string())
                .or_default()
                .push(diagnostic);
        }

        for (category, diagnostics) in by_category {
            println!("  {} ({}):", category.bold(), diagnostics.len());
            for diagnostic in diagnostics {
                write_diagnostic(diagnostic);
            }
            println!();
        }
    }

    write_status_line(result);
    println!();
}

fn write_status_line(result: &ScanResult) {
    let scanned = format!("{} file(s) scanned", result.scanned);
    if result.has_errors() {
        println!("  {}  {}", "✗ ISSUES".red(), scanned.dimmed());
    } else if result.is_empty() {
        println!("  {}  {}", "✓ CLEAN".green(), scanned.dimmed());
    } else {
        println!("  {}  {}", "✓ OK".green(), scanned.dimmed());
    }
}
