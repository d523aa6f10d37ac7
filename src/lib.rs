//! Swiftcheck - Swift package health checker.
//!
//! Swiftcheck wraps the `swift package` toolchain, shells out to it, and
//! post-processes its verbose output into compact structured reports plus
//! heuristic lint-style diagnostics: dependency pinning anti-patterns,
//! macro-expansion risk probing, and SwiftUI/reducer composition
//! anti-patterns in source text.
//!
//! # Architecture
//!
//! Everything is line-oriented text scanning; there is no AST:
//!
//! - `scan`: block extraction and brace-counting primitives
//! - `rules`: the declarative pattern rule tables
//! - `detect`: detectors consuming the scanner (patterns, composition,
//!   manifest pins) and the shared diagnostic types
//! - `toolchain`: the external swift toolchain collaborator
//! - `buildlog`: toolchain output post-processing and the macro probe
//! - `route`: keyword routing to documentation reading plans
//! - `report`: output formatting (pretty, JSON, summary, detailed)

pub mod buildlog;
pub mod cli;
pub mod detect;
pub mod report;
pub mod route;
pub mod rules;
pub mod scan;
pub mod toolchain;

pub use detect::{Category, Diagnostic, Location, Runner, ScanResult, Severity};
pub use report::OutputFormat;
pub use rules::RuleSet;
pub use toolchain::{CommandOutput, SwiftToolchain, Toolchain};
