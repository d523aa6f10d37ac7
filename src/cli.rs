//! Command-line interface for swiftcheck.

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::buildlog;
use crate::detect::{manifest, Category, Diagnostic, Runner, ScanResult, Severity};
use crate::report::{self, OutputFormat};
use crate::route::{self, RouteAnswer};
use crate::rules::RuleSet;
use crate::toolchain::{SwiftToolchain, Toolchain};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Swift package health checker.
///
/// Swiftcheck wraps the swift toolchain and post-processes its output into
/// compact reports, alongside heuristic lint checks for dependency pinning
/// and SwiftUI/reducer composition anti-patterns.
#[derive(Parser)]
#[command(name = "swiftcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint Swift sources for anti-patterns and composition complexity
    #[command(visible_alias = "check")]
    Lint(LintArgs),
    /// Audit Package.resolved for branch and revision pins
    Deps(DepsArgs),
    /// Parse swift build output from stdin into a report
    Parse(ParseArgs),
    /// Run swift build and report its diagnostics
    Build(BuildArgs),
    /// Probe whether a build failure is caused by macro validation
    MacroCheck(MacroCheckArgs),
    /// Route a task description to a documentation reading plan
    Route(RouteArgs),
}

/// Arguments for the lint command.
#[derive(Parser)]
pub struct LintArgs {
    /// Path to check (file or directory)
    pub path: PathBuf,

    /// Output format: pretty, json, summary, or detailed
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Replace the built-in rule tables with a YAML rule file
    #[arg(short, long)]
    pub rules: Option<PathBuf>,

    /// Exit non-zero if any diagnostic was produced
    #[arg(long)]
    pub strict: bool,

    /// Exit non-zero only on error or critical diagnostics
    #[arg(long)]
    pub strict_errors: bool,

    /// Skip composition complexity analysis
    #[arg(long)]
    pub no_composition: bool,

    /// Include test sources in the scan
    #[arg(long)]
    pub include_tests: bool,
}

/// Arguments for the deps command.
#[derive(Parser)]
pub struct DepsArgs {
    /// Package root (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format: pretty, json, summary, or detailed
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Do not emit diagnostics for branch/revision pins
    #[arg(long)]
    pub no_flag_branches: bool,

    /// Run 'swift package resolve' before auditing
    #[arg(long)]
    pub resolve: bool,

    /// Exit non-zero if any pin was flagged
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the parse command.
#[derive(Parser)]
pub struct ParseArgs {
    /// Output format: pretty, json, summary, or detailed
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

/// Arguments for the build command.
#[derive(Parser)]
pub struct BuildArgs {
    /// Package root (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format: pretty, json, summary, or detailed
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Exit non-zero if the build produced error diagnostics
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the macro-check command.
#[derive(Parser)]
pub struct MacroCheckArgs {
    /// Package root (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format: pretty, json, summary, or detailed
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

/// Arguments for the route command.
#[derive(Parser)]
pub struct RouteArgs {
    /// Task description
    #[arg(required = true)]
    pub task: Vec<String>,

    /// Package root searched for case studies (default: current directory)
    #[arg(short, long, default_value = ".")]
    pub package_root: PathBuf,
}

/// Directories never scanned for sources.
const SKIPPED_DIRS: &[&str] = &[".build", "Pods", "DerivedData", "Carthage", "checkouts"];

/// Collect Swift source files under a root.
pub fn collect_swift_files(root: &Path, include_tests: bool) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).into_iter().filter_entry(|e| {
        let name = e.file_name().to_string_lossy();
        if e.file_type().is_dir() && name.starts_with('.') {
            return false;
        }
        if e.file_type().is_dir() && SKIPPED_DIRS.contains(&name.as_ref()) {
            return false;
        }
        if !include_tests && e.file_type().is_dir() && name == "Tests" {
            return false;
        }
        true
    }) {
        let entry = entry?;
        if entry.file_type().is_file() {
            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if ext != "swift" {
                continue;
            }
            if !include_tests {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                if name.ends_with("Tests.swift") {
                    continue;
                }
            }
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn parse_format(s: &str) -> Result<OutputFormat, i32> {
    s.parse::<OutputFormat>().map_err(|e| {
        eprintln!("Error: {}", e);
        EXIT_ERROR
    })
}

/// Run the lint command.
pub fn run_lint(args: &LintArgs) -> anyhow::Result<i32> {
    let format = match parse_format(&args.format) {
        Ok(f) => f,
        Err(code) => return Ok(code),
    };

    if !args.path.exists() {
        eprintln!("Error: cannot access path {:?}", args.path);
        eprintln!("Pass a Swift file or a package directory");
        return Ok(EXIT_ERROR);
    }

    // Rule tables: built-in unless replaced from YAML.
    let loaded;
    let rules: &RuleSet = match &args.rules {
        Some(path) => match RuleSet::from_yaml_file(path) {
            Ok(r) => {
                loaded = r;
                &loaded
            }
            Err(e) => {
                eprintln!("Error: cannot load rules from {:?}: {}", path, e);
                eprintln!("Check the YAML structure against the documented rule file shape");
                return Ok(EXIT_ERROR);
            }
        },
        None => RuleSet::builtin(),
    };

    let files = if args.path.is_dir() {
        collect_swift_files(&args.path, args.include_tests)?
    } else {
        vec![args.path.clone()]
    };

    if files.is_empty() {
        eprintln!("Warning: no Swift sources to scan");
        return Ok(EXIT_SUCCESS);
    }

    let runner = Runner::new(rules).check_composition(!args.no_composition);
    let result = runner.run(&files);

    report::write(format, "lint", &result)?;

    if args.strict && !result.is_empty() {
        return Ok(EXIT_FAILED);
    }
    if args.strict_errors && result.has_errors() {
        return Ok(EXIT_FAILED);
    }
    Ok(EXIT_SUCCESS)
}

/// Run the deps command against the real toolchain.
pub fn run_deps(args: &DepsArgs) -> anyhow::Result<i32> {
    run_deps_with(&SwiftToolchain::new(), args)
}

/// Deps-command body, parameterized over the toolchain for testing.
pub fn run_deps_with(toolchain: &dyn Toolchain, args: &DepsArgs) -> anyhow::Result<i32> {
    let format = match parse_format(&args.format) {
        Ok(f) => f,
        Err(code) => return Ok(code),
    };

    let mut preamble = ScanResult::new();
    if args.resolve {
        // Resolution failure is a diagnostic, not an abort; the audit of
        // whatever resolved file exists still runs.
        match toolchain.package(&args.path, &["resolve"]) {
            Ok(output) if !output.success() => {
                preamble.push(
                    Diagnostic::new(
                        Severity::Warning,
                        Category::Dependency,
                        format!("swift package resolve exited with status {}", output.status),
                    )
                    .suggest("check the manifest and network access"),
                );
            }
            Ok(_) => {}
            Err(e) => {
                preamble.push(
                    Diagnostic::new(
                        Severity::Warning,
                        Category::Configuration,
                        format!("could not invoke the swift toolchain: {}", e),
                    )
                    .suggest("install Swift or put the toolchain on PATH"),
                );
            }
        }
    }

    if !manifest::resolved_file_present(&args.path) {
        eprintln!(
            "Error: no Package.resolved found under {:?}",
            args.path
        );
        eprintln!("Run 'swift package resolve' to generate one");
        return Ok(EXIT_ERROR);
    }

    let audit = manifest::audit_package_root(&args.path);
    let mut result = preamble;
    result.merge(manifest::audit_diagnostics(&audit, !args.no_flag_branches));

    report::write(format, "deps", &result)?;
    if format != OutputFormat::Json {
        println!(
            "  {} dependencies, {} flagged",
            audit.total,
            audit.unique_flagged().len()
        );
    }

    if args.strict && audit.flagged > 0 {
        return Ok(EXIT_FAILED);
    }
    Ok(EXIT_SUCCESS)
}

/// Run the parse command, consuming stdin fully.
pub fn run_parse(args: &ParseArgs) -> anyhow::Result<i32> {
    let format = match parse_format(&args.format) {
        Ok(f) => f,
        Err(code) => return Ok(code),
    };

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;

    if input.trim().is_empty() {
        eprintln!("Error: no build output on stdin");
        eprintln!("Pipe swift build output in, e.g. 'swift build 2>&1 | swiftcheck parse'");
        return Ok(EXIT_ERROR);
    }

    let result = buildlog::parse_build_output(&input);
    report::write(format, "parse", &result)?;
    Ok(EXIT_SUCCESS)
}

/// Run the build command against the real toolchain.
pub fn run_build(args: &BuildArgs) -> anyhow::Result<i32> {
    run_build_with(&SwiftToolchain::new(), args)
}

/// Build-command body, parameterized over the toolchain for testing.
pub fn run_build_with(toolchain: &dyn Toolchain, args: &BuildArgs) -> anyhow::Result<i32> {
    let format = match parse_format(&args.format) {
        Ok(f) => f,
        Err(code) => return Ok(code),
    };

    let mut result = ScanResult::new();

    match toolchain.build(&args.path) {
        Ok(output) => {
            result.merge(buildlog::parse_build_output(&output.combined()));
            if !output.success() {
                // A failed build is a diagnostic, not an abort; whatever
                // could be parsed above is still reported.
                result.push(
                    Diagnostic::new(
                        Severity::Error,
                        Category::Compilation,
                        format!("swift build exited with status {}", output.status),
                    )
                    .suggest("see the diagnostics above for the first failure"),
                );
            }
        }
        Err(e) => {
            result.push(
                Diagnostic::new(
                    Severity::Error,
                    Category::Configuration,
                    format!("could not invoke the swift toolchain: {}", e),
                )
                .suggest("install Swift or put the toolchain on PATH"),
            );
        }
    }

    report::write(format, "build", &result)?;

    if args.strict && result.has_errors() {
        return Ok(EXIT_FAILED);
    }
    Ok(EXIT_SUCCESS)
}

/// Run the macro-check command against the real toolchain.
pub fn run_macro_check(args: &MacroCheckArgs) -> anyhow::Result<i32> {
    run_macro_check_with(&SwiftToolchain::new(), args)
}

/// Macro-check body, parameterized over the toolchain for testing.
pub fn run_macro_check_with(
    toolchain: &dyn Toolchain,
    args: &MacroCheckArgs,
) -> anyhow::Result<i32> {
    let format = match parse_format(&args.format) {
        Ok(f) => f,
        Err(code) => return Ok(code),
    };

    let result = match toolchain.comparative_macro_builds(&args.path) {
        Ok((base, skipped)) => buildlog::macro_validation_verdict(&base, &skipped),
        Err(e) => {
            let mut r = ScanResult::new();
            r.push(
                Diagnostic::new(
                    Severity::Error,
                    Category::Configuration,
                    format!("could not invoke the swift toolchain: {}", e),
                )
                .suggest("install Swift or put the toolchain on PATH"),
            );
            r
        }
    };

    report::write(format, "macro-check", &result)?;
    Ok(EXIT_SUCCESS)
}

/// Run the route command.
pub fn run_route(args: &RouteArgs) -> anyhow::Result<i32> {
    let task = args.task.join(" ");

    match route::route(&task, &args.package_root) {
        RouteAnswer::CaseStudy { file, keyword } => {
            println!("Case study match for {:?}:", keyword);
            println!("  read {}", file);
        }
        RouteAnswer::Plan(plan) => print_plan(&plan),
        RouteAnswer::NoMatch => {
            println!("No category matched; falling back to the general plan.");
            print_plan(&route::default_plan());
        }
    }

    Ok(EXIT_SUCCESS)
}

fn print_plan(plan: &route::ReadingRoute) {
    println!("Category: {} (score {})", plan.category, plan.match_score);
    println!("  read     {}", plan.primary_doc);
    println!("  sections {}", plan.sections);
    println!("  budget   {}", plan.time_budget);
    if let Some(fallback) = &plan.fallback_doc {
        println!("  fallback {}", fallback);
    }
}
