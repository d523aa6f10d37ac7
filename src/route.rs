//! Keyword routing from a free-text task description to a reading plan.
//!
//! A fixed, explicitly ordered category table is scored by case-insensitive
//! substring matching. Keywords may overlap and a single input token can
//! satisfy several categories; there is no mutual exclusion. Ties break to
//! the first-declared category, which makes routing deterministic.

use std::path::Path;

/// One routing category.
struct TaskCategory {
    name: &'static str,
    keywords: &'static [&'static str],
    primary_doc: &'static str,
    sections: &'static str,
    time_budget: &'static str,
    fallback_doc: Option<&'static str>,
    description: &'static str,
}

/// The category table, in declaration (and tie-break) order.
static CATEGORIES: &[TaskCategory] = &[
    TaskCategory {
        name: "architecture",
        keywords: &[
            "architecture",
            "reducer",
            "store",
            "state management",
            "module",
            "composition",
            "feature",
        ],
        primary_doc: "docs/Architecture.md",
        sections: "State ownership, Feature boundaries, Store lifecycle",
        time_budget: "30 minutes",
        fallback_doc: Some("README.md"),
        description: "structuring features, reducers, and state",
    },
    TaskCategory {
        name: "testing",
        keywords: &["test", "testclock", "xctest", "snapshot", "mock", "testable"],
        primary_doc: "docs/Testing.md",
        sections: "Test stores, Clock control, Snapshot baselines",
        time_budget: "20 minutes",
        fallback_doc: None,
        description: "writing and running package tests",
    },
    TaskCategory {
        name: "navigation",
        keywords: &["navigation", "sheet", "push", "deeplink", "stack", "dismiss"],
        primary_doc: "docs/Navigation.md",
        sections: "Stack-based navigation, Tree-based presentation",
        time_budget: "25 minutes",
        fallback_doc: Some("docs/Architecture.md"),
        description: "screen flow and presentation",
    },
    TaskCategory {
        name: "bugfix",
        keywords: &["bug", "fix", "crash", "regression", "broken", "incorrect"],
        primary_doc: "docs/Debugging.md",
        sections: "Reproduction first, Bisecting reducers",
        time_budget: "15 minutes",
        fallback_doc: Some("docs/case-studies"),
        description: "diagnosing and fixing defects",
    },
    TaskCategory {
        name: "performance",
        keywords: &["slow", "performance", "lag", "memory", "leak", "hang"],
        primary_doc: "docs/Performance.md",
        sections: "View identity, Equatable state, Instruments workflow",
        time_budget: "40 minutes",
        fallback_doc: None,
        description: "runtime and compile-time performance",
    },
    TaskCategory {
        name: "dependencies",
        keywords: &["dependency", "package", "resolved", "version", "update", "upgrade"],
        primary_doc: "docs/Dependencies.md",
        sections: "Pinning policy, Resolution troubleshooting",
        time_budget: "15 minutes",
        fallback_doc: Some("Package.resolved"),
        description: "managing SwiftPM dependencies",
    },
];

/// Directory of case studies consulted for bug-fix tasks.
pub const CASE_STUDY_DIR: &str = "docs/case-studies";

/// A selected reading plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingRoute {
    pub category: String,
    pub primary_doc: String,
    pub sections: String,
    pub time_budget: String,
    pub fallback_doc: Option<String>,
    pub match_score: usize,
}

/// Routing outcome, including the bug-fix case-study short circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAnswer {
    /// A category-based reading plan.
    Plan(ReadingRoute),
    /// A case-study file matched a bug-fix keyword; read that instead.
    CaseStudy { file: String, keyword: String },
    /// No keyword from any category matched.
    NoMatch,
}

/// The plan used when classification fails.
pub fn default_plan() -> ReadingRoute {
    ReadingRoute {
        category: "general".to_string(),
        primary_doc: "README.md".to_string(),
        sections: "Overview, Getting started".to_string(),
        time_budget: "10 minutes".to_string(),
        fallback_doc: None,
        match_score: 0,
    }
}

fn score(category: &TaskCategory, input: &str) -> usize {
    category
        .keywords
        .iter()
        .filter(|k| input.contains(*k))
        .count()
}

/// Classify a task description against the category table.
///
/// Returns `None` when every category scores zero. Ties resolve to the
/// first-declared category.
pub fn classify(input: &str) -> Option<ReadingRoute> {
    let lowered = input.to_lowercase();

    let mut best: Option<(&TaskCategory, usize)> = None;
    for category in CATEGORIES {
        let s = score(category, &lowered);
        if s == 0 {
            continue;
        }
        match best {
            Some((_, best_score)) if s <= best_score => {}
            _ => best = Some((category, s)),
        }
    }

    best.map(|(category, match_score)| ReadingRoute {
        category: category.name.to_string(),
        primary_doc: category.primary_doc.to_string(),
        sections: category.sections.to_string(),
        time_budget: category.time_budget.to_string(),
        fallback_doc: category.fallback_doc.map(|d| d.to_string()),
        match_score,
    })
}

/// Route a task description, consulting case studies for bug-fix tasks.
pub fn route(input: &str, package_root: &Path) -> RouteAnswer {
    let plan = match classify(input) {
        Some(p) => p,
        None => return RouteAnswer::NoMatch,
    };

    if plan.category == "bugfix" {
        if let Some((file, keyword)) = search_case_studies(input, package_root) {
            return RouteAnswer::CaseStudy { file, keyword };
        }
    }

    RouteAnswer::Plan(plan)
}

/// Best-effort keyword search over local case-study files.
///
/// Returns the first file whose content contains one of the matched bug-fix
/// keywords. All I/O errors are swallowed; a missing directory simply means
/// no case study.
fn search_case_studies(input: &str, package_root: &Path) -> Option<(String, String)> {
    let lowered = input.to_lowercase();
    let bugfix = CATEGORIES.iter().find(|c| c.name == "bugfix")?;
    let matched: Vec<&str> = bugfix
        .keywords
        .iter()
        .copied()
        .filter(|k| lowered.contains(k))
        .collect();
    if matched.is_empty() {
        return None;
    }

    let dir = package_root.join(CASE_STUDY_DIR);
    let mut entries: Vec<_> = std::fs::read_dir(&dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|e| e == "md").unwrap_or(false))
        .collect();
    entries.sort();

    for path in entries {
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        let content = content.to_lowercase();
        for keyword in &matched {
            if content.contains(keyword) {
                return Some((path.to_string_lossy().to_string(), keyword.to_string()));
            }
        }
    }

    None
}
