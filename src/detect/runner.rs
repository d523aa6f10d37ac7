//! Detection runner that orchestrates source checks.

use std::path::{Path, PathBuf};

use crate::rules::RuleSet;

use super::{composition, patterns, Category, Diagnostic, ScanResult, Severity};

/// Executes the source-level checks against a set of files.
///
/// One check failing never stops the rest; failures degrade to diagnostics
/// on the result.
pub struct Runner<'a> {
    rules: &'a RuleSet,
    check_composition: bool,
}

impl<'a> Runner<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self {
            rules,
            check_composition: true,
        }
    }

    /// Disable composition complexity analysis.
    pub fn check_composition(mut self, enabled: bool) -> Self {
        self.check_composition = enabled;
        self
    }

    /// Run pattern tables and composition analysis over the files.
    pub fn run(&self, files: &[PathBuf]) -> ScanResult {
        let mut result = patterns::scan_rules(files, self.rules);

        if self.check_composition {
            for file in files {
                result.merge(self.run_composition(file));
            }
        }

        result
    }

    fn run_composition(&self, file: &Path) -> ScanResult {
        match composition::scan_composition_file(file) {
            Ok(mut r) => {
                // File count is owned by the pattern pass.
                r.scanned = 0;
                r
            }
            Err(e) => {
                let mut r = ScanResult::new();
                r.push(Diagnostic::new(
                    Severity::Info,
                    Category::Unknown,
                    format!(
                        "composition analysis skipped for {}: {}",
                        file.to_string_lossy(),
                        e
                    ),
                ));
                r
            }
        }
    }
}
