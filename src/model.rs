//! Uniform in-memory representation of test-run statistics and coverage
//! data, independent of any specific report format. Parsers accumulate into
//! these types and the import step projects them into measures.

use std::collections::BTreeMap;

use serde::Serialize;

/// Compute a rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// Aggregate test-run counters.
///
/// The counters are stored as reported by the producer; nothing forces
/// `tests == passed + failures + errors + skipped`. Contributions are summed
/// field by field, so one report may supply the counts and another (or a
/// different tag in the same report) only the duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TestRunResults {
    pub tests: u64,
    pub passed_tests: u64,
    pub skipped_tests: u64,
    pub failures: u64,
    pub errors: u64,
    /// Execution time in milliseconds, absent until some report supplies one.
    pub execution_time: Option<i64>,
}

impl TestRunResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// A contribution carrying only counters.
    pub fn counts(tests: u64, passed: u64, skipped: u64, failures: u64, errors: u64) -> Self {
        Self {
            tests,
            passed_tests: passed,
            skipped_tests: skipped,
            failures,
            errors,
            execution_time: None,
        }
    }

    /// A contribution carrying only a duration.
    pub fn timed(execution_time: i64) -> Self {
        Self {
            execution_time: Some(execution_time),
            ..Self::default()
        }
    }

    /// Sum another contribution into this one. A `None` duration leaves the
    /// accumulated duration untouched. Sums saturate instead of wrapping.
    pub fn add(&mut self, other: &TestRunResults) {
        self.tests = self.tests.saturating_add(other.tests);
        self.passed_tests = self.passed_tests.saturating_add(other.passed_tests);
        self.skipped_tests = self.skipped_tests.saturating_add(other.skipped_tests);
        self.failures = self.failures.saturating_add(other.failures);
        self.errors = self.errors.saturating_add(other.errors);
        self.execution_time = match (self.execution_time, other.execution_time) {
            (Some(a), Some(b)) => Some(a.saturating_add(b)),
            (a, b) => a.or(b),
        };
    }

    /// Percentage of passed tests, `None` when no tests ran.
    #[must_use]
    pub fn success_density(&self) -> Option<f64> {
        if self.tests == 0 {
            None
        } else {
            Some(rate(self.passed_tests, self.tests) * 100.0)
        }
    }
}

/// Condition (branch) counts for a single line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineConditions {
    pub total: u32,
    pub covered: u32,
}

/// Coverage data for a single source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileCoverage {
    pub path: String,
    /// Line number (1-based) → hit count.
    pub lines: BTreeMap<u32, u64>,
    pub conditions: BTreeMap<u32, LineConditions>,
}

impl FileCoverage {
    pub fn new(path: String) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// Record hits for a line, keeping the max over all contributions.
    pub fn add_hits(&mut self, line: u32, hits: u64) {
        let entry = self.lines.entry(line).or_insert(0);
        if hits > *entry {
            *entry = hits;
        }
    }

    /// Record condition counts for a line, keeping the max of each field.
    pub fn add_conditions(&mut self, line: u32, total: u32, covered: u32) {
        let entry = self.conditions.entry(line).or_default();
        entry.total = entry.total.max(total);
        entry.covered = entry.covered.max(covered);
    }

    pub fn merge(&mut self, other: &FileCoverage) {
        for (&line, &hits) in &other.lines {
            self.add_hits(line, hits);
        }
        for (&line, cond) in &other.conditions {
            self.add_conditions(line, cond.total, cond.covered);
        }
    }

    /// Lines that are instrumentable.
    #[must_use]
    pub fn lines_to_cover(&self) -> u64 {
        self.lines.len() as u64
    }

    #[must_use]
    pub fn uncovered_lines(&self) -> u64 {
        self.lines.values().filter(|&&hits| hits == 0).count() as u64
    }
}

/// Per-file, per-line hit counts accumulated across any number of reports.
///
/// Merging takes the max hit count for every (file, line): a line counts as
/// covered if any contributing run covered it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverageData {
    files: BTreeMap<String, FileCoverage>,
}

impl CoverageData {
    pub fn new() -> Self {
        Self::default()
    }

    fn file_mut(&mut self, path: &str) -> &mut FileCoverage {
        self.files
            .entry(path.to_string())
            .or_insert_with(|| FileCoverage::new(path.to_string()))
    }

    pub fn add_hits(&mut self, path: &str, line: u32, hits: u64) {
        self.file_mut(path).add_hits(line, hits);
    }

    pub fn add_conditions(&mut self, path: &str, line: u32, total: u32, covered: u32) {
        self.file_mut(path).add_conditions(line, total, covered);
    }

    pub fn merge(&mut self, other: &CoverageData) {
        for (path, file) in &other.files {
            self.file_mut(path).merge(file);
        }
    }

    /// Paths of every file with coverage data, in sorted order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn file(&self, path: &str) -> Option<&FileCoverage> {
        self.files.get(path)
    }

    /// Line → hits for one file, empty when the file is unknown.
    pub fn hits(&self, path: &str) -> BTreeMap<u32, u64> {
        self.files
            .get(path)
            .map(|f| f.lines.clone())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}
