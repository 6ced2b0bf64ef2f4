//! One import run: aggregate every configured report, then project the
//! result into measures and hand them to a sink.
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::{CoverageAggregator, TestResultsAggregator};
use crate::config::Settings;
use crate::error::Result;
use crate::measures::{coverage_measures, test_run_measures, Measure};
use crate::model::{CoverageData, TestRunResults};
use crate::project::{InputFile, TrackedFiles};
use crate::resolve::FileResolver;

/// Receives the measures an import produces.
pub trait MeasureSink {
    fn save_file_measure(&mut self, file: &InputFile, measure: Measure);
    fn save_project_measure(&mut self, measure: Measure);
}

/// Sink that keeps every measure in memory, keyed by file path.
#[derive(Debug, Default, Clone, Serialize)]
pub struct MemorySink {
    pub files: BTreeMap<String, Vec<Measure>>,
    pub project: Vec<Measure>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_measures(&self, path: &str) -> &[Measure] {
        self.files.get(path).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl MeasureSink for MemorySink {
    fn save_file_measure(&mut self, file: &InputFile, measure: Measure) {
        self.files.entry(file.path.clone()).or_default().push(measure);
    }

    fn save_project_measure(&mut self, measure: Measure) {
        self.project.push(measure);
    }
}

/// Outcome of a coverage import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoverageImportStats {
    /// Files with coverage data in the reports.
    pub reported: usize,
    /// Files whose measures were saved.
    pub imported: usize,
}

/// Coverage import: aggregate every coverage report, then save measures for
/// the files that belong to the project.
#[derive(Debug, Clone)]
pub struct CoverageImport {
    aggregator: CoverageAggregator,
    language: String,
    integration_tests: bool,
}

impl CoverageImport {
    pub fn new(aggregator: CoverageAggregator, language: impl Into<String>, integration_tests: bool) -> Self {
        Self {
            aggregator,
            language: language.into(),
            integration_tests,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            CoverageAggregator::from_settings(settings),
            settings.language.clone(),
            settings.integration_tests,
        )
    }

    pub fn should_execute(&self) -> bool {
        self.aggregator.has_coverage_property()
    }

    pub fn execute(
        &self,
        resolver: &dyn FileResolver,
        tracked: &dyn TrackedFiles,
        sink: &mut dyn MeasureSink,
    ) -> Result<CoverageImportStats> {
        if !self.should_execute() {
            return Ok(CoverageImportStats::default());
        }
        let mut coverage = CoverageData::new();
        self.aggregator.aggregate(resolver, &mut coverage)?;
        self.project(&coverage, tracked, sink)
    }

    /// Save measures for every reported file that is tracked with the
    /// configured language. Other files are skipped silently.
    pub fn project(
        &self,
        coverage: &CoverageData,
        tracked: &dyn TrackedFiles,
        sink: &mut dyn MeasureSink,
    ) -> Result<CoverageImportStats> {
        let mut stats = CoverageImportStats {
            reported: coverage.len(),
            imported: 0,
        };

        for path in coverage.files() {
            let Some(input_file) = tracked.input_file(path) else {
                debug!("Code coverage will not be imported for the following file outside of the project: {}", path);
                continue;
            };
            if input_file.language.as_deref() != Some(self.language.as_str()) {
                debug!("Skipping coverage for {}: not a {} file", path, self.language);
                continue;
            }
            let Some(file) = coverage.file(path) else {
                continue;
            };

            let measures = coverage_measures(file);
            let measures = if self.integration_tests {
                measures
                    .into_iter()
                    .map(Measure::into_integration_test)
                    .collect::<Result<Vec<_>>>()?
            } else {
                measures
            };
            for measure in measures {
                sink.save_file_measure(input_file, measure);
            }
            stats.imported += 1;
        }

        info!(
            "Imported coverage for {} of {} reported file(s)",
            stats.imported, stats.reported
        );
        Ok(stats)
    }
}

/// Test-results import: sum every test-results report and save project
/// measures.
#[derive(Debug, Clone)]
pub struct TestResultsImport {
    aggregator: TestResultsAggregator,
}

impl TestResultsImport {
    pub fn new(aggregator: TestResultsAggregator) -> Self {
        Self { aggregator }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(TestResultsAggregator::from_settings(settings))
    }

    pub fn should_execute(&self) -> bool {
        self.aggregator.has_test_results_property()
    }

    pub fn execute(
        &self,
        resolver: &dyn FileResolver,
        sink: &mut dyn MeasureSink,
    ) -> Result<TestRunResults> {
        let mut results = TestRunResults::new();
        if !self.should_execute() {
            return Ok(results);
        }
        self.aggregator.aggregate(resolver, &mut results)?;
        for measure in test_run_measures(&results) {
            sink.save_project_measure(measure);
        }
        Ok(results)
    }
}
