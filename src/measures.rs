//! Measures derived from coverage and test-run data.
//!
//! A measure is a metric plus its value for one file (coverage) or for the
//! whole project (test runs). Coverage metrics each have an integration-test
//! counterpart used when the coverage came from an integration-test pass.
use serde::Serialize;

use crate::error::{DotcovError, Result};
use crate::model::{FileCoverage, TestRunResults};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    LinesToCover,
    UncoveredLines,
    CoverageLineHitsData,
    ConditionsToCover,
    UncoveredConditions,
    CoveredConditionsByLine,
    ConditionsByLine,

    ItLinesToCover,
    ItUncoveredLines,
    ItCoverageLineHitsData,
    ItConditionsToCover,
    ItUncoveredConditions,
    ItCoveredConditionsByLine,
    ItConditionsByLine,

    Tests,
    TestErrors,
    TestFailures,
    SkippedTests,
    TestExecutionTime,
    TestSuccessDensity,
}

impl Metric {
    pub fn key(&self) -> &'static str {
        match self {
            Metric::LinesToCover => "lines_to_cover",
            Metric::UncoveredLines => "uncovered_lines",
            Metric::CoverageLineHitsData => "coverage_line_hits_data",
            Metric::ConditionsToCover => "conditions_to_cover",
            Metric::UncoveredConditions => "uncovered_conditions",
            Metric::CoveredConditionsByLine => "covered_conditions_by_line",
            Metric::ConditionsByLine => "conditions_by_line",
            Metric::ItLinesToCover => "it_lines_to_cover",
            Metric::ItUncoveredLines => "it_uncovered_lines",
            Metric::ItCoverageLineHitsData => "it_coverage_line_hits_data",
            Metric::ItConditionsToCover => "it_conditions_to_cover",
            Metric::ItUncoveredConditions => "it_uncovered_conditions",
            Metric::ItCoveredConditionsByLine => "it_covered_conditions_by_line",
            Metric::ItConditionsByLine => "it_conditions_by_line",
            Metric::Tests => "tests",
            Metric::TestErrors => "test_errors",
            Metric::TestFailures => "test_failures",
            Metric::SkippedTests => "skipped_tests",
            Metric::TestExecutionTime => "test_execution_time",
            Metric::TestSuccessDensity => "test_success_density",
        }
    }

    /// The integration-test counterpart of a unit-test coverage metric.
    /// Every other metric has none.
    pub fn integration_test_variant(&self) -> Option<Metric> {
        match self {
            Metric::LinesToCover => Some(Metric::ItLinesToCover),
            Metric::UncoveredLines => Some(Metric::ItUncoveredLines),
            Metric::CoverageLineHitsData => Some(Metric::ItCoverageLineHitsData),
            Metric::ConditionsToCover => Some(Metric::ItConditionsToCover),
            Metric::UncoveredConditions => Some(Metric::ItUncoveredConditions),
            Metric::CoveredConditionsByLine => Some(Metric::ItCoveredConditionsByLine),
            Metric::ConditionsByLine => Some(Metric::ItConditionsByLine),
            _ => None,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MeasureValue {
    Count(u64),
    Millis(i64),
    Percent(f64),
    /// Per-line data encoded as `line=value;line=value`.
    Data(String),
}

impl std::fmt::Display for MeasureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasureValue::Count(v) => write!(f, "{v}"),
            MeasureValue::Millis(v) => write!(f, "{v} ms"),
            MeasureValue::Percent(v) => write!(f, "{v:.1}%"),
            MeasureValue::Data(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measure {
    pub metric: Metric,
    pub value: MeasureValue,
}

impl Measure {
    pub fn new(metric: Metric, value: MeasureValue) -> Self {
        Self { metric, value }
    }

    /// Re-label this measure with the integration-test variant of its metric.
    ///
    /// A metric without a variant means the remap table is incomplete, which
    /// is a programming error rather than bad input.
    pub fn into_integration_test(self) -> Result<Measure> {
        match self.metric.integration_test_variant() {
            Some(metric) => Ok(Measure { metric, ..self }),
            None => Err(DotcovError::Configuration(format!(
                "Could not map metric \"{}\" to an integration test one.",
                self.metric
            ))),
        }
    }
}

fn line_data<T: std::fmt::Display>(entries: impl Iterator<Item = (u32, T)>) -> String {
    entries
        .map(|(line, value)| format!("{line}={value}"))
        .collect::<Vec<_>>()
        .join(";")
}

/// The standard coverage measures for one file. Condition measures are only
/// produced when the file has condition data.
pub fn coverage_measures(file: &FileCoverage) -> Vec<Measure> {
    let mut measures = vec![
        Measure::new(Metric::LinesToCover, MeasureValue::Count(file.lines_to_cover())),
        Measure::new(Metric::UncoveredLines, MeasureValue::Count(file.uncovered_lines())),
        Measure::new(
            Metric::CoverageLineHitsData,
            MeasureValue::Data(line_data(file.lines.iter().map(|(&l, &h)| (l, h)))),
        ),
    ];

    if !file.conditions.is_empty() {
        let total: u64 = file.conditions.values().map(|c| u64::from(c.total)).sum();
        let uncovered: u64 = file
            .conditions
            .values()
            .map(|c| u64::from(c.total.saturating_sub(c.covered)))
            .sum();
        measures.push(Measure::new(Metric::ConditionsToCover, MeasureValue::Count(total)));
        measures.push(Measure::new(Metric::UncoveredConditions, MeasureValue::Count(uncovered)));
        measures.push(Measure::new(
            Metric::ConditionsByLine,
            MeasureValue::Data(line_data(file.conditions.iter().map(|(&l, c)| (l, c.total)))),
        ));
        measures.push(Measure::new(
            Metric::CoveredConditionsByLine,
            MeasureValue::Data(line_data(file.conditions.iter().map(|(&l, c)| (l, c.covered)))),
        ));
    }

    measures
}

/// Project-level measures for an aggregated test run.
pub fn test_run_measures(results: &TestRunResults) -> Vec<Measure> {
    let mut measures = vec![
        Measure::new(Metric::Tests, MeasureValue::Count(results.tests)),
        Measure::new(Metric::TestErrors, MeasureValue::Count(results.errors)),
        Measure::new(Metric::TestFailures, MeasureValue::Count(results.failures)),
        Measure::new(Metric::SkippedTests, MeasureValue::Count(results.skipped_tests)),
    ];
    if let Some(ms) = results.execution_time {
        measures.push(Measure::new(Metric::TestExecutionTime, MeasureValue::Millis(ms)));
    }
    if let Some(density) = results.success_density() {
        measures.push(Measure::new(Metric::TestSuccessDensity, MeasureValue::Percent(density)));
    }
    measures
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(measures: &[Measure], metric: Metric) -> Option<&MeasureValue> {
        measures.iter().find(|m| m.metric == metric).map(|m| &m.value)
    }

    #[test]
    fn test_coverage_measures_lines_only() {
        let mut file = FileCoverage::new("/src/Foo.cs".to_string());
        file.add_hits(3, 0);
        file.add_hits(1, 2);
        file.add_hits(2, 1);

        let measures = coverage_measures(&file);
        assert_eq!(measures.len(), 3);
        assert_eq!(find(&measures, Metric::LinesToCover), Some(&MeasureValue::Count(3)));
        assert_eq!(find(&measures, Metric::UncoveredLines), Some(&MeasureValue::Count(1)));
        assert_eq!(
            find(&measures, Metric::CoverageLineHitsData),
            Some(&MeasureValue::Data("1=2;2=1;3=0".to_string()))
        );
        assert_eq!(find(&measures, Metric::ConditionsToCover), None);
    }

    #[test]
    fn test_coverage_measures_with_conditions() {
        let mut file = FileCoverage::new("/src/Foo.cs".to_string());
        file.add_hits(13, 1);
        file.add_conditions(13, 2, 1);
        file.add_conditions(20, 4, 4);

        let measures = coverage_measures(&file);
        assert_eq!(find(&measures, Metric::ConditionsToCover), Some(&MeasureValue::Count(6)));
        assert_eq!(find(&measures, Metric::UncoveredConditions), Some(&MeasureValue::Count(1)));
        assert_eq!(
            find(&measures, Metric::ConditionsByLine),
            Some(&MeasureValue::Data("13=2;20=4".to_string()))
        );
        assert_eq!(
            find(&measures, Metric::CoveredConditionsByLine),
            Some(&MeasureValue::Data("13=1;20=4".to_string()))
        );
    }

    #[test]
    fn test_integration_test_remap() {
        let measure = Measure::new(Metric::LinesToCover, MeasureValue::Count(7));
        let remapped = measure.into_integration_test().unwrap();
        assert_eq!(remapped.metric, Metric::ItLinesToCover);
        assert_eq!(remapped.value, MeasureValue::Count(7));
    }

    #[test]
    fn test_every_coverage_metric_has_a_variant() {
        let mut file = FileCoverage::new("/src/Foo.cs".to_string());
        file.add_hits(1, 1);
        file.add_conditions(1, 2, 1);
        for measure in coverage_measures(&file) {
            let remapped = measure.clone().into_integration_test().unwrap();
            assert_ne!(remapped.metric, measure.metric);
            assert!(remapped.metric.key().starts_with("it_"));
        }
    }

    #[test]
    fn test_remap_without_variant_is_a_configuration_error() {
        let measure = Measure::new(Metric::Tests, MeasureValue::Count(1));
        let err = measure.into_integration_test().unwrap_err();
        assert!(matches!(err, DotcovError::Configuration(_)));
        assert!(err.to_string().contains("\"tests\""), "{err}");

        // Variants are not themselves remappable.
        assert_eq!(Metric::ItLinesToCover.integration_test_variant(), None);
    }

    #[test]
    fn test_test_run_measures() {
        let mut results = TestRunResults::counts(4, 3, 2, 1, 0);
        results.add(&TestRunResults::timed(500));

        let measures = test_run_measures(&results);
        assert_eq!(find(&measures, Metric::Tests), Some(&MeasureValue::Count(4)));
        assert_eq!(find(&measures, Metric::SkippedTests), Some(&MeasureValue::Count(2)));
        assert_eq!(find(&measures, Metric::TestFailures), Some(&MeasureValue::Count(1)));
        assert_eq!(find(&measures, Metric::TestExecutionTime), Some(&MeasureValue::Millis(500)));
        assert_eq!(
            find(&measures, Metric::TestSuccessDensity),
            Some(&MeasureValue::Percent(75.0))
        );

        let empty = test_run_measures(&TestRunResults::new());
        assert_eq!(find(&empty, Metric::TestExecutionTime), None);
        assert_eq!(find(&empty, Metric::TestSuccessDensity), None);
    }

    #[test]
    fn test_metric_serializes_as_key() {
        assert_eq!(
            serde_json::to_string(&Metric::ItCoverageLineHitsData).unwrap(),
            "\"it_coverage_line_hits_data\""
        );
    }
}
