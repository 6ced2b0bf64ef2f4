//! Drive the format parsers over every configured report and fold their
//! contributions into one result.
//!
//! Reports are processed one at a time, in configuration order. The first
//! report that fails to parse aborts the whole aggregation.
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Settings;
use crate::detect::ReportFormat;
use crate::error::{DotcovError, Result};
use crate::model::{CoverageData, TestRunResults};
use crate::parsers::ncover3::NCover3Parser;
use crate::parsers::nunit::NUnitTestResultsParser;
use crate::parsers::opencover::OpenCoverParser;
use crate::parsers::trx::VisualStudioTestResultsParser;
use crate::parsers::vscoverage::VisualStudioCoverageParser;
use crate::parsers::xunit::XUnitTestResultsParser;
use crate::parsers::{CoverageParser, TestResultsParser};
use crate::resolve::FileResolver;

/// A configured report source: a format and a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSource {
    pub format: ReportFormat,
    pub pattern: String,
}

impl ReportSource {
    pub fn new(format: ReportFormat, pattern: impl Into<String>) -> Self {
        Self {
            format,
            pattern: pattern.into(),
        }
    }
}

fn sources_for(format: ReportFormat, patterns: &[String]) -> impl Iterator<Item = ReportSource> + '_ {
    patterns.iter().map(move |p| ReportSource::new(format, p.as_str()))
}

pub fn coverage_parser(format: ReportFormat) -> Option<&'static dyn CoverageParser> {
    match format {
        ReportFormat::OpenCover => Some(&OpenCoverParser),
        ReportFormat::NCover3 => Some(&NCover3Parser),
        ReportFormat::VisualStudioCoverage => Some(&VisualStudioCoverageParser),
        _ => None,
    }
}

pub fn test_results_parser(format: ReportFormat) -> Option<&'static dyn TestResultsParser> {
    match format {
        ReportFormat::VisualStudioTests => Some(&VisualStudioTestResultsParser),
        ReportFormat::NUnit => Some(&NUnitTestResultsParser),
        ReportFormat::XUnit => Some(&XUnitTestResultsParser),
        _ => None,
    }
}

/// Resolve every source and hand each matching file to `visit`.
fn for_each_report(
    base_dir: &Path,
    sources: &[ReportSource],
    resolver: &dyn FileResolver,
    mut visit: impl FnMut(ReportFormat, &Path) -> Result<()>,
) -> Result<()> {
    for source in sources {
        let files = resolver.resolve(&source.pattern, base_dir)?;
        debug!(
            "{} {} report(s) matched {}",
            files.len(),
            source.format,
            source.pattern
        );
        for file in files {
            visit(source.format, &file)?;
        }
    }
    Ok(())
}

/// Aggregates coverage from every configured coverage report, max-merging
/// per-line hits.
#[derive(Debug, Clone)]
pub struct CoverageAggregator {
    base_dir: PathBuf,
    sources: Vec<ReportSource>,
}

impl CoverageAggregator {
    pub fn new(base_dir: impl Into<PathBuf>, sources: Vec<ReportSource>) -> Self {
        Self {
            base_dir: base_dir.into(),
            sources,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let reports = &settings.coverage;
        let sources = sources_for(ReportFormat::OpenCover, &reports.opencover)
            .chain(sources_for(ReportFormat::NCover3, &reports.ncover3))
            .chain(sources_for(ReportFormat::VisualStudioCoverage, &reports.visual_studio))
            .collect();
        Self::new(settings.base_dir.clone(), sources)
    }

    /// True when at least one coverage report expression is configured.
    pub fn has_coverage_property(&self) -> bool {
        !self.sources.is_empty()
    }

    pub fn aggregate(&self, resolver: &dyn FileResolver, coverage: &mut CoverageData) -> Result<()> {
        for_each_report(&self.base_dir, &self.sources, resolver, |format, file| {
            let parser = coverage_parser(format).ok_or_else(|| {
                DotcovError::Configuration(format!("{format} is not a coverage report format"))
            })?;
            parser.parse(file, coverage)
        })
    }
}

/// Aggregates test-run statistics from every configured test-results
/// report, summing the counters.
#[derive(Debug, Clone)]
pub struct TestResultsAggregator {
    base_dir: PathBuf,
    sources: Vec<ReportSource>,
}

impl TestResultsAggregator {
    pub fn new(base_dir: impl Into<PathBuf>, sources: Vec<ReportSource>) -> Self {
        Self {
            base_dir: base_dir.into(),
            sources,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let reports = &settings.tests;
        let sources = sources_for(ReportFormat::VisualStudioTests, &reports.visual_studio)
            .chain(sources_for(ReportFormat::NUnit, &reports.nunit))
            .chain(sources_for(ReportFormat::XUnit, &reports.xunit))
            .collect();
        Self::new(settings.base_dir.clone(), sources)
    }

    /// True when at least one test-results report expression is configured.
    pub fn has_test_results_property(&self) -> bool {
        !self.sources.is_empty()
    }

    pub fn aggregate(&self, resolver: &dyn FileResolver, results: &mut TestRunResults) -> Result<()> {
        for_each_report(&self.base_dir, &self.sources, resolver, |format, file| {
            let parser = test_results_parser(format).ok_or_else(|| {
                DotcovError::Configuration(format!("{format} is not a test results report format"))
            })?;
            parser.parse(file, results)
        })
    }
}
