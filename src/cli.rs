//! Command handler functions for the dotcov CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::aggregate::{coverage_parser, test_results_parser};
use crate::config::Settings;
use crate::detect::{detect_format, ReportFormat, ReportKind};
use crate::import::{CoverageImport, MemorySink, TestResultsImport};
use crate::measures::{MeasureValue, Metric};
use crate::model::{rate, CoverageData, TestRunResults};
use crate::project::ProjectFiles;
use crate::resolve::GlobResolver;

/// Output style for the import commands.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Style {
    Text,
    Json,
}

pub fn cmd_coverage(settings: &Settings, project_dir: &Path, style: Style) -> Result<String> {
    let import = CoverageImport::from_settings(settings);
    if !import.should_execute() {
        return Ok("No coverage report configured.\n".to_string());
    }

    let project = ProjectFiles::scan(project_dir)
        .with_context(|| format!("Failed to index project files in {}", project_dir.display()))?;
    if project.is_empty() {
        return Ok(format!("No source files found in {}.\n", project_dir.display()));
    }
    let mut sink = MemorySink::new();
    let stats = import.execute(&GlobResolver, &project, &mut sink)?;

    if let Style::Json = style {
        return Ok(serde_json::to_string_pretty(&sink)? + "\n");
    }

    let mut out = String::new();
    writeln!(
        out,
        "Files:      {} imported of {} reported",
        stats.imported, stats.reported
    )?;
    let (lines_metric, uncovered_metric) = if settings.integration_tests {
        (Metric::ItLinesToCover, Metric::ItUncoveredLines)
    } else {
        (Metric::LinesToCover, Metric::UncoveredLines)
    };
    for (path, measures) in &sink.files {
        let count = |metric: Metric| {
            measures
                .iter()
                .find(|m| m.metric == metric)
                .and_then(|m| match m.value {
                    MeasureValue::Count(v) => Some(v),
                    _ => None,
                })
                .unwrap_or(0)
        };
        let total = count(lines_metric);
        let covered = total - count(uncovered_metric).min(total);
        writeln!(
            out,
            "  {:>6.1}%  {}/{}  {}",
            rate(covered, total) * 100.0,
            covered,
            total,
            path
        )?;
    }
    Ok(out)
}

pub fn cmd_tests(settings: &Settings, style: Style) -> Result<String> {
    let import = TestResultsImport::from_settings(settings);
    if !import.should_execute() {
        return Ok("No test results report configured.\n".to_string());
    }

    let mut sink = MemorySink::new();
    let results = import.execute(&GlobResolver, &mut sink)?;

    if let Style::Json = style {
        return Ok(serde_json::to_string_pretty(&results)? + "\n");
    }

    let mut out = String::new();
    write_test_results(&mut out, &results)?;
    Ok(out)
}

/// Parse a single report, detecting its format unless one is given.
pub fn cmd_parse(file: &Path, format: Option<&str>, style: Style) -> Result<String> {
    let format = match format {
        Some(name) => name.parse::<ReportFormat>()?,
        None => detect_format(file)
            .with_context(|| format!("Failed to detect the format of {}", file.display()))?,
    };

    let mut out = String::new();
    match format.kind() {
        ReportKind::TestResults => {
            let parser = test_results_parser(format)
                .with_context(|| format!("No test results parser for {format}"))?;
            let mut results = TestRunResults::new();
            parser.parse(file, &mut results)?;
            if let Style::Json = style {
                return Ok(serde_json::to_string_pretty(&results)? + "\n");
            }
            writeln!(out, "Format:     {format}")?;
            write_test_results(&mut out, &results)?;
        }
        ReportKind::Coverage => {
            let parser = coverage_parser(format)
                .with_context(|| format!("No coverage parser for {format}"))?;
            let mut coverage = CoverageData::new();
            parser.parse(file, &mut coverage)?;
            if let Style::Json = style {
                return Ok(serde_json::to_string_pretty(&coverage)? + "\n");
            }
            writeln!(out, "Format:     {format}")?;
            write_coverage(&mut out, &coverage)?;
        }
    }
    Ok(out)
}

fn write_test_results(out: &mut String, results: &TestRunResults) -> std::fmt::Result {
    writeln!(out, "Tests:      {}", results.tests)?;
    writeln!(out, "Passed:     {}", results.passed_tests)?;
    writeln!(out, "Skipped:    {}", results.skipped_tests)?;
    writeln!(out, "Failures:   {}", results.failures)?;
    writeln!(out, "Errors:     {}", results.errors)?;
    if let Some(ms) = results.execution_time {
        writeln!(out, "Duration:   {} ms", ms)?;
    }
    if let Some(density) = results.success_density() {
        writeln!(out, "Success:    {:.1}%", density)?;
    }
    Ok(())
}

fn write_coverage(out: &mut String, coverage: &CoverageData) -> std::fmt::Result {
    writeln!(out, "Files:      {}", coverage.len())?;
    for file in coverage.files().filter_map(|path| coverage.file(path)) {
        let total = file.lines_to_cover();
        let covered = total - file.uncovered_lines().min(total);
        writeln!(
            out,
            "  {:>6.1}%  {}/{}  {}",
            rate(covered, total) * 100.0,
            covered,
            total,
            file.path
        )?;
    }
    Ok(())
}

pub fn cmd_detect(files: &[PathBuf]) -> Result<String> {
    let mut out = String::new();
    for file in files {
        let format = detect_format(file)
            .with_context(|| format!("Failed to detect the format of {}", file.display()))?;
        writeln!(out, "{}\t{}", format, file.display())?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_tests_text() {
        let dir = tempfile::tempdir().unwrap();
        crate::parsers::write_fixture(
            &dir,
            "run.trx",
            r#"<TestRun><Times start="2016-01-01T10:00:00.0+00:00" finish="2016-01-01T10:00:01.25+00:00"/><Counters passed="3" failed="1" inconclusive="2"/></TestRun>"#,
        );
        let mut settings = Settings::default();
        settings.base_dir = dir.path().to_path_buf();
        settings.tests.visual_studio.push("*.trx".to_string());

        let out = cmd_tests(&settings, Style::Text).unwrap();
        assert!(out.contains("Tests:      4"), "{out}");
        assert!(out.contains("Skipped:    2"), "{out}");
        assert!(out.contains("Duration:   1250 ms"), "{out}");
        assert!(out.contains("Success:    75.0%"), "{out}");
    }

    #[test]
    fn test_cmd_tests_nothing_configured() {
        let out = cmd_tests(&Settings::default(), Style::Json).unwrap();
        assert_eq!(out, "No test results report configured.\n");
    }

    #[test]
    fn test_cmd_parse_detects_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = crate::parsers::write_fixture(
            &dir,
            "cov.xml",
            r#"<CoverageSession><File uid="1" fullPath="/src/A.cs"/><SequencePoint vc="2" sl="1" fileid="1"/><SequencePoint vc="0" sl="2" fileid="1"/></CoverageSession>"#,
        );
        let out = cmd_parse(&path, None, Style::Text).unwrap();
        assert!(out.contains("Format:     opencover"), "{out}");
        assert!(out.contains("50.0%  1/2  /src/A.cs"), "{out}");
    }

    #[test]
    fn test_cmd_parse_format_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = crate::parsers::write_fixture(
            &dir,
            "run.xml",
            r#"<TestRun><Counters passed="2" failed="1"/></TestRun>"#,
        );
        let out = cmd_parse(&path, Some("TRX"), Style::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["tests"], 3);
        assert_eq!(json["passed_tests"], 2);

        // A forced format that does not match the report fails to parse.
        assert!(cmd_parse(&path, Some("nunit"), Style::Text).is_err());
        assert!(cmd_parse(&path, Some("lcov"), Style::Text).is_err());
    }

    #[test]
    fn test_cmd_coverage_empty_project() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.coverage.opencover.push("*.xml".to_string());
        let out = cmd_coverage(&settings, dir.path(), Style::Text).unwrap();
        assert!(out.starts_with("No source files found"), "{out}");
    }

    #[test]
    fn test_cmd_detect() {
        let dir = tempfile::tempdir().unwrap();
        let path = crate::parsers::write_fixture(&dir, "a.xml", "<CoverageSession/>");
        let out = cmd_detect(&[path.clone()]).unwrap();
        assert_eq!(out, format!("opencover\t{}\n", path.display()));
    }
}
