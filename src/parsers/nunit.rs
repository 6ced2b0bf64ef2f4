/// Parser for NUnit 2.x test results reports.
///
/// NUnit structure:
///   <test-results name="..." total="10" errors="1" failures="2" not-run="3"
///                 inconclusive="1" ignored="2" skipped="0" invalid="0" ...>
///     <test-suite type="Assembly" name="..." executed="True" result="Failure"
///                 time="1.234" ...>
///       ...nested test-suite / test-case elements...
///     </test-suite>
///   </test-results>
///
/// Counters live on the root element. The duration comes from the outermost
/// `<test-suite>`, whose `time` covers the whole run.
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::model::TestRunResults;
use crate::parsers::{seconds_to_millis, sum_counters, TestResultsParser};
use crate::xml::XmlCursor;

const ROOT_TAG: &str = "test-results";

pub struct NUnitTestResultsParser;

impl TestResultsParser for NUnitTestResultsParser {
    fn parse(&self, path: &Path, results: &mut TestRunResults) -> Result<()> {
        info!("Parsing the NUnit Test Results file {}", path.display());
        let parsed = parse_nunit(path)?;
        results.add(&parsed);
        Ok(())
    }
}

fn parse_nunit(path: &Path) -> Result<TestRunResults> {
    let mut cursor = XmlCursor::open(path)?;
    cursor.check_root_tag(ROOT_TAG)?;

    let mut results = read_root_counters(&cursor)?;

    while let Some(tag) = cursor.next_start_tag()? {
        if tag == "test-suite" {
            if let Some(seconds) = cursor.double_attribute("time")? {
                results.add(&TestRunResults::timed(seconds_to_millis(seconds)));
            }
            break;
        }
    }
    cursor.finish()?;

    Ok(results)
}

fn read_root_counters(cursor: &XmlCursor) -> Result<TestRunResults> {
    let total = cursor.required_int_attribute("total")?;
    let errors = cursor.required_int_attribute("errors")?;
    let failures = cursor.required_int_attribute("failures")?;
    let inconclusive = cursor.required_int_attribute("inconclusive")?;
    let ignored = cursor.required_int_attribute("ignored")?;
    let skipped = sum_counters(cursor, &[inconclusive, ignored])?;

    let tests = total.checked_sub(inconclusive);
    let passed = tests
        .and_then(|t| t.checked_sub(errors))
        .and_then(|t| t.checked_sub(failures));

    match (tests, passed) {
        (Some(tests), Some(passed)) => Ok(TestRunResults::counts(
            tests,
            passed,
            skipped,
            failures,
            errors,
        )),
        _ => Err(cursor.parse_error(format!(
            "Inconsistent counters: total={total} errors={errors} failures={failures} inconclusive={inconclusive}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::write_fixture;

    #[test]
    fn test_parse_nunit() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            &dir,
            "nunit.xml",
            r#"<?xml version="1.0" encoding="utf-8"?>
<test-results name="Tests.dll" total="10" errors="1" failures="2" not-run="3"
              inconclusive="1" ignored="2" skipped="0" invalid="0">
  <environment nunit-version="2.6.3.13283"/>
  <test-suite type="Assembly" name="Tests.dll" time="1.234">
    <results>
      <test-suite type="Namespace" name="Tests" time="0.5"/>
    </results>
  </test-suite>
</test-results>"#,
        );

        let mut results = TestRunResults::new();
        NUnitTestResultsParser.parse(&path, &mut results).unwrap();

        assert_eq!(results.tests, 9);
        assert_eq!(results.passed_tests, 6);
        assert_eq!(results.skipped_tests, 3);
        assert_eq!(results.failures, 2);
        assert_eq!(results.errors, 1);
        assert_eq!(results.execution_time, Some(1234));
    }

    #[test]
    fn test_parse_nunit_without_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            &dir,
            "nunit.xml",
            r#"<test-results total="2" errors="0" failures="0" inconclusive="0" ignored="0"/>"#,
        );

        let mut results = TestRunResults::new();
        NUnitTestResultsParser.parse(&path, &mut results).unwrap();
        assert_eq!(results.tests, 2);
        assert_eq!(results.passed_tests, 2);
        assert_eq!(results.execution_time, None);
    }

    #[test]
    fn test_parse_nunit_missing_counter() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            &dir,
            "nunit.xml",
            r#"<test-results total="2" errors="0" failures="0" inconclusive="0"/>"#,
        );

        let mut results = TestRunResults::new();
        let err = NUnitTestResultsParser.parse(&path, &mut results).unwrap_err();
        assert!(err.to_string().contains("\"ignored\""), "{err}");
        assert_eq!(results, TestRunResults::new());
    }

    #[test]
    fn test_parse_nunit_inconsistent_counters() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            &dir,
            "nunit.xml",
            r#"<test-results total="1" errors="1" failures="1" inconclusive="0" ignored="0"/>"#,
        );

        let mut results = TestRunResults::new();
        assert!(NUnitTestResultsParser.parse(&path, &mut results).is_err());
    }

    #[test]
    fn test_parse_nunit_truncated_after_first_suite() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            &dir,
            "nunit.xml",
            r#"<test-results total="2" errors="0" failures="0" inconclusive="0" ignored="0">
  <test-suite type="Assembly" time="0.5">
    <results>
      <test-case name="A" executed="True"/>"#,
        );

        let mut results = TestRunResults::new();
        let err = NUnitTestResultsParser.parse(&path, &mut results).unwrap_err();
        assert!(err.to_string().contains("unexpected end of document"), "{err}");
        assert_eq!(results, TestRunResults::new());
    }

    #[test]
    fn test_parse_nunit_skipped_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            &dir,
            "nunit.xml",
            r#"<test-results total="18446744073709551615" errors="0" failures="0" inconclusive="18446744073709551615" ignored="1"/>"#,
        );

        let mut results = TestRunResults::new();
        let err = NUnitTestResultsParser.parse(&path, &mut results).unwrap_err();
        assert!(err.to_string().contains("Counter overflow"), "{err}");
    }
}
