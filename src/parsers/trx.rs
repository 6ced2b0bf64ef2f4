/// Parser for Visual Studio test results (`.trx`) reports.
///
/// TRX structure (only the parts we read):
///   <TestRun id="..." name="..." xmlns="...">
///     <Times creation="..." queuing="..." start="2016-01-01T10:00:00.1234567+01:00"
///            finish="2016-01-01T10:00:02.5+01:00"/>
///     <ResultSummary outcome="Completed">
///       <Counters total="6" executed="4" passed="3" failed="1" error="0"
///                 timeout="0" aborted="0" inconclusive="2" .../>
///     </ResultSummary>
///     ...
///   </TestRun>
///
/// `<Counters>` is mandatory, `<Times>` is optional, and the two may appear
/// in either order. Everything else is ignored.
use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::{Captures, Regex};
use tracing::info;

use crate::error::Result;
use crate::model::TestRunResults;
use crate::parsers::{sum_counters, TestResultsParser};
use crate::xml::XmlCursor;

/// Fractional seconds: the dot, up to three kept digits, then any excess.
static FRACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.([0-9]{0,3})[0-9]*").unwrap());

const ROOT_TAG: &str = "TestRun";

pub struct VisualStudioTestResultsParser;

impl TestResultsParser for VisualStudioTestResultsParser {
    fn parse(&self, path: &Path, results: &mut TestRunResults) -> Result<()> {
        info!("Parsing the Visual Studio Test Results file {}", path.display());
        let parsed = parse_trx(path)?;
        results.add(&parsed);
        Ok(())
    }
}

fn parse_trx(path: &Path) -> Result<TestRunResults> {
    let mut cursor = XmlCursor::open(path)?;
    cursor.check_root_tag(ROOT_TAG)?;

    let mut results = TestRunResults::new();
    let mut found_counters = false;

    while let Some(tag) = cursor.next_start_tag()? {
        match tag.as_str() {
            "Counters" => {
                found_counters = true;
                results.add(&read_counters(&cursor)?);
            }
            "Times" => {
                results.add(&read_times(&cursor)?);
            }
            _ => {}
        }
    }

    if !found_counters {
        return Err(cursor.parse_error(format!(
            "The mandatory <Counters> tag is missing in {}",
            path.display()
        )));
    }

    Ok(results)
}

fn read_counters(cursor: &XmlCursor) -> Result<TestRunResults> {
    let passed = cursor.int_attribute_or_zero("passed")?;
    let failed = cursor.int_attribute_or_zero("failed")?;
    let errors = cursor.int_attribute_or_zero("error")?;
    let timeout = cursor.int_attribute_or_zero("timeout")?;
    let aborted = cursor.int_attribute_or_zero("aborted")?;
    let inconclusive = cursor.int_attribute_or_zero("inconclusive")?;

    // Inconclusive tests are reported as skipped and stay out of the total.
    let tests = sum_counters(cursor, &[passed, failed, errors, timeout, aborted])?;
    let failures = sum_counters(cursor, &[timeout, failed, aborted])?;

    Ok(TestRunResults::counts(tests, passed, inconclusive, failures, errors))
}

fn read_times(cursor: &XmlCursor) -> Result<TestRunResults> {
    let start = required_date_attribute(cursor, "start")?;
    let finish = required_date_attribute(cursor, "finish")?;
    let duration = finish.signed_duration_since(start).num_milliseconds();
    Ok(TestRunResults::timed(duration))
}

fn required_date_attribute(cursor: &XmlCursor, name: &str) -> Result<DateTime<FixedOffset>> {
    let raw = cursor.required_attribute(name)?;
    let value = keep_only_milliseconds(&raw);
    DateTime::parse_from_rfc3339(&value).map_err(|e| {
        cursor.parse_error(format!(
            "Expected a valid date and time instead of \"{value}\" for the attribute \"{name}\". {e}"
        ))
    })
}

/// Normalize fractional seconds to exactly three digits, padding with zeros
/// or dropping the excess.
fn keep_only_milliseconds(value: &str) -> Cow<'_, str> {
    FRACTION_RE.replace_all(value, |caps: &Captures| format!(".{:0<3}", &caps[1]))
}
