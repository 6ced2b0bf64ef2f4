/// Parser for xUnit.net v2 XML reports.
///
/// xUnit structure:
///   <assemblies timestamp="...">
///     <assembly name="Tests.dll" total="6" passed="3" failed="1" skipped="2"
///               errors="0" time="0.528" ...>
///       <collection .../>
///       <errors/>
///     </assembly>
///     ...
///   </assemblies>
///
/// A report for a single assembly may use `<assembly>` as its root.
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::model::TestRunResults;
use crate::parsers::{seconds_to_millis, TestResultsParser};
use crate::xml::XmlCursor;

pub struct XUnitTestResultsParser;

impl TestResultsParser for XUnitTestResultsParser {
    fn parse(&self, path: &Path, results: &mut TestRunResults) -> Result<()> {
        info!("Parsing the xUnit Test Results file {}", path.display());
        let parsed = parse_xunit(path)?;
        results.add(&parsed);
        Ok(())
    }
}

fn parse_xunit(path: &Path) -> Result<TestRunResults> {
    let mut cursor = XmlCursor::open(path)?;
    let root = cursor.root_tag()?;

    let mut results = TestRunResults::new();
    match root.as_str() {
        "assembly" => {
            results.add(&read_assembly(&cursor)?);
            cursor.finish()?;
        }
        "assemblies" => {
            while let Some(tag) = cursor.next_start_tag()? {
                if tag == "assembly" {
                    results.add(&read_assembly(&cursor)?);
                }
            }
        }
        _ => {
            return Err(cursor.parse_error("Missing root element <assemblies> or <assembly>"));
        }
    }

    Ok(results)
}

fn read_assembly(cursor: &XmlCursor) -> Result<TestRunResults> {
    let total = cursor.required_int_attribute("total")?;
    let passed = cursor.required_int_attribute("passed")?;
    let failed = cursor.required_int_attribute("failed")?;
    let skipped = cursor.required_int_attribute("skipped")?;
    let errors = cursor.int_attribute_or_zero("errors")?;

    let mut results = TestRunResults::counts(total, passed, skipped, failed, errors);
    results.execution_time = cursor.double_attribute("time")?.map(seconds_to_millis);
    Ok(results)
}
