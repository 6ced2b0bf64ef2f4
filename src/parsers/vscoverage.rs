/// Parser for Visual Studio coverage XML reports (`.coveragexml`).
///
/// Structure:
///   <results>
///     <modules>
///       <module name="app.dll" ...>
///         <functions>
///           <function id="..." name="Run" ...>
///             <ranges>
///               <range source_id="0" covered="yes" start_line="12"
///                      start_column="9" end_line="13" end_column="10"/>
///             </ranges>
///           </function>
///         </functions>
///         <source_files>
///           <source_file id="0" path="C:\src\Foo.cs" .../>
///         </source_files>
///       </module>
///     </modules>
///   </results>
///
/// Source ids are local to their `<module>`, and the `<source_files>` table
/// comes after the ranges that reference it, so ranges are buffered per
/// module until their source file is known.
use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::model::CoverageData;
use crate::parsers::{line_number, CoverageParser};
use crate::xml::XmlCursor;

const ROOT_TAG: &str = "results";

/// Longest line span a single `<range>` may cover.
const MAX_RANGE_LINES: u32 = 100_000;

pub struct VisualStudioCoverageParser;

impl CoverageParser for VisualStudioCoverageParser {
    fn parse(&self, path: &Path, coverage: &mut CoverageData) -> Result<()> {
        info!("Parsing the Visual Studio coverage XML report {}", path.display());
        let parsed = parse_vscoverage(path)?;
        coverage.merge(&parsed);
        Ok(())
    }
}

fn parse_vscoverage(path: &Path) -> Result<CoverageData> {
    let mut cursor = XmlCursor::open(path)?;
    cursor.check_root_tag(ROOT_TAG)?;

    let mut coverage = CoverageData::new();
    // source_id → (start line, end line, hits) for the current module
    let mut pending: HashMap<String, Vec<(u32, u32, u64)>> = HashMap::new();

    while let Some(tag) = cursor.next_start_tag()? {
        match tag.as_str() {
            "module" => pending.clear(),
            "range" => {
                let source_id = cursor.required_attribute("source_id")?;
                let covered = cursor.required_attribute("covered")?;
                let start = line_number(&cursor, cursor.required_int_attribute("start_line")?)?;
                let end = line_number(&cursor, cursor.required_int_attribute("end_line")?)?;
                if end < start || end - start >= MAX_RANGE_LINES {
                    return Err(cursor.parse_error(format!(
                        "Invalid range: start_line={start} end_line={end}"
                    )));
                }

                let hits = match covered.as_str() {
                    "yes" | "partial" => 1,
                    "no" => 0,
                    other => {
                        return Err(cursor.parse_error(format!(
                            "Unsupported \"covered\" value \"{other}\", expected one of \"yes\", \"partial\" or \"no\""
                        )));
                    }
                };

                pending.entry(source_id).or_default().push((start, end, hits));
            }
            "source_file" => {
                let id = cursor.required_attribute("id")?;
                let file = cursor.required_attribute("path")?;
                for (start, end, hits) in pending.remove(&id).unwrap_or_default() {
                    for line in start..=end {
                        coverage.add_hits(&file, line, hits);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(coverage)
}
