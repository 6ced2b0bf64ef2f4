/// Parser for NCover 3 XML coverage reports.
///
/// NCover 3 structure:
///   <coverage profilerVersion="3.4.18.6937" ...>
///     <documents>
///       <doc id="1" url="C:\src\Foo.cs" .../>
///     </documents>
///     <module moduleId="1" ...>
///       <method name="..." ...>
///         <seqpnt vc="2" l="12" pe="..." c="9" el="12" ec="10" doc="1"/>
///       </method>
///     </module>
///   </coverage>
///
/// Document id 0 is NCover's placeholder for code without a source file.
use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::model::CoverageData;
use crate::parsers::{line_number, CoverageParser};
use crate::xml::XmlCursor;

const ROOT_TAG: &str = "coverage";
const EXCLUDED_DOCUMENT_ID: &str = "0";

pub struct NCover3Parser;

impl CoverageParser for NCover3Parser {
    fn parse(&self, path: &Path, coverage: &mut CoverageData) -> Result<()> {
        info!("Parsing the NCover3 report {}", path.display());
        let parsed = parse_ncover3(path)?;
        coverage.merge(&parsed);
        Ok(())
    }
}

fn parse_ncover3(path: &Path) -> Result<CoverageData> {
    let mut cursor = XmlCursor::open(path)?;
    cursor.check_root_tag(ROOT_TAG)?;

    let mut coverage = CoverageData::new();
    let mut documents: HashMap<String, String> = HashMap::new();

    while let Some(tag) = cursor.next_start_tag()? {
        match tag.as_str() {
            "doc" => {
                let id = cursor.required_attribute("id")?;
                let url = cursor.required_attribute("url")?;
                if id != EXCLUDED_DOCUMENT_ID {
                    documents.insert(id, url);
                }
            }
            "seqpnt" => {
                let doc = cursor.required_attribute("doc")?;
                let vc = cursor.required_int_attribute("vc")?;
                let line = line_number(&cursor, cursor.required_int_attribute("l")?)?;
                if let Some(url) = documents.get(&doc) {
                    coverage.add_hits(url, line, vc);
                }
            }
            _ => {}
        }
    }

    Ok(coverage)
}
