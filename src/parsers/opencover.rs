/// Parser for OpenCover XML coverage reports.
///
/// OpenCover structure:
///   <CoverageSession>
///     <Modules>
///       <Module hash="...">
///         <Files>
///           <File uid="1" fullPath="C:\src\Foo.cs"/>
///         </Files>
///         <Classes><Class><Methods><Method visited="true" ...>
///           <SequencePoints>
///             <SequencePoint vc="3" uspid="1" ordinal="0" offset="0"
///                            sl="12" sc="9" el="12" ec="10" fileid="1"/>
///           </SequencePoints>
///           <BranchPoints>
///             <BranchPoint vc="1" uspid="4" ordinal="0" offset="7" sl="13"
///                          path="0" fileid="1"/>
///           </BranchPoints>
///           <FileRef uid="1"/>
///         </Method></Methods></Class></Classes>
///       </Module>
///     </Modules>
///   </CoverageSession>
///
/// Older OpenCover versions omit `fileid` on points; those fall back to the
/// most recent `<FileRef>`.
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::model::CoverageData;
use crate::parsers::{line_number, CoverageParser};
use crate::xml::XmlCursor;

const ROOT_TAG: &str = "CoverageSession";

pub struct OpenCoverParser;

impl CoverageParser for OpenCoverParser {
    fn parse(&self, path: &Path, coverage: &mut CoverageData) -> Result<()> {
        info!("Parsing the OpenCover report {}", path.display());
        let parsed = parse_opencover(path)?;
        coverage.merge(&parsed);
        Ok(())
    }
}

fn parse_opencover(path: &Path) -> Result<CoverageData> {
    let mut cursor = XmlCursor::open(path)?;
    cursor.check_root_tag(ROOT_TAG)?;

    let mut coverage = CoverageData::new();
    let mut files: HashMap<String, String> = HashMap::new();
    let mut file_ref: Option<String> = None;
    // (path, line) → (branch points seen, branch points visited)
    let mut branches: BTreeMap<(String, u32), (u32, u32)> = BTreeMap::new();

    while let Some(tag) = cursor.next_start_tag()? {
        match tag.as_str() {
            "File" => {
                let uid = cursor.required_attribute("uid")?;
                let full_path = cursor.required_attribute("fullPath")?;
                files.insert(uid, full_path);
            }
            "FileRef" => {
                file_ref = Some(cursor.required_attribute("uid")?);
            }
            "SequencePoint" => {
                let vc = cursor.required_int_attribute("vc")?;
                let line = line_number(&cursor, cursor.required_int_attribute("sl")?)?;
                if let Some(file) = point_file(&cursor, &files, file_ref.as_deref()) {
                    coverage.add_hits(file, line, vc);
                }
            }
            "BranchPoint" => {
                let vc = cursor.required_int_attribute("vc")?;
                let line = line_number(&cursor, cursor.required_int_attribute("sl")?)?;
                if let Some(file) = point_file(&cursor, &files, file_ref.as_deref()) {
                    let entry = branches.entry((file.to_string(), line)).or_insert((0, 0));
                    entry.0 += 1;
                    if vc > 0 {
                        entry.1 += 1;
                    }
                }
            }
            _ => {}
        }
    }

    for ((file, line), (total, covered)) in branches {
        coverage.add_conditions(&file, line, total, covered);
    }

    Ok(coverage)
}

/// Resolve the file a point belongs to: its own `fileid`, else the current
/// `<FileRef>`. Unknown ids yield `None`.
fn point_file<'a>(
    cursor: &XmlCursor,
    files: &'a HashMap<String, String>,
    file_ref: Option<&str>,
) -> Option<&'a str> {
    let id = cursor.attribute("fileid").or(file_ref)?;
    files.get(id).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineConditions;
    use crate::parsers::write_fixture;

    const REPORT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<CoverageSession xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <Summary numSequencePoints="5" visitedSequencePoints="3"/>
  <Modules>
    <Module hash="ABC">
      <ModulePath>C:\bin\App.dll</ModulePath>
      <Files>
        <File uid="1" fullPath="/src/Foo.cs"/>
        <File uid="2" fullPath="/src/Bar.cs"/>
      </Files>
      <Classes>
        <Class>
          <Methods>
            <Method visited="true">
              <SequencePoints>
                <SequencePoint vc="3" sl="12" fileid="1"/>
                <SequencePoint vc="0" sl="13" fileid="1"/>
                <SequencePoint vc="1" sl="13" fileid="1"/>
              </SequencePoints>
              <BranchPoints>
                <BranchPoint vc="1" sl="13" path="0" fileid="1"/>
                <BranchPoint vc="0" sl="13" path="1" fileid="1"/>
              </BranchPoints>
              <FileRef uid="1"/>
            </Method>
            <Method visited="false">
              <FileRef uid="2"/>
              <SequencePoints>
                <SequencePoint vc="0" sl="5"/>
                <SequencePoint vc="2" sl="6" fileid="99"/>
              </SequencePoints>
            </Method>
          </Methods>
        </Class>
      </Classes>
    </Module>
  </Modules>
</CoverageSession>"#;

    #[test]
    fn test_parse_opencover() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "opencover.xml", REPORT);

        let mut coverage = CoverageData::new();
        OpenCoverParser.parse(&path, &mut coverage).unwrap();

        assert_eq!(coverage.files().collect::<Vec<_>>(), vec!["/src/Bar.cs", "/src/Foo.cs"]);

        let foo = coverage.file("/src/Foo.cs").unwrap();
        assert_eq!(foo.lines[&12], 3);
        assert_eq!(foo.lines[&13], 1);
        assert_eq!(foo.conditions[&13], LineConditions { total: 2, covered: 1 });

        // fileid missing → FileRef; unknown fileid → dropped
        let bar = coverage.file("/src/Bar.cs").unwrap();
        assert_eq!(bar.lines.len(), 1);
        assert_eq!(bar.lines[&5], 0);
    }

    #[test]
    fn test_parse_opencover_twice_does_not_inflate() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "opencover.xml", REPORT);

        let mut coverage = CoverageData::new();
        OpenCoverParser.parse(&path, &mut coverage).unwrap();
        let once = coverage.clone();
        OpenCoverParser.parse(&path, &mut coverage).unwrap();
        assert_eq!(coverage, once);
    }

    #[test]
    fn test_parse_opencover_missing_visit_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            &dir,
            "opencover.xml",
            r#"<CoverageSession><File uid="1" fullPath="/a.cs"/><SequencePoint sl="1" fileid="1"/></CoverageSession>"#,
        );

        let mut coverage = CoverageData::new();
        let err = OpenCoverParser.parse(&path, &mut coverage).unwrap_err();
        assert!(err.to_string().contains("\"vc\""), "{err}");
        assert!(coverage.is_empty());
    }
}
