/// Report formats and auto-detection.
///
/// Detection reads only the document element of a report: every supported
/// format has a distinct root tag.
use std::path::Path;

use crate::error::{DotcovError, Result};
use crate::xml::XmlCursor;

/// Supported report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    VisualStudioTests,
    NUnit,
    XUnit,
    OpenCover,
    NCover3,
    VisualStudioCoverage,
}

/// What a report contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    TestResults,
    Coverage,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 6] = [
        ReportFormat::VisualStudioTests,
        ReportFormat::NUnit,
        ReportFormat::XUnit,
        ReportFormat::OpenCover,
        ReportFormat::NCover3,
        ReportFormat::VisualStudioCoverage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::VisualStudioTests => "trx",
            ReportFormat::NUnit => "nunit",
            ReportFormat::XUnit => "xunit",
            ReportFormat::OpenCover => "opencover",
            ReportFormat::NCover3 => "ncover3",
            ReportFormat::VisualStudioCoverage => "vscoveragexml",
        }
    }

    pub fn kind(&self) -> ReportKind {
        match self {
            ReportFormat::VisualStudioTests | ReportFormat::NUnit | ReportFormat::XUnit => {
                ReportKind::TestResults
            }
            ReportFormat::OpenCover | ReportFormat::NCover3 | ReportFormat::VisualStudioCoverage => {
                ReportKind::Coverage
            }
        }
    }

    fn from_root_tag(root: &str) -> Option<ReportFormat> {
        match root {
            "TestRun" => Some(ReportFormat::VisualStudioTests),
            "test-results" => Some(ReportFormat::NUnit),
            "assemblies" | "assembly" => Some(ReportFormat::XUnit),
            "CoverageSession" => Some(ReportFormat::OpenCover),
            "coverage" => Some(ReportFormat::NCover3),
            "results" => Some(ReportFormat::VisualStudioCoverage),
            _ => None,
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = DotcovError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        ReportFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == lower)
            .ok_or_else(|| {
                DotcovError::Settings(format!(
                    "Unknown format: '{}'. Supported: trx, nunit, xunit, opencover, ncover3, vscoveragexml",
                    s
                ))
            })
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the format of a report from its root element.
pub fn detect_format(path: &Path) -> Result<ReportFormat> {
    let mut cursor = XmlCursor::open(path)?;
    let root = cursor.root_tag()?;
    ReportFormat::from_root_tag(&root).ok_or_else(|| DotcovError::UnknownFormat(path.to_path_buf()))
}
