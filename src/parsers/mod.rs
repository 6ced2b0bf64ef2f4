pub mod ncover3;
pub mod nunit;
pub mod opencover;
pub mod trx;
pub mod vscoverage;
pub mod xunit;

use std::path::Path;

use crate::error::Result;
use crate::model::{CoverageData, TestRunResults};
use crate::xml::XmlCursor;

/// Every test-results format parser implements this trait.
///
/// A parser reads one report and sums its figures into `results`, which is
/// shared across every report of the run. A report that fails to parse
/// contributes nothing.
pub trait TestResultsParser {
    fn parse(&self, path: &Path, results: &mut TestRunResults) -> Result<()>;
}

/// Every coverage format parser implements this trait.
///
/// Hits are max-merged into `coverage`, which is shared across every report
/// of the run. A report that fails to parse contributes nothing.
pub trait CoverageParser {
    fn parse(&self, path: &Path, coverage: &mut CoverageData) -> Result<()>;
}

/// Convert a duration in (fractional) seconds to whole milliseconds.
pub(crate) fn seconds_to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

/// Narrow a parsed line number, rejecting values that cannot be a line.
pub(crate) fn line_number(cursor: &XmlCursor, value: u64) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|&line| line > 0)
        .ok_or_else(|| cursor.parse_error(format!("Invalid line number {value}")))
}

/// Sum counters read from a report, failing instead of overflowing.
pub(crate) fn sum_counters(cursor: &XmlCursor, counters: &[u64]) -> Result<u64> {
    counters
        .iter()
        .try_fold(0u64, |sum, &n| sum.checked_add(n))
        .ok_or_else(|| cursor.parse_error(format!("Counter overflow while summing {counters:?}")))
}

#[cfg(test)]
pub(crate) fn write_fixture(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_to_millis() {
        assert_eq!(seconds_to_millis(1.5), 1500);
        assert_eq!(seconds_to_millis(0.0004), 0);
        assert_eq!(seconds_to_millis(0.0126), 13);
    }

    #[test]
    fn test_sum_counters() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "r.xml", "<r/>");
        let cursor = XmlCursor::open(&path).unwrap();
        assert_eq!(sum_counters(&cursor, &[]).unwrap(), 0);
        assert_eq!(sum_counters(&cursor, &[1, 2, 3]).unwrap(), 6);
        let err = sum_counters(&cursor, &[u64::MAX, 1]).unwrap_err();
        assert!(err.to_string().contains("Counter overflow"), "{err}");
    }
}
