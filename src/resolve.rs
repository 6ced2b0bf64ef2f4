//! Expansion of report path expressions into concrete files.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{DotcovError, Result};

/// Turns a possibly wildcarded path expression into the report files it
/// matches on disk.
pub trait FileResolver {
    fn resolve(&self, pattern: &str, base_dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Resolver backed by `glob` patterns (`*`, `?`, `**`, `[...]`).
///
/// Relative expressions are joined to the base directory. Only regular files
/// are returned, sorted and without duplicates.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobResolver;

impl FileResolver for GlobResolver {
    fn resolve(&self, pattern: &str, base_dir: &Path) -> Result<Vec<PathBuf>> {
        let full_pattern = if Path::new(pattern).is_absolute() {
            PathBuf::from(pattern)
        } else {
            base_dir.join(pattern)
        };
        let full_pattern_str = full_pattern.to_string_lossy();

        let entries = glob::glob(&full_pattern_str)
            .map_err(|e| DotcovError::Pattern(format!("{pattern}: {e}")))?;

        let mut files = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => debug!("Skipping unreadable path while resolving {}: {}", pattern, e),
            }
        }
        files.sort();
        files.dedup();

        if files.is_empty() {
            warn!("No report file found for the pattern {}", full_pattern_str);
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_wildcard() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/TestResults")).unwrap();
        std::fs::create_dir_all(dir.path().join("b/TestResults")).unwrap();
        std::fs::write(dir.path().join("a/TestResults/one.trx"), "").unwrap();
        std::fs::write(dir.path().join("b/TestResults/two.trx"), "").unwrap();
        std::fs::write(dir.path().join("b/TestResults/other.xml"), "").unwrap();

        let files = GlobResolver.resolve("**/TestResults/*.trx", dir.path()).unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("a/TestResults/one.trx"),
                dir.path().join("b/TestResults/two.trx"),
            ]
        );
    }

    #[test]
    fn test_resolve_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("opencover.xml");
        std::fs::write(&report, "").unwrap();

        let files = GlobResolver
            .resolve(&report.to_string_lossy(), Path::new("/unrelated"))
            .unwrap();
        assert_eq!(files, vec![report]);
    }

    #[test]
    fn test_resolve_no_match_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("reports.xml")).unwrap();
        assert!(GlobResolver.resolve("*.xml", dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let err = GlobResolver.resolve("[", dir.path()).unwrap_err();
        assert!(matches!(err, DotcovError::Pattern(_)));
    }
}
