use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DotcovError, Result};

/// Settings for one import run, usually read from `dotcov.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Content-language tag a tracked file must carry for its coverage to
    /// be imported.
    pub language: String,
    /// Directory that relative report path expressions are resolved against.
    pub base_dir: PathBuf,
    /// Import coverage under the integration-test metrics.
    pub integration_tests: bool,
    pub coverage: CoverageReports,
    pub tests: TestReports,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "cs".to_string(),
            base_dir: PathBuf::from("."),
            integration_tests: false,
            coverage: CoverageReports::default(),
            tests: TestReports::default(),
        }
    }
}

/// Report path expressions per coverage format. Each entry may contain
/// wildcards.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverageReports {
    pub opencover: Vec<String>,
    pub ncover3: Vec<String>,
    pub visual_studio: Vec<String>,
}

/// Report path expressions per test-results format.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestReports {
    pub visual_studio: Vec<String>,
    pub nunit: Vec<String>,
    pub xunit: Vec<String>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| DotcovError::io(path, e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| DotcovError::Settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.language.trim().is_empty() {
            return Err(DotcovError::Settings("language must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.language, "cs");
        assert_eq!(settings.base_dir, PathBuf::from("."));
        assert!(!settings.integration_tests);
        assert!(settings.coverage.opencover.is_empty());
        assert!(settings.tests.visual_studio.is_empty());
    }

    #[test]
    fn test_full_document() {
        let settings = Settings::from_toml(
            r#"
language = "vbnet"
base_dir = "/build"
integration_tests = true

[coverage]
opencover = ["**/opencover.xml"]
visual_studio = ["TestResults/*.coveragexml"]

[tests]
visual_studio = ["TestResults/*.trx"]
xunit = ["xunit.xml"]
"#,
        )
        .unwrap();
        assert_eq!(settings.language, "vbnet");
        assert_eq!(settings.base_dir, PathBuf::from("/build"));
        assert!(settings.integration_tests);
        assert_eq!(settings.coverage.opencover, vec!["**/opencover.xml"]);
        assert!(settings.coverage.ncover3.is_empty());
        assert_eq!(settings.tests.xunit, vec!["xunit.xml"]);
    }

    #[test]
    fn test_rejects_unknown_keys_and_empty_language() {
        assert!(matches!(
            Settings::from_toml("[coverage]\nlcov = []"),
            Err(DotcovError::Settings(_))
        ));
        assert!(Settings::from_toml("language = \"\"").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load(Path::new("/nonexistent/dotcov.toml")).unwrap_err();
        assert!(matches!(err, DotcovError::Io { .. }));
    }
}
