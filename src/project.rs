//! The set of source files tracked by the analysed project.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::error::{DotcovError, Result};

/// A tracked source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputFile {
    /// Absolute path.
    pub path: String,
    /// Content-language tag, `None` when the language is not recognised.
    pub language: Option<String>,
}

/// Lookup of tracked source files by absolute path.
pub trait TrackedFiles {
    fn input_file(&self, absolute_path: &str) -> Option<&InputFile>;
}

/// Language tag for a source file extension.
pub fn language_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_lowercase().as_str() {
        "cs" => Some("cs"),
        "vb" => Some("vbnet"),
        "fs" | "fsi" | "fsx" => Some("fs"),
        _ => None,
    }
}

/// In-memory index of tracked files.
#[derive(Debug, Default, Clone)]
pub struct ProjectFiles {
    files: HashMap<String, InputFile>,
}

impl ProjectFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, language: Option<&str>) {
        let path = path.into();
        self.files.insert(
            path.clone(),
            InputFile {
                path,
                language: language.map(str::to_string),
            },
        );
    }

    /// Index every regular file under `root`, tagging each by extension.
    pub fn scan(root: &Path) -> Result<Self> {
        let root = std::fs::canonicalize(root).map_err(|e| DotcovError::io(root, e))?;
        let pattern = root.join("**").join("*");
        let entries = glob::glob(&pattern.to_string_lossy())
            .map_err(|e| DotcovError::Pattern(e.to_string()))?;

        let mut project = Self::new();
        for path in entries.flatten().filter(|p| p.is_file()) {
            let language = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(language_for_extension);
            project.insert(path.to_string_lossy(), language);
        }
        Ok(project)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl TrackedFiles for ProjectFiles {
    fn input_file(&self, absolute_path: &str) -> Option<&InputFile> {
        self.files.get(absolute_path)
    }
}
