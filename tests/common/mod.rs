#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;

/// Write `content` to `name` under the temp dir, creating parent directories.
pub fn write_report(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// A minimal TRX document with the given inner elements.
pub fn trx(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<TestRun id="2f5b7e6d-1c3a-4a7e-9d0c-5b8e2d1f4a6c" name="build@agent 2016-01-01 10:00:00" xmlns="http://microsoft.com/schemas/VisualStudio/TeamTest/2010">
{body}
</TestRun>"#
    )
}
