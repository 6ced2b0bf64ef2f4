use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DotcovError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}{}: {message}", .path.display(), line_suffix(.line))]
    Parse {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("Invalid report path pattern: {0}")]
    Pattern(String),

    #[error("Unknown report format: {}", .0.display())]
    UnknownFormat(PathBuf),
}

impl DotcovError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DotcovError::Io {
            path: path.into(),
            source,
        }
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" (line {line})"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, DotcovError>;
