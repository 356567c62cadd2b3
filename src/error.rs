use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Language not supported: {0}")]
    UnsupportedLanguage(String),

    #[error("Extraction failed for {path}: {reason}")]
    ExtractionFailure { path: String, reason: String },

    #[error("Cache IO error at {}: {source}", path.display())]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl ArchError {
    pub fn extraction(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ArchError::ExtractionFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn cache_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchError::CacheIo {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchError>;
