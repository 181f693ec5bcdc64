//! Error types shared across the ingestion pipeline

use std::path::PathBuf;
use thiserror::Error;

/// A failure confined to a single source document.
///
/// These never abort a batch: the loader records them next to the slug and
/// keeps going with the remaining documents.
#[derive(Error, Debug)]
pub enum PostError {
    #[error("malformed front-matter: {reason}")]
    MalformedFrontmatter { reason: String },

    #[error("invalid date in front-matter: {value:?}")]
    InvalidDate { value: String },

    #[error("render error: {0}")]
    Render(String),

    #[error("no index file found in {}", .0.display())]
    MissingSource(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PostError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        PostError::MalformedFrontmatter {
            reason: reason.into(),
        }
    }
}

/// Batch-fatal ingestion failure
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("cannot read posts directory {}: {source}", .path.display())]
    SourceDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Query-time lookup failure
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LookupError {
    #[error("post not found: {0}")]
    NotFound(String),
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unknown timezone: {0}")]
    Timezone(String),

    #[error("words_per_minute must be greater than zero")]
    ReadingSpeed,
}
