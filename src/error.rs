//! Error types.
//!
//! Setup failures (`ConfigError`, discovery) end the process. A `FileError`
//! only ends the work on the file it names.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("invalid regex in `extract.pattern`")]
    Regex(#[from] regex::Error),

    #[error("Config validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    PrettyPrinter(#[from] PrettyPrintError),
}

/// File discovery errors
#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("invalid glob pattern `{0}`")]
    Pattern(String, #[source] glob::PatternError),

    #[error("no files matched {0:?}")]
    NoFiles(Vec<String>),

    #[error("no patterns given: pass paths or set `include` in the config file")]
    NoPatterns,
}

/// Failures of the external pretty-printer call.
#[derive(Debug, Error)]
pub enum PrettyPrintError {
    #[error("pretty-printer `{0}` not found on PATH")]
    NotFound(String, #[source] which::Error),

    #[error("failed to run pretty-printer `{0}`")]
    Spawn(String, #[source] std::io::Error),

    #[error("pretty-printer `{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("pretty-printer `{0}` produced non UTF-8 output")]
    Utf8(String, #[source] std::string::FromUtf8Error),
}

/// Per-file failures. Logged at the batch boundary, never propagated past it.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("cannot read `{0}`")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("cannot write `{0}`")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("could not gather the component template for `{0}`")]
    ExtractionMiss(PathBuf),

    #[error("pretty-printing `{0}` failed")]
    PrettyPrint(PathBuf, #[source] PrettyPrintError),
}

impl FileError {
    /// Misses are expected in a mixed batch and only warrant a warning.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FileError::ExtractionMiss(_))
    }
}
