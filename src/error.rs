use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum Ko2PathwayError {
    #[error("invalid KO identifier: {0}")]
    InvalidKo(String),

    #[error("invalid pathway identifier: {0}")]
    InvalidPathway(String),

    #[error("input file not found: {0}")]
    #[diagnostic(help("pass the gene-to-KO table with --input"))]
    InputNotFound(PathBuf),

    #[error("failed to read input file {path}: {message}")]
    InputRead { path: PathBuf, message: String },

    #[error("failed to read exclusion file {path}: {message}")]
    ExclusionRead { path: PathBuf, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("KEGG request failed: {0}")]
    KeggHttp(String),

    #[error("KEGG returned status {status}: {message}")]
    KeggStatus { status: u16, message: String },

    #[error("unexpected KEGG response: {0}")]
    KeggResponse(String),

    #[error("failed to read pathway cache: {0}")]
    CacheRead(String),

    #[error("failed to write pathway cache: {0}")]
    CacheWrite(String),

    #[error("failed to write summary {path}: {message}")]
    OutputWrite { path: PathBuf, message: String },

    #[error("failed to render chart: {0}")]
    Plot(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl Ko2PathwayError {
    /// Errors caused by a missing or unusable user-supplied input.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Ko2PathwayError::InputNotFound(_)
                | Ko2PathwayError::InputRead { .. }
                | Ko2PathwayError::ExclusionRead { .. }
                | Ko2PathwayError::ConfigRead(_)
                | Ko2PathwayError::ConfigParse(_)
        )
    }
}
