use std::path::PathBuf;
use thiserror::Error;

/// Roster could not be read. Fatal at startup.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read roster {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed roster: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("embedding model unavailable: {0}")]
    Unavailable(String),

    #[error("embedding service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed embedding response: {0}")]
    Malformed(String),

    #[error("embedding has dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding request timed out")]
    Timeout,
}

impl From<reqwest::Error> for EncodingError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EncodingError::Timeout
        } else if e.is_decode() {
            EncodingError::Malformed(e.to_string())
        } else {
            EncodingError::Unavailable(e.to_string())
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum IndexError {
    #[error("vector has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Failure of the hosted text-generation call. Always recovered by the composer.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("rate limited by text generation service")]
    RateLimited,

    #[error("text generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("text generation timed out")]
    Timeout,

    #[error("text generation request failed: {0}")]
    Transport(String),

    #[error("text generation returned no content")]
    EmptyResponse,
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Timeout
        } else {
            GenerationError::Transport(e.to_string())
        }
    }
}

/// Top-level error surfaced by the orchestrator.
#[derive(Error, Debug)]
pub enum StaffError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("index holds {vectors} vectors for {records} records")]
    CountMismatch { records: usize, vectors: usize },
}

impl StaffError {
    /// HTTP status code this error maps to at the request boundary.
    pub fn status(&self) -> u16 {
        match self {
            StaffError::InvalidArgument(_) => 400,
            StaffError::Encoding(_) => 502,
            StaffError::Load(_) | StaffError::Index(_) | StaffError::CountMismatch { .. } => 500,
        }
    }
}

pub type StaffResult<T> = Result<T, StaffError>;
