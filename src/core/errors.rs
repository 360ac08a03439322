use std::path::PathBuf;

use thiserror::Error;

/// Fatal problems detected before the synthesis loop starts.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid embedding store: {0}")]
    InvalidStore(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
    #[error("failed to write dataset {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SetupError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SetupError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        SetupError::Json {
            path: path.into(),
            source,
        }
    }
}

/// A generation or embedding call failed. The loop logs it and skips the item.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request to {provider} failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("unexpected response from {provider}: {message}")]
    Shape {
        provider: &'static str,
        message: String,
    },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("vector search failed: {0}")]
    Search(String),
}

impl GenerationError {
    pub fn transport<E: std::fmt::Display>(provider: &'static str, err: E) -> Self {
        GenerationError::Transport {
            provider,
            message: err.to_string(),
        }
    }

    pub fn shape(provider: &'static str, message: impl Into<String>) -> Self {
        GenerationError::Shape {
            provider,
            message: message.into(),
        }
    }
}

/// Model output did not match the expected structured format.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("output is not a JSON array of strings: {0}")]
    NotAnArray(String),
    #[error("expected {expected} questions, got {actual}")]
    WrongCount { expected: usize, actual: usize },
}
