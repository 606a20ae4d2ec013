//! Error types for handsign.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Landmark source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid replay script at line {line}: {reason}")]
    InvalidScript { line: usize, reason: String },

    #[error("Invalid duration '{0}' (expected e.g. 800, 800ms, 0.8s)")]
    InvalidDuration(String),

    #[error("Session is not started")]
    SessionInactive,

    #[error("Unknown gesture '{0}'")]
    UnknownGesture(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
