use thiserror::Error;

/// Top-level error type for the Murmur system.
///
/// Each variant wraps a subsystem-specific failure. Subsystem crates build
/// these directly so the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MurmurError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Focus tracking error: {0}")]
    Focus(String),

    #[error("Recording error: {0}")]
    Recording(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Injection error: {0}")]
    Injection(String),

    #[error("Overlay error: {0}")]
    Overlay(String),

    #[error("Dictation error: {0}")]
    Dictation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for MurmurError {
    fn from(err: toml::de::Error) -> Self {
        MurmurError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MurmurError {
    fn from(err: toml::ser::Error) -> Self {
        MurmurError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for MurmurError {
    fn from(err: serde_json::Error) -> Self {
        MurmurError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Murmur operations.
pub type Result<T> = std::result::Result<T, MurmurError>;
