//! Error types for Mimi

use thiserror::Error;

/// The main error type for Mimi operations
#[derive(Debug, Error)]
pub enum MimiError {
    /// Missing or invalid local configuration (e.g. no credential for a new job)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network failure or non-success status while creating a job
    #[error("Failed to start job: {message}")]
    SubmissionTransport {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    /// Job creation answered with success but without a usable job id
    #[error("Unexpected job submission response: {message}")]
    SubmissionProtocol {
        message: String,
        body: Option<String>,
    },

    /// Network failure or non-success status while opening or reading a stream
    #[error("Stream request failed: {message}")]
    StreamTransport {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    /// A single stream line could not be decoded
    #[error("Undecodable stream record ({reason}): {line}")]
    RecordDecode { line: String, reason: String },

    /// The server emitted an error event and the session was told to stop on it
    #[error("Server reported an error: {0}")]
    ServerReported(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),
}

impl MimiError {
    /// HTTP status attached to a transport error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            MimiError::SubmissionTransport { status, .. }
            | MimiError::StreamTransport { status, .. } => *status,
            _ => None,
        }
    }

    /// Response body captured for diagnostics, if any
    pub fn response_body(&self) -> Option<&str> {
        match self {
            MimiError::SubmissionTransport { body, .. }
            | MimiError::SubmissionProtocol { body, .. }
            | MimiError::StreamTransport { body, .. } => {
                body.as_deref().filter(|b| !b.trim().is_empty())
            }
            _ => None,
        }
    }
}

/// Result type alias for Mimi operations
pub type Result<T> = std::result::Result<T, MimiError>;

impl From<toml::de::Error> for MimiError {
    fn from(err: toml::de::Error) -> Self {
        MimiError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for MimiError {
    fn from(err: toml::ser::Error) -> Self {
        MimiError::TomlSerError(err.to_string())
    }
}
