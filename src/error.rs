use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for the code-inspector library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Configuration validation or load error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// The completion endpoint rejected the credentials.
    #[error("Authentication with the completion endpoint failed (check OPENAI_API_KEY)")]
    Auth,

    /// Non-success HTTP status from the completion endpoint.
    #[error("Completion endpoint returned status {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body excerpt or status text
        message: String,
    },

    /// Transport-level HTTP failure (connect, timeout, body read).
    #[error("HTTP transport error: {message}")]
    Http {
        /// Error message
        message: String,
    },

    /// Response body did not have the expected completion shape.
    #[error("Malformed completion response: {message}")]
    MalformedResponse {
        /// What was missing or wrong
        message: String,
    },

    /// YAML serialization or deserialization error.
    #[error("YAML error: {message}")]
    Yaml {
        /// Error message
        message: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },

    /// Input source is neither a file nor a directory.
    #[error("Invalid source: '{path}' is neither a file nor a directory")]
    InvalidSource {
        /// The offending source path
        path: PathBuf,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an API status error.
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a malformed-response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Creates an invalid-source error.
    #[must_use]
    pub fn invalid_source(path: impl Into<PathBuf>) -> Self {
        Self::InvalidSource { path: path.into() }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true if this error came from the completion endpoint or transport.
    #[must_use]
    pub const fn is_api(&self) -> bool {
        matches!(
            self,
            Self::Auth | Self::Api { .. } | Self::Http { .. } | Self::MalformedResponse { .. }
        )
    }
}

// Conversion implementations for convenient error handling
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Http {
            message: e.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}
