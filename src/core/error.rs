use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for aicmd
#[derive(Error, Debug)]
pub enum AppError {
    /// The API answered with an error status or an unusable body
    #[error("API error: {0}")]
    Api(String),

    /// Configuration file could not be read or written
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file exists but is not valid TOML for our schema
    #[error("Malformed configuration file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// User input errors
    #[error("Input error: {0}")]
    Input(String),

    /// The model produced no usable command
    #[error("The model returned an empty command")]
    EmptyResult,

    /// Generated command exited non-zero or could not be launched
    #[error("Execution error: {0}")]
    Execution(String),

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(String),
}

impl AppError {
    /// Whether this error came from talking to the model endpoint.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::Api(_) | AppError::Network(_) | AppError::Serialization(_)
        )
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            AppError::Network(format!("Connection failed: {}", err))
        } else if err.is_status() {
            AppError::Api(format!("API returned error status: {}", err))
        } else {
            AppError::Network(format!("Request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(err: toml::ser::Error) -> Self {
        AppError::Serialization(format!("TOML error: {}", err))
    }
}
