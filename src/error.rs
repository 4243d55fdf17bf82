//! Error types and handling for the `skycast` update loop

use thiserror::Error;

/// Main error type for the `skycast` crate
#[derive(Error, Debug)]
pub enum SkycastError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Errors talking to the forecast API
    #[error("API error: {message}")]
    Api { message: String },

    /// The API rejected the configured credential (HTTP 401)
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The response body could not be understood
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl SkycastError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new authorization error
    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// True when the failure cannot be recovered by waiting and retrying.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SkycastError::Unauthorized { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SkycastError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            SkycastError::Api { .. } => {
                "Unable to reach the weather service. Please check your internet connection."
                    .to_string()
            }
            SkycastError::Unauthorized { .. } => {
                "The weather service rejected the API credential. Please update it.".to_string()
            }
            SkycastError::Parse { message } => {
                format!("Unexpected weather data: {message}")
            }
            SkycastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
