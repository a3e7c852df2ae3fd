//! Error types for the NAAM client

use thiserror::Error;

use crate::service::validation::ValidationErrors;

pub type Result<T> = std::result::Result<T, NaamError>;

#[derive(Error, Debug)]
pub enum NaamError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
}

impl NaamError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            NaamError::InvalidInput(_) | NaamError::Validation(_) => 3,
            NaamError::Api(e) if e.is_auth() => 2,
            NaamError::Session(SessionError::Invalidated(_)) => 2,
            NaamError::Api(_) => 1,
            NaamError::Config(_) => 1,
            NaamError::Session(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session data is corrupt: {0}")]
    Corrupt(String),

    #[error("OS keyring not accessible: {0}")]
    KeyringUnavailable(String),

    #[error("Keyring operation failed: {0}")]
    Keyring(String),

    #[error("Session was invalidated: {0}")]
    Invalidated(String),
}

/// Failures at the HTTP boundary.
///
/// Payloads are plain strings so the error stays `Clone` and can travel
/// inside `ApiResult` values and broadcast events.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Upload failed: {0}")]
    Upload(String),
}

impl ApiError {
    /// True for failures that require the user to log in again
    pub fn is_auth(&self) -> bool {
        match self {
            ApiError::Unauthorized(_) | ApiError::NotAuthenticated => true,
            ApiError::Status { code, .. } => *code == 401 || *code == 403,
            _ => false,
        }
    }

    /// Message suitable for a user-facing alert
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Network error. Please try again.".to_string(),
            ApiError::Rejected(message) if !message.is_empty() => message.clone(),
            ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Unauthorized(_) | ApiError::NotAuthenticated => {
                "Your session has expired. Please log in again.".to_string()
            }
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ApiError::Decode(error.to_string())
        } else if let Some(status) = error.status() {
            ApiError::Status {
                code: status.as_u16(),
                message: error.to_string(),
            }
        } else {
            ApiError::Network(error.to_string())
        }
    }
}
