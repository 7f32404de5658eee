//! Error types for the domyn_core library.

use std::fmt;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by the remote document backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteError {
    /// Backend error code, e.g. `auth/user-not-found`
    pub code: String,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// Core error type for domyn_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// User input rejected before any mutation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Remote document store failure
    #[error("Remote error: {0}")]
    Remote(RemoteError),

    /// No authenticated user is available for a remote operation
    #[error("User not authenticated")]
    NotAuthenticated,

    /// Aggregate invariant violated (negative completion time, bad intensity)
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// State management error
    #[error("State error: {0}")]
    State(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<RemoteError> for Error {
    fn from(err: RemoteError) -> Self {
        Error::Remote(err)
    }
}

impl Error {
    /// Text suitable for an alert shown to the user.
    ///
    /// Known backend codes get a fixed message; validation and invariant
    /// errors already carry user-facing text.
    pub fn user_message(&self) -> String {
        match self {
            Error::Remote(remote) => match remote.code.as_str() {
                "auth/invalid-email" => "Invalid email address.".into(),
                "auth/user-not-found" => "No account found with this email.".into(),
                "auth/wrong-password" => "Incorrect password.".into(),
                _ => "Something went wrong. Please try again.".into(),
            },
            Error::NotAuthenticated => "User not authenticated.".into(),
            Error::Validation(msg) | Error::Invariant(msg) | Error::State(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
