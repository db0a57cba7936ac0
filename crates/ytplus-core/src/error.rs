//! Error types for ytplus Core

use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Setup errors
    #[error("No element was found: {0:?}")]
    ElementNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("YouTube Iframe API failed to load: {0}")]
    ApiLoadFailed(String),

    // Widget errors
    #[error("Failed to create widget: {0}")]
    WidgetCreation(String),

    #[error("Unrecognized state change event: {0}")]
    UnrecognizedState(i32),

    #[error("Unknown error code: {0}")]
    UnknownErrorCode(i32),

    // Command errors
    #[error("Unsupported playback rate: {0}")]
    InvalidPlaybackRate(f64),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if this error tears the player down
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ApiLoadFailed(_) | Error::UnknownErrorCode(_))
    }

    /// Returns the error code carried by error events
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::ElementNotFound(_) => "ELEMENT_NOT_FOUND",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::ApiLoadFailed(_) => "FAILED_TO_LOAD",
            Error::WidgetCreation(_) => "WIDGET_CREATION",
            Error::UnrecognizedState(_) => "UNRECOGNIZED_STATE_CHANGE",
            Error::UnknownErrorCode(_) => "UNKNOWN_ERROR_CODE",
            Error::InvalidPlaybackRate(_) => "INVALID_PLAYBACK_RATE",
            Error::Json(_) => "JSON",
        }
    }
}
