//! Centralized error types for Meteoros.
//!
//! Every error carries two renderings:
//! - `Display` with full context, for logs
//! - `user_message()` with a short, non-technical line for the UI

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Validation(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Notification(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// User-correctable input errors, shown inline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("City name is empty")]
    EmptyCityName,

    #[error("Note text is empty")]
    EmptyNoteText,

    #[error("Invalid coordinates: {latitude}, {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::EmptyCityName => "Please enter a city name",
            ValidationError::EmptyNoteText => "Please write something in your note",
            ValidationError::InvalidCoordinates { .. } => "Invalid location coordinates",
        }
    }
}

/// Transport-level failures (no HTTP status was received).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Weather provider errors.
///
/// The UI does not tell "city not found" apart from "network down": every
/// variant renders the same user message.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Server returned status {status}")]
    ServerError { status: u16 },

    #[error("Failed to decode response: {0}")]
    DecodeError(String),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        "City not found. Please try again."
    }

    /// HTTP status for `ServerError`, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            WeatherError::ServerError { status } => Some(*status),
            _ => None,
        }
    }
}

/// Key-value store errors. Never shown to the user; callers log and fall back.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to open store: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Failed to encode value for key {key}: {message}")]
    Encode { key: String, message: String },
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::Open(_) => "Unable to access local data. Try restarting the app.",
            StorageError::Query(_) => "A data operation failed. Please try again.",
            StorageError::Encode { .. } => "Failed to save local data.",
        }
    }
}

/// OS notification facility errors. Logged, never surfaced.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification request rejected: {0}")]
    Rejected(String),

    #[error("Notification service unavailable")]
    Unavailable,
}

impl NotificationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NotificationError::Rejected(_) => "Could not schedule the notification.",
            NotificationError::Unavailable => "Notifications are not available.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_decode() || self.is_body() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_storage_error(self) -> StorageError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_storage_error(self) -> StorageError {
        match &self {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::CannotOpen =>
            {
                StorageError::Open(self.to_string())
            }
            _ => StorageError::Query(self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_errors_share_one_user_message() {
        let errors = [
            WeatherError::InvalidRequest("bad".into()),
            WeatherError::ServerError { status: 404 },
            WeatherError::DecodeError("missing field".into()),
            WeatherError::Network(NetworkError::Timeout),
        ];

        for err in &errors {
            assert_eq!(err.user_message(), "City not found. Please try again.");
        }
    }

    #[test]
    fn test_app_error_conversion() {
        let app_err: AppError = ValidationError::EmptyCityName.into();
        assert!(matches!(
            app_err,
            AppError::Validation(ValidationError::EmptyCityName)
        ));
    }

    #[test]
    fn test_user_message_propagation() {
        let app_err = AppError::Validation(ValidationError::EmptyCityName);
        assert_eq!(app_err.user_message(), "Please enter a city name");

        let app_err = AppError::Weather(WeatherError::ServerError { status: 500 });
        assert_eq!(app_err.user_message(), "City not found. Please try again.");
    }

    #[test]
    fn test_server_error_status() {
        assert_eq!(WeatherError::ServerError { status: 404 }.status(), Some(404));
        assert_eq!(WeatherError::DecodeError("x".into()).status(), None);
    }

    #[test]
    fn test_rusqlite_error_maps_to_query() {
        let err = rusqlite::Error::QueryReturnedNoRows.into_storage_error();
        assert!(matches!(err, StorageError::Query(_)));
    }
}
