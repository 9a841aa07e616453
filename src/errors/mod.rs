//! Error handling module for the console core.
//!
//! Provides the centralized error taxonomy with mapping from backend HTTP
//! statuses and decoding of backend error bodies.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const AUTHENTICATION_FAILED: &str = "AUTHENTICATION_FAILED";
    pub const AUTHORIZATION_EXPIRED: &str = "AUTHORIZATION_EXPIRED";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const GEO_ACQUISITION_FAILED: &str = "GEO_ACQUISITION_FAILED";
    pub const GEO_UPDATE_FAILED: &str = "GEO_UPDATE_FAILED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const REQUEST_FAILED: &str = "REQUEST_FAILED";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const OFFLINE: &str = "OFFLINE";
}

/// Console error type.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleError {
    /// Bad credentials at login
    Authentication(String),
    /// The backend no longer accepts the credential; the session is gone
    AuthorizationExpired,
    /// The active unit lacks the right to perform the action
    PermissionDenied(String),
    /// Client-side, pre-submission field validation
    Validation { field: String, message: String },
    /// Device geolocation denied, unavailable or timed out
    GeoAcquisition(String),
    /// Persisting captured coordinates failed
    GeoUpdate(String),
    /// Entity absent
    NotFound(String),
    /// Fallback for every other failed request
    RequestFailed {
        status: Option<u16>,
        message: String,
    },
    /// Durable client state could not be read or written
    Storage(String),
    /// A networked operation was attempted without a configured backend
    Offline(String),
}

impl ConsoleError {
    /// Build a validation error for a named field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConsoleError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Map a non-success backend status and its body to an error.
    ///
    /// 401 and 403 are classified here but their global side effects are
    /// applied by the gateway, not by this mapping.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = decode_message(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

        match status {
            StatusCode::UNAUTHORIZED => ConsoleError::AuthorizationExpired,
            StatusCode::FORBIDDEN => ConsoleError::PermissionDenied(message),
            StatusCode::NOT_FOUND => ConsoleError::NotFound(message),
            _ => ConsoleError::RequestFailed {
                status: Some(status.as_u16()),
                message,
            },
        }
    }

    /// Get the HTTP status this error corresponds to, if any.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            ConsoleError::Authentication(_) | ConsoleError::AuthorizationExpired => {
                Some(StatusCode::UNAUTHORIZED)
            }
            ConsoleError::PermissionDenied(_) => Some(StatusCode::FORBIDDEN),
            ConsoleError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            ConsoleError::RequestFailed { status, .. } => {
                status.and_then(|s| StatusCode::from_u16(s).ok())
            }
            ConsoleError::GeoUpdate(_)
            | ConsoleError::Validation { .. }
            | ConsoleError::GeoAcquisition(_)
            | ConsoleError::Storage(_)
            | ConsoleError::Offline(_) => None,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConsoleError::Authentication(_) => codes::AUTHENTICATION_FAILED,
            ConsoleError::AuthorizationExpired => codes::AUTHORIZATION_EXPIRED,
            ConsoleError::PermissionDenied(_) => codes::PERMISSION_DENIED,
            ConsoleError::Validation { .. } => codes::VALIDATION_ERROR,
            ConsoleError::GeoAcquisition(_) => codes::GEO_ACQUISITION_FAILED,
            ConsoleError::GeoUpdate(_) => codes::GEO_UPDATE_FAILED,
            ConsoleError::NotFound(_) => codes::NOT_FOUND,
            ConsoleError::RequestFailed { .. } => codes::REQUEST_FAILED,
            ConsoleError::Storage(_) => codes::STORAGE_ERROR,
            ConsoleError::Offline(_) => codes::OFFLINE,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            ConsoleError::Authentication(msg) => msg.clone(),
            ConsoleError::AuthorizationExpired => "Session expired, please sign in again".to_string(),
            ConsoleError::PermissionDenied(msg) => msg.clone(),
            ConsoleError::Validation { field, message } => format!("{}: {}", field, message),
            ConsoleError::GeoAcquisition(msg) => msg.clone(),
            ConsoleError::GeoUpdate(msg) => msg.clone(),
            ConsoleError::NotFound(msg) => msg.clone(),
            ConsoleError::RequestFailed { message, .. } => message.clone(),
            ConsoleError::Storage(msg) => msg.clone(),
            ConsoleError::Offline(msg) => msg.clone(),
        }
    }

    /// Whether the error ended the session.
    pub fn is_session_ending(&self) -> bool {
        matches!(self, ConsoleError::AuthorizationExpired)
    }
}

impl std::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for ConsoleError {}

impl From<sqlx::Error> for ConsoleError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Storage error: {:?}", err);
        ConsoleError::Storage(format!("Storage error: {}", err))
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Request error: {:?}", err);
        ConsoleError::RequestFailed {
            status: err.status().map(|s| s.as_u16()),
            message: format!("Request error: {}", err),
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        ConsoleError::RequestFailed {
            status: None,
            message: format!("JSON error: {}", err),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ConsoleError>;

/// Error details in the backend's error envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

/// Backend error bodies come in two shapes: a flat `{"message"}` object or
/// an envelope with a nested `error` object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Envelope { error: ErrorDetails },
    Flat { message: String },
}

/// Extract the human-readable message from a backend error body.
pub(crate) fn decode_message(body: &str) -> Option<String> {
    let message = match serde_json::from_str::<ErrorBody>(body).ok()? {
        ErrorBody::Envelope { error } => error.message,
        ErrorBody::Flat { message } => message,
    };
    Some(message).filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_expired() {
        let err = ConsoleError::from_status(StatusCode::UNAUTHORIZED, "");
        assert_eq!(err, ConsoleError::AuthorizationExpired);
        assert!(err.is_session_ending());
    }

    #[test]
    fn test_forbidden_keeps_backend_message() {
        let err = ConsoleError::from_status(
            StatusCode::FORBIDDEN,
            r#"{"message":"Not allowed for this unit"}"#,
        );
        assert_eq!(
            err,
            ConsoleError::PermissionDenied("Not allowed for this unit".to_string())
        );
        assert!(!err.is_session_ending());
    }

    #[test]
    fn test_envelope_body_is_decoded() {
        let err = ConsoleError::from_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"success":false,"error":{"code":"VALIDATION_ERROR","message":"bad tier"}}"#,
        );
        assert_eq!(
            err,
            ConsoleError::RequestFailed {
                status: Some(422),
                message: "bad tier".to_string()
            }
        );
    }

    #[test]
    fn test_unreadable_body_falls_back_to_reason() {
        let err = ConsoleError::from_status(StatusCode::NOT_FOUND, "<html>");
        assert_eq!(err, ConsoleError::NotFound("Not Found".to_string()));
        assert_eq!(err.status_code(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_display_includes_code() {
        let err = ConsoleError::validation("name", "Name is required");
        assert_eq!(err.to_string(), "VALIDATION_ERROR: name: Name is required");
    }
}
