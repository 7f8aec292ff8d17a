//! Error types for tracker operations
//!
//! Errors are classified by who can act on them:
//! - User-facing: capacity limits, invalid schedules, rejected edits
//! - Service: the assistant backend failed or is misconfigured
//! - Internal: the local store or config file could not be read/written
//!
//! Operating on an id that is not in the expected collection is never an
//! error; those calls are silent no-ops.

use thiserror::Error;

use crate::store::StoreError;

/// Error types surfaced by the tracker
#[derive(Debug, Error)]
pub enum TrackerError {
    // User-facing
    #[error("You can only have {limit} top tasks. Demote one first.")]
    CapacityExceeded { limit: usize },

    #[error("Please set a valid time for the task first (got {0:?})")]
    InvalidSchedule(String),

    #[error("Invalid task update: {0}")]
    InvalidUpdate(String),

    // Assistant
    #[error("An error occurred while communicating with the AI service: {0}")]
    ExternalService(String),

    #[error("Assistant configuration error: {0}")]
    AssistantConfig(String),

    // Internal
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TrackerError {
    /// Returns true if the message should be shown to the user verbatim
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            TrackerError::CapacityExceeded { .. }
                | TrackerError::InvalidSchedule(_)
                | TrackerError::InvalidUpdate(_)
                | TrackerError::ExternalService(_)
        )
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            TrackerError::CapacityExceeded { .. } => {
                "Demote or complete one of today's priorities first."
            }
            TrackerError::InvalidSchedule(_) => "Pick a time in 24-hour HH:MM format.",
            TrackerError::InvalidUpdate(_) => "Check the edited value and try again.",
            TrackerError::ExternalService(_) => "Try the request again in a moment.",
            TrackerError::AssistantConfig(_) => {
                "Set the assistant API key environment variable and restart."
            }
            TrackerError::Store(_) => "Check file permissions and disk space.",
            TrackerError::Config(_) => "Check your configuration in ~/.momentum/config.json",
        }
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Store(StoreError::Serialization(err))
    }
}

/// Serializable error representation for the presentation layer
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub message: String,
    pub error_type: ErrorType,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    User,
    Service,
    Internal,
}

impl From<&TrackerError> for ErrorPayload {
    fn from(err: &TrackerError) -> Self {
        let error_type = match err {
            TrackerError::ExternalService(_) | TrackerError::AssistantConfig(_) => {
                ErrorType::Service
            }
            TrackerError::Store(_) | TrackerError::Config(_) => ErrorType::Internal,
            _ => ErrorType::User,
        };

        ErrorPayload {
            message: err.to_string(),
            error_type,
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message_names_limit() {
        let err = TrackerError::CapacityExceeded { limit: 3 };
        assert_eq!(
            err.to_string(),
            "You can only have 3 top tasks. Demote one first."
        );
        assert!(err.is_user_facing());
    }

    #[test]
    fn test_payload_classifies_errors() {
        let payload = ErrorPayload::from(&TrackerError::ExternalService("500".into()));
        assert_eq!(payload.error_type, ErrorType::Service);

        let payload = ErrorPayload::from(&TrackerError::Store(StoreError::HomeDirNotFound));
        assert_eq!(payload.error_type, ErrorType::Internal);
        assert_eq!(payload.recovery_suggestion, "Check file permissions and disk space.");

        let payload = ErrorPayload::from(&TrackerError::InvalidSchedule("25:00".into()));
        assert_eq!(payload.error_type, ErrorType::User);
    }

    #[test]
    fn test_payload_serializes_camel_case() {
        let payload = ErrorPayload::from(&TrackerError::CapacityExceeded { limit: 3 });
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["errorType"], "user");
        assert!(json["recoverySuggestion"].is_string());
    }
}
