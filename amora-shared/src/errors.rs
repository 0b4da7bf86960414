use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{domain}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Auth errors
/// - E2xxx: User/profile errors
/// - E3xxx: Matching errors
/// - E4xxx: Chat errors
/// - E5xxx: Event errors
/// - E6xxx: Channel errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    RateLimited,
    BadRequest,
    PayloadTooLarge,
    Conflict,

    // Auth (E1xxx)
    InvalidCredentials,
    EmailAlreadyExists,
    TokenExpired,
    TokenInvalid,
    PasswordTooWeak,
    VerificationCodeExpired,
    VerificationCodeInvalid,
    ResetCodeExpired,
    ResetCodeInvalid,
    EmailRateLimited,

    // User/profile (E2xxx)
    UserNotFound,
    PhotoNotFound,
    PhotoUploadFailed,

    // Matching (E3xxx)
    AlreadyReacted,
    CannotReactToSelf,
    FiltersNotFound,
    FiltersAlreadyExist,
    NoCandidates,

    // Chat (E4xxx)
    DialogueNotFound,
    NotDialogueParticipant,
    MessageNotFound,
    NotMessageAuthor,

    // Events (E5xxx)
    EventNotFound,
    EventFull,
    AlreadyJoinedEvent,

    // Channels (E6xxx)
    ChannelNotFound,
    AlreadyJoinedChannel,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::RateLimited => "E0006",
            Self::BadRequest => "E0007",
            Self::PayloadTooLarge => "E0008",
            Self::Conflict => "E0009",

            // Auth
            Self::InvalidCredentials => "E1001",
            Self::EmailAlreadyExists => "E1002",
            Self::TokenExpired => "E1003",
            Self::TokenInvalid => "E1004",
            Self::PasswordTooWeak => "E1005",
            Self::VerificationCodeExpired => "E1006",
            Self::VerificationCodeInvalid => "E1007",
            Self::ResetCodeExpired => "E1008",
            Self::ResetCodeInvalid => "E1009",
            Self::EmailRateLimited => "E1010",

            // User/profile
            Self::UserNotFound => "E2001",
            Self::PhotoNotFound => "E2002",
            Self::PhotoUploadFailed => "E2003",

            // Matching
            Self::AlreadyReacted => "E3001",
            Self::CannotReactToSelf => "E3002",
            Self::FiltersNotFound => "E3003",
            Self::FiltersAlreadyExist => "E3004",
            Self::NoCandidates => "E3005",

            // Chat
            Self::DialogueNotFound => "E4001",
            Self::NotDialogueParticipant => "E4002",
            Self::MessageNotFound => "E4003",
            Self::NotMessageAuthor => "E4004",

            // Events
            Self::EventNotFound => "E5001",
            Self::EventFull => "E5002",
            Self::AlreadyJoinedEvent => "E5003",

            // Channels
            Self::ChannelNotFound => "E6001",
            Self::AlreadyJoinedChannel => "E6002",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::PasswordTooWeak
            | Self::PhotoUploadFailed => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound | Self::UserNotFound | Self::PhotoNotFound
            | Self::FiltersNotFound | Self::NoCandidates | Self::DialogueNotFound
            | Self::MessageNotFound | Self::EventNotFound
            | Self::ChannelNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidCredentials | Self::TokenExpired
            | Self::TokenInvalid | Self::VerificationCodeExpired
            | Self::VerificationCodeInvalid | Self::ResetCodeExpired
            | Self::ResetCodeInvalid => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::CannotReactToSelf | Self::NotDialogueParticipant
            | Self::NotMessageAuthor => StatusCode::FORBIDDEN,
            Self::RateLimited | Self::EmailRateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Conflict | Self::EmailAlreadyExists | Self::AlreadyReacted
            | Self::FiltersAlreadyExist | Self::EventFull | Self::AlreadyJoinedEvent
            | Self::AlreadyJoinedChannel => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// True when the underlying cause is a unique-constraint violation.
    ///
    /// The reaction and dialogue stores treat their unique indexes as the
    /// authority on duplicates, so handlers translate this into a domain
    /// conflict rather than a 500.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            AppError::Database(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    diesel::result::Error::DatabaseError(
                        diesel::result::DatabaseErrorKind::UniqueViolation,
                        _,
                    ) => (
                        StatusCode::CONFLICT,
                        ApiErrorResponse::new("E0009", "resource already exists"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorCode::AlreadyReacted, StatusCode::CONFLICT)]
    #[case(ErrorCode::CannotReactToSelf, StatusCode::FORBIDDEN)]
    #[case(ErrorCode::NoCandidates, StatusCode::NOT_FOUND)]
    #[case(ErrorCode::InvalidCredentials, StatusCode::UNAUTHORIZED)]
    #[case(ErrorCode::EmailRateLimited, StatusCode::TOO_MANY_REQUESTS)]
    #[case(ErrorCode::EventFull, StatusCode::CONFLICT)]
    fn error_codes_map_to_expected_statuses(#[case] code: ErrorCode, #[case] status: StatusCode) {
        assert_eq!(code.status_code(), status);
    }

    #[test]
    fn internal_errors_do_not_leak_the_cause() {
        let err = AppError::Internal(anyhow::anyhow!("connection refused to 10.0.0.3"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unique_violation_is_detected() {
        let err = AppError::Database(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_string()),
        ));
        assert!(err.is_unique_violation());
        assert!(!AppError::Validation("x".into()).is_unique_violation());
    }
}
