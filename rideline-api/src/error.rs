/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which converts to the
/// appropriate status code.
///
/// # Status mapping
///
/// | Error | Status |
/// |---|---|
/// | `BadRequest`, `ValidationError` | 400 |
/// | `Unauthorized` | 401 |
/// | `NotFound` | 404 |
/// | `Conflict` | 409 |
/// | `InternalError` | 500 |
/// | `ServiceUnavailable` | 503 |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rideline_shared::auth::password::PasswordError;
use rideline_shared::db::sequence::SequenceError;
use rideline_shared::registrar::RegistrarError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401) - bad credentials
    Unauthorized(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - duplicate phone number, with the owning record when
    /// known
    Conflict {
        message: String,
        existing: Option<ConflictingUser>,
    },

    /// Field validation errors (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503) - backing store failure
    ServiceUnavailable(String),
}

/// The record already holding a unique value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictingUser {
    pub id: i64,
    pub name: String,
    pub phone: String,
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "conflict")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,

    /// The conflicting record on duplicate errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing: Option<ConflictingUser>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details, existing) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None, None),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", msg, None, None)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None, None),
            ApiError::Conflict { message, existing } => {
                (StatusCode::CONFLICT, "conflict", message, None, existing)
            }
            ApiError::ValidationError(errors) => (
                // The API reports all invalid input as 400
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
                None,
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
            existing,
        });

        (status, body).into_response()
    }
}

/// Convert registrar errors to API errors
impl From<RegistrarError> for ApiError {
    fn from(err: RegistrarError) -> Self {
        match err {
            RegistrarError::InvalidArgument(msg) => ApiError::BadRequest(msg),
            RegistrarError::PhoneTaken { id, name, phone } => ApiError::Conflict {
                message: format!("Phone number {} is already registered", phone),
                existing: Some(ConflictingUser { id, name, phone }),
            },
            RegistrarError::UserNotFound(id) => {
                ApiError::NotFound(format!("User {} not found", id))
            }
            RegistrarError::Password(err) => err.into(),
            RegistrarError::Sequence(err) => err.into(),
            RegistrarError::Database(err) => err.into(),
        }
    }
}

/// Convert sequence allocator errors to API errors
impl From<SequenceError> for ApiError {
    fn from(err: SequenceError) -> Self {
        match err {
            SequenceError::EmptyName => {
                ApiError::InternalError("Empty sequence name".to_string())
            }
            SequenceError::StoreUnavailable { .. } => {
                ApiError::ServiceUnavailable("Id allocation is temporarily unavailable".to_string())
            }
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("phone") {
                        return ApiError::Conflict {
                            message: "Phone number is already registered".to_string(),
                            existing: None,
                        };
                    }
                    return ApiError::Conflict {
                        message: format!("Constraint violation: {}", constraint),
                        existing: None,
                    };
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert validator failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_conflict_carries_existing_record() {
        let err: ApiError = RegistrarError::PhoneTaken {
            id: 3,
            name: "Ana".to_string(),
            phone: "0800000001".to_string(),
        }
        .into();

        match err {
            ApiError::Conflict { existing, .. } => {
                let existing = existing.expect("existing record should be attached");
                assert_eq!(existing.id, 3);
                assert_eq!(existing.phone, "0800000001");
            }
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_store_unavailable_maps_to_503() {
        let err: ApiError = SequenceError::StoreUnavailable {
            attempts: 4,
            source: sqlx::Error::PoolClosed,
        }
        .into();
        assert!(matches!(err, ApiError::ServiceUnavailable(_)));
    }
}
